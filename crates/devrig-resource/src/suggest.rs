//! Discovery-mode suggestion engine.
//!
//! When an operator is wiring up a new rig they usually know *that* a device
//! is the one they care about (they just plugged it in) but not which stable
//! properties to pin it with. A resource in discovery mode reports, for each
//! structurally matching arrival, a [`Suggestion`]: human-facing
//! identification metadata plus candidate refinement rules - instead of
//! binding. Discovery mode never mutates binding state.
//!
//! Candidate rules prefer the stable path-identity property (`ID_PATH`,
//! which encodes the physical port) and fall back to the serial number
//! (`ID_SERIAL_SHORT`). When the resource's declared rules already pin a
//! USB ancestor scope and the property lives on the USB anchor rather than
//! the matched node, the candidate is emitted ancestor-scoped so it slots
//! into the same rule set.

use devrig_udev::DeviceSnapshot;
use tokio::sync::mpsc;

use crate::resource::usb_anchor;
use crate::rules::{MatchRule, MatchRules, RuleScope};

/// Identification metadata and candidate rules for one sighted device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suggestion {
    /// Human-facing metadata rows, in display order. Rows are present only
    /// when the underlying value is.
    pub meta: Vec<(String, String)>,

    /// Candidate refinement rules, most stable first.
    pub candidates: Vec<MatchRule>,
}

/// Sink receiving suggestions from resources in discovery mode.
pub type SuggestionSink = mpsc::UnboundedSender<Suggestion>;

/// Create a suggestion channel: the sender goes to
/// [`UsbResource::with_suggestions`](crate::resource::UsbResource::with_suggestions),
/// the receiver to whatever presents suggestions to the operator.
pub fn suggestion_channel() -> (SuggestionSink, mpsc::UnboundedReceiver<Suggestion>) {
    mpsc::unbounded_channel()
}

/// Metadata rows sourced from udev properties, in display order.
const META_PROPERTIES: [(&str, &str); 5] = [
    ("vendor", "ID_VENDOR"),
    ("vendor (DB)", "ID_VENDOR_FROM_DATABASE"),
    ("model", "ID_MODEL"),
    ("model (DB)", "ID_MODEL_FROM_DATABASE"),
    ("revision", "ID_REVISION"),
];

/// Properties considered stable enough to pin a device with, most
/// preferred first.
const CANDIDATE_PROPERTIES: [&str; 2] = ["ID_PATH", "ID_SERIAL_SHORT"];

/// Compute the suggestion for a structurally matching device.
///
/// Pure with respect to binding state: the snapshot is only read, and the
/// resource's rule set is consulted solely to decide whether ancestor-scoped
/// candidates make sense.
pub(crate) fn suggest_match(rules: &MatchRules, snapshot: &DeviceSnapshot) -> Suggestion {
    let mut meta = Vec::new();

    if let Some(node) = snapshot.device_node.as_deref() {
        meta.push(("device node".to_string(), node.to_string()));
    }
    if !snapshot.tags.is_empty() {
        let tags: Vec<&str> = snapshot.tags.iter().map(String::as_str).collect();
        meta.push(("udev tags".to_string(), tags.join(", ")));
    }
    for (label, key) in META_PROPERTIES {
        if let Some(value) = snapshot.property(key) {
            meta.push((label.to_string(), value.to_string()));
        }
    }

    let usb_scoped = rules.get(RuleScope::Ancestor, "SUBSYSTEM") == Some("usb");
    let anchor = usb_anchor(snapshot);

    let mut candidates = Vec::new();
    for key in CANDIDATE_PROPERTIES {
        if let Some(value) = snapshot.property(key) {
            candidates.push(MatchRule::device(key, value));
        } else if usb_scoped
            && let Some(value) = anchor.and_then(|device| device.property(key))
        {
            candidates.push(MatchRule::ancestor(key, value));
        }
    }

    Suggestion { meta, candidates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devrig_udev::{DeviceData, HotplugAction};

    fn rules_with_usb_scope() -> MatchRules {
        MatchRules::builder()
            .device("SUBSYSTEM", "tty")
            .ancestor("SUBSYSTEM", "usb")
            .build()
    }

    #[test]
    fn meta_rows_appear_only_when_present() {
        let snapshot = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4")
                .with_device_node("/dev/ttyUSB0")
                .with_property("ID_VENDOR", "FTDI")
                .with_property("ID_MODEL_FROM_DATABASE", "FT232 Serial (UART) IC")
                .with_tag("systemd"),
        );

        let suggestion = suggest_match(&MatchRules::default(), &snapshot);
        assert_eq!(
            suggestion.meta,
            vec![
                ("device node".to_string(), "/dev/ttyUSB0".to_string()),
                ("udev tags".to_string(), "systemd".to_string()),
                ("vendor".to_string(), "FTDI".to_string()),
                (
                    "model (DB)".to_string(),
                    "FT232 Serial (UART) IC".to_string()
                ),
            ]
        );
    }

    #[test]
    fn candidates_prefer_path_identity_over_serial() {
        let snapshot = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4")
                .with_property("ID_PATH", "pci-0000:00:14.0-usb-0:4")
                .with_property("ID_SERIAL_SHORT", "A5002NAq"),
        );

        let suggestion = suggest_match(&MatchRules::default(), &snapshot);
        assert_eq!(
            suggestion.candidates,
            vec![
                MatchRule::device("ID_PATH", "pci-0000:00:14.0-usb-0:4"),
                MatchRule::device("ID_SERIAL_SHORT", "A5002NAq"),
            ]
        );
    }

    #[test]
    fn ancestor_scoped_candidates_when_rules_pin_usb_scope() {
        // The tty node itself carries neither stable property; its USB
        // anchor carries both.
        let snapshot = DeviceSnapshot::builder(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0/ttyUSB0").with_subsystem("tty"),
        )
        .ancestor(
            DeviceData::new("/sys/devices/usb1/1-4")
                .with_subsystem("usb")
                .with_device_type("usb_device")
                .with_property("ID_PATH", "pci-0000:00:14.0-usb-0:4")
                .with_property("ID_SERIAL_SHORT", "A5002NAq"),
        )
        .build();

        let suggestion = suggest_match(&rules_with_usb_scope(), &snapshot);
        assert_eq!(
            suggestion.candidates,
            vec![
                MatchRule::ancestor("ID_PATH", "pci-0000:00:14.0-usb-0:4"),
                MatchRule::ancestor("ID_SERIAL_SHORT", "A5002NAq"),
            ]
        );
    }

    #[test]
    fn no_ancestor_fallback_without_usb_scope() {
        let snapshot = DeviceSnapshot::builder(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0/ttyUSB0").with_subsystem("tty"),
        )
        .ancestor(
            DeviceData::new("/sys/devices/usb1/1-4")
                .with_subsystem("usb")
                .with_device_type("usb_device")
                .with_property("ID_PATH", "pci-0000:00:14.0-usb-0:4"),
        )
        .build();

        let suggestion = suggest_match(&MatchRules::default(), &snapshot);
        assert!(suggestion.candidates.is_empty());
    }
}
