//! The closed set of USB resource families.
//!
//! Each family is a small struct carrying its derived state (a tty path, an
//! interface name, auxiliary channel paths) and is dispatched through the
//! [`ResourceKind`] enum rather than a trait object, mirroring the
//! enum-dispatch pattern used elsewhere in the workspace. The capability
//! surface a family can implement:
//!
//! - **default rules** - type-specific match rules overlaid on whatever the
//!   user declared (`SUBSYSTEM=tty` for serial ports, vendor/model pins for
//!   SD muxes); the generic `SUBSYSTEM=usb` default fills in last, only if
//!   nothing claimed the key.
//! - **filter hook** - refinement the declarative rules cannot express: a
//!   vid/pid allow-list, a capability-string parse, a channel-index suffix.
//!   Read-only, no mutation.
//! - **update hook** - refreshes derived attributes from the bound device on
//!   every bind/refresh/unbind transition.
//! - **avail override** - families whose bound node is only a topology
//!   anchor redefine availability (mass storage needs a device node,
//!   composites need their auxiliary paths).
//! - **resolve** - composite families fill auxiliary paths from the live
//!   present-device registry on each poll cycle.
//!
//! Only the families needed to exercise each mechanism live here; the rest
//! of the production preset catalog is vendor/product ID configuration over
//! these same hooks.

mod composite;
mod media;
mod network;
mod power;
mod probe;
mod serial;
mod storage;

pub use composite::{SdMux, SdWire};
pub use media::{AudioInput, Video};
pub use network::NetworkInterface;
pub use power::{HidRelay, PowerPort};
pub use probe::Debugger;
pub use serial::SerialPort;
pub use storage::MassStorage;

use devrig_udev::{DeviceRegistry, DeviceSnapshot};

use crate::resource::usb_anchor;
use crate::rules::{MatchRule, MatchRulesBuilder};

/// Tagged set of resource families, dispatched over the shared binding
/// core.
#[derive(Debug)]
#[non_exhaustive]
pub enum ResourceKind {
    /// USB serial adapter exposing a tty node.
    SerialPort(SerialPort),

    /// USB mass-storage disk.
    MassStorage(MassStorage),

    /// USB network interface.
    NetworkInterface(NetworkInterface),

    /// SD mux: anchor node plus control and disk channels.
    SdMux(SdMux),

    /// SD wire: anchor node plus a disk channel under the parent hub.
    SdWire(SdWire),

    /// Power-controllable port on a USB hub.
    PowerPort(PowerPort),

    /// HID-addressed relay box.
    HidRelay(HidRelay),

    /// Debug probe (JTAG/SWD adapter).
    Debugger(Debugger),

    /// USB video capture device.
    Video(Video),

    /// USB audio capture channel.
    AudioInput(AudioInput),
}

impl ResourceKind {
    /// Short family name used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::SerialPort(_) => "serial-port",
            Self::MassStorage(_) => "mass-storage",
            Self::NetworkInterface(_) => "network-interface",
            Self::SdMux(_) => "sd-mux",
            Self::SdWire(_) => "sd-wire",
            Self::PowerPort(_) => "power-port",
            Self::HidRelay(_) => "hid-relay",
            Self::Debugger(_) => "debugger",
            Self::Video(_) => "video",
            Self::AudioInput(_) => "audio-input",
        }
    }

    /// Overlay the family's rules on the user-declared set, then fill the
    /// generic USB subsystem default if the key is still unclaimed.
    pub(crate) fn apply_default_rules(&self, builder: MatchRulesBuilder) -> MatchRulesBuilder {
        let builder = match self {
            Self::SerialPort(_) => builder
                .set(MatchRule::device("SUBSYSTEM", "tty"))
                .set(MatchRule::ancestor("SUBSYSTEM", "usb")),
            Self::MassStorage(_) => builder
                .set(MatchRule::device("SUBSYSTEM", "block"))
                .set(MatchRule::device("DEVTYPE", "disk"))
                .set(MatchRule::ancestor("SUBSYSTEM", "usb")),
            Self::SdMux(_) => builder
                .set(MatchRule::device("ID_VENDOR_ID", "0424"))
                .set(MatchRule::device("ID_MODEL_ID", "4041")),
            Self::SdWire(_) => builder
                .set(MatchRule::device("ID_VENDOR_ID", "04e8"))
                .set(MatchRule::device("ID_MODEL_ID", "6001"))
                .set(MatchRule::ancestor("ID_VENDOR_ID", "0424"))
                .set(MatchRule::ancestor("ID_MODEL_ID", "2640")),
            Self::PowerPort(_) => builder
                .set(MatchRule::device("DEVTYPE", "usb_interface"))
                .set(MatchRule::device("DRIVER", "hub")),
            Self::HidRelay(_) => builder
                .set(MatchRule::device("ID_VENDOR_ID", "16c0"))
                .set(MatchRule::device("ID_MODEL_ID", "05df")),
            Self::Video(_) => builder
                .set(MatchRule::device("SUBSYSTEM", "video4linux"))
                .set(MatchRule::ancestor("SUBSYSTEM", "usb")),
            Self::AudioInput(_) => builder
                .set(MatchRule::device("SUBSYSTEM", "sound"))
                .set(MatchRule::ancestor("SUBSYSTEM", "usb")),
            Self::NetworkInterface(_) | Self::Debugger(_) => builder,
        };
        builder.default_device("SUBSYSTEM", "usb")
    }

    /// Family-specific refinement of a structural match.
    pub(crate) fn filter_match(&self, snapshot: &DeviceSnapshot) -> bool {
        match self {
            Self::Debugger(kind) => kind.filter_match(snapshot),
            Self::Video(kind) => kind.filter_match(snapshot),
            Self::AudioInput(kind) => kind.filter_match(snapshot),
            _ => true,
        }
    }

    /// Refresh derived attributes after a binding transition. `None` means
    /// the resource just unbound and derived state must reset.
    pub(crate) fn update(&mut self, device: Option<&DeviceSnapshot>) {
        match self {
            Self::SerialPort(kind) => kind.update(device),
            Self::NetworkInterface(kind) => kind.update(device),
            Self::SdMux(kind) => kind.update(device),
            Self::SdWire(kind) => kind.update(device),
            _ => {}
        }
    }

    /// Whether the resource is operationally usable given the current
    /// binding. The default is simply "a device is bound".
    pub(crate) fn avail(&self, device: Option<&DeviceSnapshot>) -> bool {
        match self {
            Self::MassStorage(_) => device.is_some_and(|d| d.device_node.is_some()),
            Self::SdMux(kind) => kind.is_resolved(),
            Self::SdWire(kind) => kind.is_resolved(),
            _ => device.is_some(),
        }
    }

    /// The resolved operational handle for this family.
    ///
    /// Node-backed families hand out their `/dev` node, composites their
    /// disk channel; for the rest the handle is the USB anchor's kernel
    /// name (its bus position, stable until re-plug).
    pub(crate) fn path(&self, device: Option<&DeviceSnapshot>) -> Option<String> {
        match self {
            Self::SerialPort(kind) => kind.port().map(str::to_string),
            Self::MassStorage(_) | Self::Video(_) | Self::AudioInput(_) => {
                device.and_then(|d| d.device_node.clone())
            }
            Self::SdMux(kind) => kind.disk_path().map(str::to_string),
            Self::SdWire(kind) => kind.disk_path().map(str::to_string),
            _ => device
                .and_then(usb_anchor)
                .map(|anchor| anchor.sys_name.clone()),
        }
    }

    /// Poll-time topology scan for composite families; a no-op for the
    /// rest.
    pub(crate) fn resolve(&mut self, device: &DeviceSnapshot, registry: &DeviceRegistry) {
        match self {
            Self::SdMux(kind) => kind.resolve(device, registry),
            Self::SdWire(kind) => kind.resolve(device, registry),
            _ => {}
        }
    }
}
