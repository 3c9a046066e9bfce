//! USB resources and the hotplug binding state machine.
//!
//! A [`UsbResource`] is a logical handle declared by the rig configuration.
//! It is either unbound or bound to exactly one kernel device node, and it
//! moves between those states purely in response to the hotplug events fed
//! through [`try_match`](UsbResource::try_match):
//!
//! - **Unbound**: every incoming event is tested against the resource's
//!   match rules and kind filter. Arrivals (and `change`/`move`, treated as
//!   an implicit first sighting) bind; departures are ignored.
//! - **Bound**: events are recognized by sysfs-path identity alone. The
//!   rules are *not* re-evaluated - a property legitimately
//!   changing between the bind and a later refresh must not make the engine
//!   conclude the device no longer matches. `change`/`move` refresh the
//!   retained snapshot, `unbind`/`remove` return the resource to unbound.
//!
//! A duplicate arrival for a resource that is already available is
//! suspicious (a stale event or two overlapping rule sets) but must not
//! take the pipeline down: it is logged as a warning and the binding is
//! overwritten.
//!
//! Binding is exclusive per resource and independent across resources: two
//! resources whose rules both match the same physical device each track
//! their own binding, with no arbitration between them.

use std::sync::Arc;
use std::time::Duration;

use devrig_core::constants::DEFAULT_RESOURCE_TIMEOUT;
use devrig_core::{Error, Result};
use devrig_udev::{DeviceData, DeviceRegistry, DeviceSnapshot, HotplugAction};
use tracing::{debug, warn};

use crate::kinds::ResourceKind;
use crate::rules::MatchRules;
use crate::suggest::{self, SuggestionSink};

/// The USB anchor for a snapshot: the device itself when it is a
/// `usb`/`usb_device` node, otherwise the nearest such ancestor.
pub(crate) fn usb_anchor(snapshot: &DeviceSnapshot) -> Option<&Arc<DeviceData>> {
    if snapshot.subsystem.as_deref() == Some("usb")
        && snapshot.device_type.as_deref() == Some("usb_device")
    {
        Some(snapshot.data())
    } else {
        snapshot.find_parent("usb", Some("usb_device"))
    }
}

/// A logical hardware resource bound to at most one device node.
#[derive(Debug)]
pub struct UsbResource {
    rules: MatchRules,
    kind: ResourceKind,
    device: Option<DeviceSnapshot>,
    timeout: Duration,
    suggest: Option<SuggestionSink>,
}

impl UsbResource {
    /// Create a resource of the given kind with only the kind's default
    /// match rules.
    pub fn new(kind: ResourceKind) -> Self {
        Self::with_rules(kind, MatchRules::default())
    }

    /// Create a resource with user-declared rules.
    ///
    /// The kind overlays its type-specific rules (replacing same-key
    /// declarations) and the generic `SUBSYSTEM=usb` default fills in last
    /// if nothing claimed the key. The resulting rule set is immutable for
    /// the life of the resource.
    pub fn with_rules(kind: ResourceKind, rules: MatchRules) -> Self {
        let rules = kind.apply_default_rules(rules.into_builder()).build();
        Self {
            rules,
            kind,
            device: None,
            timeout: DEFAULT_RESOURCE_TIMEOUT,
            suggest: None,
        }
    }

    /// Override the liveness budget dependent operations get for waiting
    /// on `avail` after a bind.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Put the resource into discovery mode.
    ///
    /// A resource in discovery mode never binds: structural matches on
    /// arrivals produce a [`Suggestion`](crate::suggest::Suggestion) into
    /// the sink instead. Having the sink *is* the mode - there is no way
    /// to enable discovery without somewhere for the suggestions to go.
    pub fn with_suggestions(mut self, sink: SuggestionSink) -> Self {
        self.suggest = Some(sink);
        self
    }

    /// The effective match rules, defaults included.
    pub fn rules(&self) -> &MatchRules {
        &self.rules
    }

    /// The resource's kind and its derived state.
    pub fn kind(&self) -> &ResourceKind {
        &self.kind
    }

    /// The currently bound device snapshot, if any.
    pub fn device(&self) -> Option<&DeviceSnapshot> {
        self.device.as_ref()
    }

    /// Whether a device is currently bound.
    pub fn is_bound(&self) -> bool {
        self.device.is_some()
    }

    /// Whether the resource is operationally usable.
    ///
    /// For most kinds this means "bound"; kinds whose bound node is only a
    /// topology anchor override it (a mass-storage disk needs its device
    /// node, a composite needs all auxiliary channels).
    pub fn avail(&self) -> bool {
        self.kind.avail(self.device.as_ref())
    }

    /// The liveness budget for dependent operations.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// The resolved operational handle, e.g. `/dev/ttyUSB3`. `None` while
    /// the resource is unbound or unresolved.
    pub fn path(&self) -> Option<String> {
        self.kind.path(self.device.as_ref())
    }

    /// Feed one hotplug event through the binding state machine.
    ///
    /// Returns `Ok(true)` when the event concerned this resource and was
    /// applied (or produced a suggestion-free state change), `Ok(false)`
    /// when it was ignored. The only error source is a closed suggestion
    /// sink, which the dispatch loop treats as a resource-local failure.
    pub fn try_match(&mut self, snapshot: &DeviceSnapshot) -> Result<bool> {
        match &self.device {
            None => {
                if !self.rules.matches(snapshot) || !self.kind.filter_match(snapshot) {
                    return Ok(false);
                }
            }
            Some(bound) => {
                // Identity fast path: once bound, an event concerns this
                // resource iff it names the same kernel node. The rules are
                // not re-run; a property change must not un-match.
                if bound.sys_path != snapshot.sys_path {
                    return Ok(false);
                }
            }
        }

        debug!(
            kind = self.kind.name(),
            sys_path = %snapshot.sys_path.display(),
            action = %snapshot.action(),
            "device matched"
        );

        if let Some(sink) = &self.suggest {
            if snapshot.action().is_arrival() {
                let suggestion = suggest::suggest_match(&self.rules, snapshot);
                sink.send(suggestion)
                    .map_err(|_| Error::channel_closed("suggestion sink"))?;
            }
            // Discovery mode never binds.
            return Ok(false);
        }

        match snapshot.action() {
            HotplugAction::Add | HotplugAction::Initial => {
                if self.avail() {
                    warn!(
                        kind = self.kind.name(),
                        sys_path = %snapshot.sys_path.display(),
                        "device already available, rebinding"
                    );
                }
                self.device = Some(snapshot.clone());
            }
            HotplugAction::Change | HotplugAction::Move => {
                self.device = Some(snapshot.clone());
            }
            HotplugAction::Unbind | HotplugAction::Remove => {
                self.device = None;
            }
        }

        self.kind.update(self.device.as_ref());
        Ok(true)
    }

    /// Poll-time second phase for composite kinds: while bound but not yet
    /// available, scan the present-device registry for the auxiliary
    /// channels. A no-op for everything else.
    pub fn resolve(&mut self, registry: &DeviceRegistry) {
        if let Some(device) = &self.device
            && !self.kind.avail(Some(device))
        {
            self.kind.resolve(device, registry);
        }
    }

    /// The USB anchor of the bound device: the device itself if it is a
    /// `usb`/`usb_device` node, otherwise its nearest such ancestor.
    pub fn usb_device(&self) -> Option<&Arc<DeviceData>> {
        self.device.as_ref().and_then(usb_anchor)
    }

    /// USB bus number of the anchor device.
    pub fn bus_num(&self) -> Option<u32> {
        self.usb_device()?.property("BUSNUM")?.parse().ok()
    }

    /// Device number of the anchor on its bus.
    pub fn dev_num(&self) -> Option<u32> {
        self.usb_device()?.property("DEVNUM")?.parse().ok()
    }

    /// Vendor ID of the anchor device.
    pub fn vendor_id(&self) -> Option<u16> {
        u16::from_str_radix(self.usb_device()?.property("ID_VENDOR_ID")?, 16).ok()
    }

    /// Product ID of the anchor device.
    pub fn model_id(&self) -> Option<u16> {
        u16::from_str_radix(self.usb_device()?.property("ID_MODEL_ID")?, 16).ok()
    }

    /// Uncached sysfs attribute read on the bound device.
    ///
    /// `Ok(None)` while unbound. The read can race with removal; see
    /// [`DeviceData::read_attr`].
    pub fn read_attr(&self, name: &str) -> Result<Option<String>> {
        match &self.device {
            Some(device) => device.read_attr(name).map(Some),
            None => Ok(None),
        }
    }

    /// Live link state of a bound network interface (`operstate`).
    pub fn if_state(&self) -> Result<Option<String>> {
        self.read_attr("operstate")
    }
}
