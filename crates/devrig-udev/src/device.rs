//! Device records and per-event snapshots.
//!
//! [`DeviceData`] is the flat record of one kernel device node: identity,
//! classification, udev properties, captured sysfs attributes, and tags.
//! [`DeviceSnapshot`] wraps one record together with its ancestor chain and
//! the hotplug action that produced it; it is the unit the monitor delivers
//! and the matching engine consumes.
//!
//! Snapshots are immutable once built. Resources may retain the snapshot
//! they bound to, but they never mutate it, and a retained snapshot reflects
//! the device as it looked at event time - live state (including children
//! that appear later) must be queried through the
//! [`DeviceRegistry`](crate::DeviceRegistry) or [`DeviceData::read_attr`].

use chrono::{DateTime, Utc};
use devrig_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Deref;
use std::path::PathBuf;
use std::sync::Arc;

use crate::HotplugAction;

/// Flat identity and property record of one kernel device node.
///
/// Instances are normally produced by the monitor. Tests and the mock
/// monitor assemble them with the `with_*` builder methods:
///
/// ```
/// use devrig_udev::DeviceData;
///
/// let tty = DeviceData::new("/sys/devices/pci0000:00/usb1/1-4/1-4:1.0/ttyUSB3")
///     .with_subsystem("tty")
///     .with_device_node("/dev/ttyUSB3")
///     .with_property("ID_SERIAL_SHORT", "A5002NAq");
///
/// assert_eq!(tty.sys_name, "ttyUSB3");
/// assert_eq!(tty.property("ID_SERIAL_SHORT"), Some("A5002NAq"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceData {
    /// Absolute sysfs path. This is the structural identity of the node;
    /// the binding engine compares devices by this path alone.
    pub sys_path: PathBuf,

    /// Kernel name of the node (the last path component).
    pub sys_name: String,

    /// Subsystem the node belongs to, e.g. `tty`, `block`, `usb`.
    pub subsystem: Option<String>,

    /// Device type within the subsystem, e.g. `disk`, `usb_device`.
    pub device_type: Option<String>,

    /// Kernel driver currently bound to the node, if any.
    pub driver: Option<String>,

    /// Path of the `/dev` node exposed by the device, if any.
    pub device_node: Option<String>,

    /// udev property map.
    pub properties: BTreeMap<String, String>,

    /// sysfs attribute values captured when the event was generated.
    ///
    /// These are event-time copies. For values that must be current at the
    /// moment of use (e.g. a network interface's `operstate`), go through
    /// [`read_attr`](Self::read_attr) instead.
    pub attributes: BTreeMap<String, String>,

    /// udev tags attached to the node.
    pub tags: BTreeSet<String>,
}

impl DeviceData {
    /// Create an empty record for the given sysfs path.
    ///
    /// The kernel name is derived from the last path component.
    pub fn new(sys_path: impl Into<PathBuf>) -> Self {
        let sys_path = sys_path.into();
        let sys_name = sys_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            sys_path,
            sys_name,
            subsystem: None,
            device_type: None,
            driver: None,
            device_node: None,
            properties: BTreeMap::new(),
            attributes: BTreeMap::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Set the subsystem.
    pub fn with_subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    /// Set the device type.
    pub fn with_device_type(mut self, device_type: impl Into<String>) -> Self {
        self.device_type = Some(device_type.into());
        self
    }

    /// Set the bound kernel driver.
    pub fn with_driver(mut self, driver: impl Into<String>) -> Self {
        self.driver = Some(driver.into());
        self
    }

    /// Set the `/dev` node path.
    pub fn with_device_node(mut self, device_node: impl Into<String>) -> Self {
        self.device_node = Some(device_node.into());
        self
    }

    /// Add a udev property.
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Add a captured sysfs attribute value.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Add a udev tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Look up a udev property.
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// Look up an event-time sysfs attribute value.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Look up an intrinsic classification field by its rule key.
    ///
    /// Intrinsic keys are the lowercase field names `subsystem`,
    /// `device_type`, `driver`, and `sys_name`.
    pub fn intrinsic(&self, key: &str) -> Option<&str> {
        match key {
            "subsystem" => self.subsystem.as_deref(),
            "device_type" => self.device_type.as_deref(),
            "driver" => self.driver.as_deref(),
            "sys_name" => Some(&self.sys_name),
            _ => None,
        }
    }

    /// Uncached read of a sysfs attribute under this node.
    ///
    /// Reads `{sys_path}/{name}` directly from the filesystem, stripping
    /// trailing newlines. The read can race with device removal:
    /// when the device is already gone the result is
    /// [`Error::AttributeRead`], which callers must treat as a failure of
    /// this one accessor, not of the event pipeline.
    pub fn read_attr(&self, name: &str) -> Result<String> {
        let path = self.sys_path.join(name);
        let raw = std::fs::read_to_string(&path)
            .map_err(|source| Error::attribute_read(&path, source))?;
        Ok(raw.trim_end_matches('\n').to_string())
    }
}

/// Immutable-per-event view of one kernel device node.
///
/// A snapshot couples a [`DeviceData`] record with the hotplug action that
/// produced it and the node's ancestor chain at event time. It dereferences
/// to its device record, so field access reads naturally:
///
/// ```
/// use devrig_udev::{DeviceData, DeviceSnapshot, HotplugAction};
///
/// let snapshot = DeviceSnapshot::new(
///     HotplugAction::Add,
///     DeviceData::new("/sys/devices/usb1/1-4").with_subsystem("usb"),
/// );
/// assert_eq!(snapshot.subsystem.as_deref(), Some("usb"));
/// assert!(snapshot.action().is_arrival());
/// ```
#[derive(Debug, Clone)]
pub struct DeviceSnapshot {
    action: HotplugAction,
    received_at: DateTime<Utc>,
    device: Arc<DeviceData>,
    /// Ancestor chain, nearest first: index 0 is the direct parent.
    ancestors: Vec<Arc<DeviceData>>,
}

impl DeviceSnapshot {
    /// Create a snapshot with no recorded ancestors.
    pub fn new(action: HotplugAction, device: DeviceData) -> Self {
        Self::builder(action, device).build()
    }

    /// Start building a snapshot with an ancestor chain.
    pub fn builder(action: HotplugAction, device: DeviceData) -> DeviceSnapshotBuilder {
        DeviceSnapshotBuilder {
            action,
            device,
            ancestors: Vec::new(),
        }
    }

    /// The hotplug action this snapshot was delivered for.
    pub fn action(&self) -> HotplugAction {
        self.action
    }

    /// When the snapshot was assembled by the monitor.
    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    /// The device record itself, as a shareable handle.
    pub fn data(&self) -> &Arc<DeviceData> {
        &self.device
    }

    /// Ancestor chain, nearest first. Index 0 is the direct parent; the
    /// last entry is the topology root.
    pub fn ancestors(&self) -> &[Arc<DeviceData>] {
        &self.ancestors
    }

    /// Direct parent of the device, if the chain was recorded.
    pub fn parent(&self) -> Option<&Arc<DeviceData>> {
        self.ancestors.first()
    }

    /// Walk the ancestor chain for the first device with the given
    /// subsystem, optionally also constrained by device type.
    ///
    /// Only ancestors are considered; use the snapshot's own fields to
    /// test the device itself.
    pub fn find_parent(
        &self,
        subsystem: &str,
        device_type: Option<&str>,
    ) -> Option<&Arc<DeviceData>> {
        self.ancestors.iter().find(|ancestor| {
            ancestor.subsystem.as_deref() == Some(subsystem)
                && device_type.is_none_or(|wanted| ancestor.device_type.as_deref() == Some(wanted))
        })
    }
}

impl Deref for DeviceSnapshot {
    type Target = DeviceData;

    fn deref(&self) -> &Self::Target {
        &self.device
    }
}

/// Builder for [`DeviceSnapshot`], used by monitors and tests to assemble
/// a device with its topology context.
#[derive(Debug)]
pub struct DeviceSnapshotBuilder {
    action: HotplugAction,
    device: DeviceData,
    ancestors: Vec<Arc<DeviceData>>,
}

impl DeviceSnapshotBuilder {
    /// Append the next ancestor, nearest first: the first call records the
    /// direct parent, the second the grandparent, and so on.
    pub fn ancestor(mut self, ancestor: DeviceData) -> Self {
        self.ancestors.push(Arc::new(ancestor));
        self
    }

    /// Finish the snapshot, stamping the delivery time.
    pub fn build(self) -> DeviceSnapshot {
        DeviceSnapshot {
            action: self.action,
            received_at: Utc::now(),
            device: Arc::new(self.device),
            ancestors: self.ancestors,
        }
    }
}
