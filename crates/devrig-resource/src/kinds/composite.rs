//! Composite SD-switching devices.
//!
//! SD muxes and SD wires electrically switch a microSD card between the
//! test host and the target. Their interesting endpoints - the control
//! channel and the card's block device - are *not* the node the match rules
//! identify. That node is just an anchor in the topology; the usable
//! channels enumerate as descendant nodes with no independently identifying
//! properties, often a noticeable time after the anchor itself appears.
//!
//! Binding is therefore two-phase. Phase one is ordinary rule matching
//! against the anchor. Phase two runs on every poll cycle: while the
//! resource is bound but not yet fully resolved, the live present-device
//! registry is scanned for the auxiliary nodes and they are classified by
//! their own subsystem and device type. Availability is redefined to
//! "anchor bound AND all auxiliary channels populated" - an anchor alone is
//! not usable. On unbind everything clears unconditionally.

use devrig_udev::{DeviceData, DeviceRegistry, DeviceSnapshot};
use tracing::debug;

/// An SD mux: control channel and disk both enumerate below the anchor.
#[derive(Debug, Default)]
pub struct SdMux {
    control_path: Option<String>,
    disk_path: Option<String>,
}

impl SdMux {
    /// Create an unresolved SD-mux family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Device node of the control channel (`/dev/sgN`), once resolved.
    pub fn control_path(&self) -> Option<&str> {
        self.control_path.as_deref()
    }

    /// Device node of the switched disk (`/dev/sdX`), once resolved.
    pub fn disk_path(&self) -> Option<&str> {
        self.disk_path.as_deref()
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.control_path.is_some() && self.disk_path.is_some()
    }

    pub(crate) fn update(&mut self, device: Option<&DeviceSnapshot>) {
        if device.is_none() {
            self.control_path = None;
            self.disk_path = None;
        }
    }

    pub(crate) fn resolve(&mut self, device: &DeviceSnapshot, registry: &DeviceRegistry) {
        for child in registry.descendants_of(&device.sys_path) {
            match classify(child) {
                Channel::Disk => self.disk_path = child.device_node.clone(),
                Channel::Control => self.control_path = child.device_node.clone(),
                Channel::Other => {}
            }
        }
        if self.is_resolved() {
            debug!(
                control = self.control_path.as_deref(),
                disk = self.disk_path.as_deref(),
                "sd-mux channels resolved"
            );
        }
    }
}

/// An SD wire: the disk enumerates under the anchor's *parent* hub, and the
/// control channel is addressed by the anchor's serial number instead of a
/// device node.
#[derive(Debug, Default)]
pub struct SdWire {
    control_serial: Option<String>,
    disk_path: Option<String>,
}

impl SdWire {
    /// Create an unresolved SD-wire family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serial number addressing the control channel, once resolved.
    pub fn control_serial(&self) -> Option<&str> {
        self.control_serial.as_deref()
    }

    /// Device node of the switched disk (`/dev/sdX`), once resolved.
    pub fn disk_path(&self) -> Option<&str> {
        self.disk_path.as_deref()
    }

    pub(crate) fn is_resolved(&self) -> bool {
        self.control_serial.is_some() && self.disk_path.is_some()
    }

    pub(crate) fn update(&mut self, device: Option<&DeviceSnapshot>) {
        if device.is_none() {
            self.control_serial = None;
            self.disk_path = None;
        }
    }

    pub(crate) fn resolve(&mut self, device: &DeviceSnapshot, registry: &DeviceRegistry) {
        // The disk hangs off the hub above the anchor, as a sibling subtree.
        if let Some(parent) = device.parent() {
            for sibling in registry.descendants_of(&parent.sys_path) {
                if matches!(classify(sibling), Channel::Disk) {
                    self.disk_path = sibling.device_node.clone();
                }
            }
        }
        self.control_serial = device.property("ID_SERIAL_SHORT").map(str::to_string);
    }
}

enum Channel {
    Disk,
    Control,
    Other,
}

fn classify(device: &DeviceData) -> Channel {
    if device.subsystem.as_deref() == Some("block") && device.device_type.as_deref() == Some("disk")
    {
        Channel::Disk
    } else if device.subsystem.as_deref() == Some("scsi_generic") {
        Channel::Control
    } else {
        Channel::Other
    }
}
