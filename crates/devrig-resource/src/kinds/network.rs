//! USB network interfaces.

use devrig_udev::DeviceSnapshot;

/// A USB network interface.
///
/// The interface name is derived from the `INTERFACE` property on every
/// binding transition. The live link state (`operstate`) is never cached
/// here; read it through
/// [`UsbResource::if_state`](crate::resource::UsbResource::if_state), which
/// goes to sysfs uncached.
#[derive(Debug, Default)]
pub struct NetworkInterface {
    ifname: Option<String>,
}

impl NetworkInterface {
    /// Create an unbound network-interface family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kernel name of the bound interface, e.g. `enx00e04c680001`.
    pub fn ifname(&self) -> Option<&str> {
        self.ifname.as_deref()
    }

    pub(crate) fn update(&mut self, device: Option<&DeviceSnapshot>) {
        self.ifname = device
            .and_then(|d| d.property("INTERFACE"))
            .map(str::to_string);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devrig_udev::{DeviceData, HotplugAction};

    #[test]
    fn update_tracks_the_interface_property() {
        let mut kind = NetworkInterface::new();

        let snapshot = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0/net/enx00e04c680001")
                .with_subsystem("net")
                .with_property("INTERFACE", "enx00e04c680001"),
        );
        kind.update(Some(&snapshot));
        assert_eq!(kind.ifname(), Some("enx00e04c680001"));

        // A device without the property resets the derived name.
        let bare = DeviceSnapshot::new(
            HotplugAction::Change,
            DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0/net/enx00e04c680001"),
        );
        kind.update(Some(&bare));
        assert_eq!(kind.ifname(), None);
    }
}
