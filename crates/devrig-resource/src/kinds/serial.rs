//! USB serial adapters.

use devrig_udev::DeviceSnapshot;

/// A USB serial adapter exposing a tty device node.
///
/// The stable handle consumers want is the tty path (`/dev/ttyUSB3`), which
/// can rename on every re-plug; the binder keeps [`port`](Self::port)
/// current across rebinds.
#[derive(Debug, Default)]
pub struct SerialPort {
    port: Option<String>,
}

impl SerialPort {
    /// Create an unbound serial-port family.
    pub fn new() -> Self {
        Self::default()
    }

    /// Device node of the bound tty, e.g. `/dev/ttyUSB3`.
    pub fn port(&self) -> Option<&str> {
        self.port.as_deref()
    }

    pub(crate) fn update(&mut self, device: Option<&DeviceSnapshot>) {
        self.port = device.and_then(|d| d.device_node.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use devrig_udev::{DeviceData, HotplugAction};

    #[test]
    fn update_tracks_the_device_node() {
        let mut kind = SerialPort::new();
        assert_eq!(kind.port(), None);

        let snapshot = DeviceSnapshot::new(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0/ttyUSB3")
                .with_subsystem("tty")
                .with_device_node("/dev/ttyUSB3"),
        );
        kind.update(Some(&snapshot));
        assert_eq!(kind.port(), Some("/dev/ttyUSB3"));

        kind.update(None);
        assert_eq!(kind.port(), None);
    }
}
