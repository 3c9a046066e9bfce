//! Power control hardware.

/// A single power-controllable downstream port on a USB hub.
///
/// The hub interface is the matched node; `index` selects the downstream
/// port. Driving the port (per-port power switching requests) is the
/// consumer's job, keyed off the resolved anchor.
#[derive(Debug)]
pub struct PowerPort {
    index: u32,
}

impl PowerPort {
    /// Create a power-port family for the given downstream port index.
    pub fn new(index: u32) -> Self {
        Self { index }
    }

    /// Downstream port index on the hub.
    pub fn index(&self) -> u32 {
        self.index
    }
}

/// A HID-addressed relay box.
#[derive(Debug)]
pub struct HidRelay {
    index: u32,
    invert: bool,
}

impl HidRelay {
    /// Create a relay family for the given relay index.
    pub fn new(index: u32, invert: bool) -> Self {
        Self { index, invert }
    }

    /// Relay index on the box, 1-based.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether the relay's wiring inverts the logical state.
    pub fn invert(&self) -> bool {
        self.invert
    }
}

impl Default for HidRelay {
    fn default() -> Self {
        Self {
            index: 1,
            invert: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hid_relay_defaults_to_first_relay_non_inverted() {
        let relay = HidRelay::default();
        assert_eq!(relay.index(), 1);
        assert!(!relay.invert());
    }
}
