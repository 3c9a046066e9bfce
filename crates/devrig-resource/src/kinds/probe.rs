//! Debug probes.

use devrig_udev::DeviceSnapshot;

/// Vendor/product ID pairs of supported debug probes.
const DEBUG_PROBE_IDS: [(&str, &str); 6] = [
    ("0403", "6010"), // FT2232C/D/H Dual UART/FIFO IC
    ("0483", "374f"), // STLINK-V3
    ("15ba", "0003"), // Olimex ARM-USB-OCD
    ("15ba", "002b"), // Olimex ARM-USB-OCD-H
    ("15ba", "0004"), // Olimex ARM-USB-TINY
    ("15ba", "002a"), // Olimex ARM-USB-TINY-H
];

/// A JTAG/SWD debug probe.
///
/// Probes share generic USB classes, so the declarative rules cannot pick
/// them out; the filter hook checks the vendor/product pair against the
/// supported-probe list instead.
#[derive(Debug, Default)]
pub struct Debugger;

impl Debugger {
    /// Create a debug-probe family.
    pub fn new() -> Self {
        Self
    }

    pub(crate) fn filter_match(&self, snapshot: &DeviceSnapshot) -> bool {
        let pair = (
            snapshot.property("ID_VENDOR_ID"),
            snapshot.property("ID_MODEL_ID"),
        );
        let (Some(vendor), Some(model)) = pair else {
            return false;
        };
        DEBUG_PROBE_IDS.contains(&(vendor, model))
    }
}
