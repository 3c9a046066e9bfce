//! Tuning constants for the hotplug binding engine.
//!
//! These values bound how long a single dispatch cycle may run and how long
//! dependent operations should wait for a freshly bound resource to become
//! usable. They are deliberate defaults, not hard OS timers; callers can
//! override them through the manager and resource configuration.

use std::time::Duration;

/// Per-call budget for draining the hotplug event queue.
///
/// A `poll()` invocation stops pulling queued events once this much time
/// has elapsed, so a burst of hotplug activity cannot stall the caller.
/// Events left over remain queued for the next cycle.
pub const DEFAULT_POLL_BUDGET: Duration = Duration::from_millis(100);

/// Default liveness budget attached to each resource.
///
/// This is how long operations that depend on a resource may wait for it
/// to become available after a bind, for example while a composite device
/// finishes enumerating its auxiliary channels. It does not bound matching
/// itself, which is synchronous.
pub const DEFAULT_RESOURCE_TIMEOUT: Duration = Duration::from_secs(5);

/// Capacity of the bounded channel between the hotplug monitor and the
/// dispatch loop.
///
/// Hotplug traffic is low-frequency relative to the poll cadence, so this
/// mostly needs to absorb the initial enumeration burst at startup.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_budget_is_small_relative_to_resource_timeout() {
        assert!(DEFAULT_POLL_BUDGET < DEFAULT_RESOURCE_TIMEOUT);
        assert_eq!(DEFAULT_POLL_BUDGET, Duration::from_millis(100));
    }

    #[test]
    fn channel_capacity_absorbs_an_enumeration_burst() {
        assert!(EVENT_CHANNEL_CAPACITY >= 64);
    }
}
