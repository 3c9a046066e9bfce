//! The hotplug manager and its dispatch loop.
//!
//! [`UsbHotplugManager`] owns the registered resources of one family and
//! the consumer half of the monitor channel. Its [`poll`] entry point is
//! invoked by an outer scheduler at whatever cadence suits the rig; each
//! call drains queued events under a fixed time budget and broadcasts every
//! drained event to every registered resource.
//!
//! The broadcast is plain fan-out rather than a routing table: hotplug
//! traffic is low-frequency relative to the poll cadence,
//! and a resource with non-matching rules rejects an event in O(rules).
//! Failures are isolated per resource per event - one resource's transient
//! failure is logged and the broadcast continues with the remaining
//! resources and events.
//!
//! The registry of resources is assembled at setup time and never mutated
//! concurrently with dispatch; `register` takes `&mut self` like `poll`
//! does, so the borrow checker enforces that for free.
//!
//! [`poll`]: UsbHotplugManager::poll

use std::time::{Duration, Instant};

use devrig_core::constants::DEFAULT_POLL_BUDGET;
use devrig_udev::{DeviceRegistry, EventReceiver};
use tracing::{debug, warn};

use crate::resource::UsbResource;

/// Handle to a resource registered with a manager.
///
/// Resource identity is positional - the handle is the resource's index in
/// the manager's registry, assigned at registration and stable for the
/// life of the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ResourceId(usize);

/// Tuning knobs for the dispatch loop.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Maximum wall-clock time one `poll()` call spends draining the event
    /// queue. Events left over stay queued for the next call.
    pub poll_budget: Duration,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            poll_budget: DEFAULT_POLL_BUDGET,
        }
    }
}

/// Owns the USB resources of a rig and fans hotplug events out to them.
pub struct UsbHotplugManager {
    resources: Vec<UsbResource>,
    events: EventReceiver,
    registry: DeviceRegistry,
    config: ManagerConfig,
}

impl UsbHotplugManager {
    /// Create a manager with the default configuration.
    pub fn new(events: EventReceiver) -> Self {
        Self::with_config(events, ManagerConfig::default())
    }

    /// Create a manager with explicit tuning.
    pub fn with_config(events: EventReceiver, config: ManagerConfig) -> Self {
        Self {
            resources: Vec::new(),
            events,
            registry: DeviceRegistry::new(),
            config,
        }
    }

    /// Register a resource. Setup-time only: registration and dispatch
    /// never run concurrently.
    pub fn register(&mut self, resource: UsbResource) -> ResourceId {
        debug!(kind = resource.kind().name(), "resource registered");
        self.resources.push(resource);
        ResourceId(self.resources.len() - 1)
    }

    /// Number of registered resources.
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Whether no resources are registered.
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Read access to a registered resource.
    pub fn resource(&self, id: ResourceId) -> Option<&UsbResource> {
        self.resources.get(id.0)
    }

    /// Mutable access to a registered resource, for setup-time adjustments.
    pub fn resource_mut(&mut self, id: ResourceId) -> Option<&mut UsbResource> {
        self.resources.get_mut(id.0)
    }

    /// Whether the resource is currently available.
    pub fn avail(&self, id: ResourceId) -> bool {
        self.resource(id).is_some_and(UsbResource::avail)
    }

    /// The resource's resolved operational handle.
    pub fn path(&self, id: ResourceId) -> Option<String> {
        self.resource(id).and_then(UsbResource::path)
    }

    /// The manager's view of currently present devices.
    pub fn registry(&self) -> &DeviceRegistry {
        &self.registry
    }

    /// Drain and dispatch pending hotplug events.
    ///
    /// Idempotent and safe to call at any cadence. Each call:
    ///
    /// 1. Pulls queued events without blocking until the queue is empty or
    ///    the configured budget elapses, so an event burst cannot stall the
    ///    caller. Each event updates the present-device registry and is
    ///    broadcast to every registered resource.
    /// 2. Runs the composite second phase: bound-but-unresolved resources
    ///    scan the registry for their auxiliary channels.
    pub fn poll(&mut self) {
        let deadline = Instant::now() + self.config.poll_budget;

        while Instant::now() < deadline {
            let Some(snapshot) = self.events.try_recv() else {
                break;
            };
            debug!(
                action = %snapshot.action(),
                sys_path = %snapshot.sys_path.display(),
                "dispatching hotplug event"
            );

            self.registry.apply(&snapshot);

            for (index, resource) in self.resources.iter_mut().enumerate() {
                match resource.try_match(&snapshot) {
                    Ok(true) => {
                        debug!(resource = index, kind = resource.kind().name(), "matched");
                    }
                    Ok(false) => {}
                    // Resource-local failure: log and keep broadcasting.
                    Err(error) => {
                        warn!(
                            resource = index,
                            kind = resource.kind().name(),
                            %error,
                            "resource failed to process event"
                        );
                    }
                }
            }
        }

        for resource in &mut self.resources {
            resource.resolve(&self.registry);
        }
    }
}
