//! Hotplug event model for the devrig binding layer.
//!
//! This crate models what the OS-level hotplug monitor produces and what the
//! dispatch loop consumes:
//!
//! - [`HotplugAction`] - the tag carried on every notification
//!   (`add`/`change`/`move`/`unbind`/`remove`, plus the synthetic
//!   [`HotplugAction::Initial`] for devices already present at enumeration
//!   time).
//! - [`DeviceData`] - the flat identity, property, and attribute record of
//!   one kernel device node, with uncached sysfs attribute reads.
//! - [`DeviceSnapshot`] - the immutable-per-event view delivered to the
//!   matching engine: a device record plus its ancestor chain and action tag.
//! - [`DeviceRegistry`] - the consumer-maintained view of currently present
//!   devices, used for live topology queries that a point-in-time snapshot
//!   cannot answer.
//! - [`event_channel`] / [`MockMonitor`] - the bounded monitor-to-dispatcher
//!   channel and a scriptable monitor stand-in for tests.
//!
//! The actual OS monitor (netlink uevent socket plus initial enumeration) is
//! an external collaborator; anything that can produce [`DeviceSnapshot`]s
//! into an [`EventSender`] can drive the engine.

pub mod action;
pub mod device;
pub mod monitor;
pub mod registry;

pub use action::HotplugAction;
pub use device::{DeviceData, DeviceSnapshot, DeviceSnapshotBuilder};
pub use monitor::{EventReceiver, EventSender, MockMonitor, MockMonitorHandle, event_channel};
pub use registry::DeviceRegistry;
