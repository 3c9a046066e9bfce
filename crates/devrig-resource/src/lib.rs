//! Resource matching and binding engine for the devrig platform.
//!
//! A test rig declares abstract resources - "the target's serial console",
//! "the SD mux feeding the target", "the power port it hangs off" - and this
//! crate keeps each one bound to the right kernel device node while hardware
//! is plugged, reconfigured, and removed underneath it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐   bounded    ┌─────────────────────────────┐
//! │ hotplug  │──────────────►  UsbHotplugManager::poll()  │
//! │ monitor  │   channel    │                             │
//! └──────────┘              │  DeviceRegistry (presence)  │
//!                           │            │                │
//!                           │   broadcast to every        │
//!                           │   UsbResource::try_match    │
//!                           │            │                │
//!                           │  MatchRules → bind/refresh/ │
//!                           │  unbind → kind update hook  │
//!                           └─────────────────────────────┘
//! ```
//!
//! The pieces:
//!
//! - [`MatchRules`](rules::MatchRules) - an immutable ordered conjunction of
//!   key/value predicates, each scoped to the device itself or to its
//!   ancestor chain (the textual `@KEY` form).
//! - [`UsbResource`](resource::UsbResource) - the per-resource binding state
//!   machine: unbound resources match structurally, bound resources are
//!   tracked by sysfs-path identity only.
//! - [`ResourceKind`](kinds::ResourceKind) - the closed set of device
//!   families (serial port, mass storage, SD mux, power port, …), each
//!   contributing default rules, an optional refinement filter, an update
//!   hook for derived attributes, and (for composite devices) a poll-time
//!   topology resolution step.
//! - [`Suggestion`](suggest::Suggestion) - discovery mode: instead of
//!   binding, a matching resource reports identification metadata and
//!   candidate refinement rules for the operator to pin the device with.
//! - [`UsbHotplugManager`](manager::UsbHotplugManager) - the dispatch loop:
//!   drains the event queue under a time budget and fans every event out to
//!   every registered resource.
//!
//! # Example
//!
//! ```
//! use devrig_resource::kinds::{ResourceKind, SerialPort};
//! use devrig_resource::manager::UsbHotplugManager;
//! use devrig_resource::resource::UsbResource;
//! use devrig_udev::{DeviceData, DeviceSnapshot, HotplugAction, MockMonitor};
//!
//! #[tokio::main]
//! async fn main() -> devrig_core::Result<()> {
//!     let (events, monitor) = MockMonitor::new();
//!     let mut manager = UsbHotplugManager::new(events);
//!     let console = manager.register(UsbResource::new(ResourceKind::SerialPort(
//!         SerialPort::new(),
//!     )));
//!
//!     let snapshot = DeviceSnapshot::builder(
//!         HotplugAction::Add,
//!         DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0/ttyUSB3")
//!             .with_subsystem("tty")
//!             .with_device_node("/dev/ttyUSB3"),
//!     )
//!     .ancestor(
//!         DeviceData::new("/sys/devices/usb1/1-4")
//!             .with_subsystem("usb")
//!             .with_device_type("usb_device"),
//!     )
//!     .build();
//!     monitor.deliver(snapshot).await?;
//!
//!     manager.poll();
//!     assert!(manager.avail(console));
//!     assert_eq!(manager.path(console).as_deref(), Some("/dev/ttyUSB3"));
//!     Ok(())
//! }
//! ```

pub mod kinds;
pub mod manager;
pub mod resource;
pub mod rules;
pub mod suggest;

pub use kinds::ResourceKind;
pub use manager::{ManagerConfig, ResourceId, UsbHotplugManager};
pub use resource::UsbResource;
pub use rules::{MatchRule, MatchRules, MatchRulesBuilder, RuleScope};
pub use suggest::{Suggestion, SuggestionSink, suggestion_channel};
