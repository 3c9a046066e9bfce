//! Event channel between the hotplug monitor and the dispatch loop.
//!
//! The OS-level monitor is an external collaborator: a netlink uevent
//! listener plus an initial enumeration pass that replays already-present
//! devices with the synthetic [`HotplugAction::Initial`] tag. This module
//! provides the bounded channel it feeds, and [`MockMonitor`] - a
//! scriptable stand-in that lets tests and demos deliver hotplug traffic
//! without hardware.
//!
//! Ordering: events are delivered FIFO, exactly as enqueued. The channel
//! performs no coalescing or reordering.

use devrig_core::constants::EVENT_CHANNEL_CAPACITY;
use devrig_core::{Error, Result};
use tokio::sync::mpsc;
use tracing::trace;

use crate::{DeviceData, DeviceSnapshot, HotplugAction};

/// Create the bounded monitor-to-dispatcher event channel.
///
/// Single producer (the monitor), single consumer (the manager's poll
/// loop). A capacity of [`EVENT_CHANNEL_CAPACITY`] is a good default.
pub fn event_channel(capacity: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(capacity);
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer half of the event channel, held by the monitor.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<DeviceSnapshot>,
}

impl EventSender {
    /// Enqueue a snapshot, waiting for channel capacity if necessary.
    pub async fn send(&self, snapshot: DeviceSnapshot) -> Result<()> {
        trace!(
            action = %snapshot.action(),
            sys_path = %snapshot.sys_path.display(),
            "enqueueing hotplug event"
        );
        self.tx
            .send(snapshot)
            .await
            .map_err(|_| Error::channel_closed("hotplug event queue"))
    }

    /// Enqueue a snapshot without waiting; fails if the queue is full or
    /// the consumer is gone.
    pub fn try_send(&self, snapshot: DeviceSnapshot) -> Result<()> {
        self.tx
            .try_send(snapshot)
            .map_err(|_| Error::channel_closed("hotplug event queue"))
    }
}

/// Consumer half of the event channel, owned by the dispatch loop.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::Receiver<DeviceSnapshot>,
}

impl EventReceiver {
    /// Dequeue without blocking.
    ///
    /// Returns `None` when the queue is currently empty or the monitor
    /// has shut down - either way there is nothing to drain this cycle.
    pub fn try_recv(&mut self) -> Option<DeviceSnapshot> {
        self.rx.try_recv().ok()
    }

    /// Await the next event. Returns `None` once the monitor is gone and
    /// the queue is drained.
    pub async fn recv(&mut self) -> Option<DeviceSnapshot> {
        self.rx.recv().await
    }
}

/// Scriptable stand-in for the OS hotplug monitor.
///
/// Returns the receiver half for the manager and a [`MockMonitorHandle`]
/// that delivers events on demand:
///
/// ```
/// use devrig_udev::{DeviceData, MockMonitor};
///
/// #[tokio::main]
/// async fn main() -> devrig_core::Result<()> {
///     let (mut events, monitor) = MockMonitor::new();
///
///     monitor
///         .plug(DeviceData::new("/sys/devices/usb1/1-4").with_subsystem("usb"))
///         .await?;
///
///     let snapshot = events.try_recv().expect("event was queued");
///     assert_eq!(snapshot.sys_name, "1-4");
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct MockMonitor;

impl MockMonitor {
    /// Create a mock monitor with the default channel capacity.
    pub fn new() -> (EventReceiver, MockMonitorHandle) {
        Self::with_capacity(EVENT_CHANNEL_CAPACITY)
    }

    /// Create a mock monitor with an explicit channel capacity.
    pub fn with_capacity(capacity: usize) -> (EventReceiver, MockMonitorHandle) {
        let (tx, rx) = event_channel(capacity);
        (rx, MockMonitorHandle { tx })
    }
}

/// Handle for scripting hotplug traffic through a [`MockMonitor`].
#[derive(Debug, Clone)]
pub struct MockMonitorHandle {
    tx: EventSender,
}

impl MockMonitorHandle {
    /// Deliver a fully assembled snapshot, ancestors and all.
    pub async fn deliver(&self, snapshot: DeviceSnapshot) -> Result<()> {
        self.tx.send(snapshot).await
    }

    /// Deliver an `add` for a device with no recorded ancestors.
    pub async fn plug(&self, device: DeviceData) -> Result<()> {
        self.deliver(DeviceSnapshot::new(HotplugAction::Add, device))
            .await
    }

    /// Deliver the synthetic initial-presence event for a device that was
    /// already attached when monitoring started.
    pub async fn initial(&self, device: DeviceData) -> Result<()> {
        self.deliver(DeviceSnapshot::new(HotplugAction::Initial, device))
            .await
    }

    /// Deliver a `change` carrying refreshed properties.
    pub async fn refresh(&self, device: DeviceData) -> Result<()> {
        self.deliver(DeviceSnapshot::new(HotplugAction::Change, device))
            .await
    }

    /// Deliver a `remove` for a device.
    pub async fn unplug(&self, device: DeviceData) -> Result<()> {
        self.deliver(DeviceSnapshot::new(HotplugAction::Remove, device))
            .await
    }

    /// The raw sender, for monitors that assemble their own snapshots.
    pub fn sender(&self) -> &EventSender {
        &self.tx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_fifo_order() {
        let (mut events, monitor) = MockMonitor::new();

        monitor
            .plug(DeviceData::new("/sys/devices/usb1/1-4"))
            .await
            .unwrap();
        monitor
            .refresh(DeviceData::new("/sys/devices/usb1/1-4"))
            .await
            .unwrap();
        monitor
            .unplug(DeviceData::new("/sys/devices/usb1/1-4"))
            .await
            .unwrap();

        let actions: Vec<_> = std::iter::from_fn(|| events.try_recv())
            .map(|snapshot| snapshot.action())
            .collect();
        assert_eq!(
            actions,
            [
                HotplugAction::Add,
                HotplugAction::Change,
                HotplugAction::Remove
            ]
        );
    }

    #[tokio::test]
    async fn try_recv_on_empty_queue_returns_none() {
        let (mut events, _monitor) = MockMonitor::new();
        assert!(events.try_recv().is_none());
    }

    #[tokio::test]
    async fn send_after_receiver_dropped_reports_closed_channel() {
        let (events, monitor) = MockMonitor::new();
        drop(events);

        let error = monitor
            .plug(DeviceData::new("/sys/devices/usb1/1-4"))
            .await
            .unwrap_err();
        assert!(matches!(error, Error::ChannelClosed(_)));
    }

    #[tokio::test]
    async fn initial_presence_uses_the_synthetic_tag() {
        let (mut events, monitor) = MockMonitor::new();
        monitor
            .initial(DeviceData::new("/sys/devices/usb1/1-2"))
            .await
            .unwrap();

        let snapshot = events.try_recv().unwrap();
        assert_eq!(snapshot.action(), HotplugAction::Initial);
        assert!(snapshot.action().is_arrival());
    }
}
