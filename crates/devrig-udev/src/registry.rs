//! Present-device registry.
//!
//! The registry is the dispatch loop's live view of which devices currently
//! exist, maintained from the same event stream it broadcasts. It exists
//! because a retained [`DeviceSnapshot`] is frozen at event time: a
//! composite resource that bound its anchor before the anchor's child
//! channels enumerated can only discover those children through a live
//! topology query, never through the snapshot it holds.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{DeviceData, DeviceSnapshot, HotplugAction};

/// Map of currently present devices, keyed by sysfs path.
///
/// Semantics per action:
/// - `add`/`initial`/`change`/`move` upsert the device record.
/// - `remove` deletes the node and everything below it in the sysfs tree
///   (the kernel emits per-node removals too, but cascading keeps the view
///   consistent even if a notification is lost).
/// - `unbind` leaves the node present: the driver detached but the kernel
///   object still exists.
///
/// Ancestors carried on a snapshot are inserted if absent - a device can
/// only be present if its ancestors are - but never overwrite fresher
/// records.
#[derive(Debug, Default)]
pub struct DeviceRegistry {
    devices: HashMap<PathBuf, Arc<DeviceData>>,
}

impl DeviceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one drained event to the present-device view.
    pub fn apply(&mut self, snapshot: &DeviceSnapshot) {
        match snapshot.action() {
            HotplugAction::Add
            | HotplugAction::Initial
            | HotplugAction::Change
            | HotplugAction::Move => {
                self.devices
                    .insert(snapshot.sys_path.clone(), Arc::clone(snapshot.data()));
                for ancestor in snapshot.ancestors() {
                    self.devices
                        .entry(ancestor.sys_path.clone())
                        .or_insert_with(|| Arc::clone(ancestor));
                }
            }
            HotplugAction::Unbind => {}
            HotplugAction::Remove => {
                let removed = snapshot.sys_path.clone();
                self.devices.retain(|path, _| !path.starts_with(&removed));
            }
        }
    }

    /// Look up a present device by sysfs path.
    pub fn get(&self, sys_path: &Path) -> Option<&Arc<DeviceData>> {
        self.devices.get(sys_path)
    }

    /// Whether a device at the given path is currently present.
    pub fn contains(&self, sys_path: &Path) -> bool {
        self.devices.contains_key(sys_path)
    }

    /// Number of present devices.
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Whether no devices are present.
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Present devices strictly below `sys_path` in the sysfs tree, at any
    /// depth. The node itself is not included.
    pub fn descendants_of<'a>(
        &'a self,
        sys_path: &'a Path,
    ) -> impl Iterator<Item = &'a Arc<DeviceData>> {
        self.devices.values().filter(move |device| {
            device.sys_path != sys_path && device.sys_path.starts_with(sys_path)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(action: HotplugAction, device: DeviceData) -> DeviceSnapshot {
        DeviceSnapshot::new(action, device)
    }

    #[test]
    fn add_and_remove_maintain_presence() {
        let mut registry = DeviceRegistry::new();
        let path = Path::new("/sys/devices/usb1/1-4");

        registry.apply(&snapshot(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4").with_subsystem("usb"),
        ));
        assert!(registry.contains(path));

        registry.apply(&snapshot(
            HotplugAction::Remove,
            DeviceData::new("/sys/devices/usb1/1-4"),
        ));
        assert!(!registry.contains(path));
        assert!(registry.is_empty());
    }

    #[test]
    fn change_replaces_the_record() {
        let mut registry = DeviceRegistry::new();

        registry.apply(&snapshot(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4").with_property("ID_MODEL", "old"),
        ));
        registry.apply(&snapshot(
            HotplugAction::Change,
            DeviceData::new("/sys/devices/usb1/1-4").with_property("ID_MODEL", "new"),
        ));

        let device = registry.get(Path::new("/sys/devices/usb1/1-4")).unwrap();
        assert_eq!(device.property("ID_MODEL"), Some("new"));
    }

    #[test]
    fn unbind_keeps_the_node_present() {
        let mut registry = DeviceRegistry::new();
        let path = Path::new("/sys/devices/usb1/1-4");

        registry.apply(&snapshot(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4"),
        ));
        registry.apply(&snapshot(
            HotplugAction::Unbind,
            DeviceData::new("/sys/devices/usb1/1-4"),
        ));
        assert!(registry.contains(path));
    }

    #[test]
    fn remove_cascades_to_descendants() {
        let mut registry = DeviceRegistry::new();

        registry.apply(&snapshot(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4"),
        ));
        registry.apply(&snapshot(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0/host0/target0:0:0/0:0:0:0/block/sda"),
        ));
        registry.apply(&snapshot(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-5"),
        ));

        registry.apply(&snapshot(
            HotplugAction::Remove,
            DeviceData::new("/sys/devices/usb1/1-4"),
        ));

        assert!(!registry.contains(Path::new(
            "/sys/devices/usb1/1-4/1-4:1.0/host0/target0:0:0/0:0:0:0/block/sda"
        )));
        assert!(registry.contains(Path::new("/sys/devices/usb1/1-5")));
    }

    #[test]
    fn ancestors_are_inserted_but_do_not_overwrite() {
        let mut registry = DeviceRegistry::new();

        registry.apply(&snapshot(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4").with_property("ID_MODEL", "fresh"),
        ));

        let child = DeviceSnapshot::builder(
            HotplugAction::Add,
            DeviceData::new("/sys/devices/usb1/1-4/1-4:1.0"),
        )
        .ancestor(DeviceData::new("/sys/devices/usb1/1-4").with_property("ID_MODEL", "stale"))
        .ancestor(DeviceData::new("/sys/devices/usb1"))
        .build();
        registry.apply(&child);

        // The fresher record for 1-4 survives; the unseen root is added.
        let anchor = registry.get(Path::new("/sys/devices/usb1/1-4")).unwrap();
        assert_eq!(anchor.property("ID_MODEL"), Some("fresh"));
        assert!(registry.contains(Path::new("/sys/devices/usb1")));
    }

    #[test]
    fn descendants_scan_is_strict_and_deep() {
        let mut registry = DeviceRegistry::new();
        for path in [
            "/sys/devices/usb1/1-4",
            "/sys/devices/usb1/1-4/1-4:1.0",
            "/sys/devices/usb1/1-4/1-4:1.0/host0/block/sda",
            "/sys/devices/usb1/1-40",
        ] {
            registry.apply(&snapshot(HotplugAction::Add, DeviceData::new(path)));
        }

        let anchor = Path::new("/sys/devices/usb1/1-4");
        let mut names: Vec<_> = registry
            .descendants_of(anchor)
            .map(|device| device.sys_name.clone())
            .collect();
        names.sort();

        // Path components match exactly: `1-40` is a sibling, not a child.
        assert_eq!(names, ["1-4:1.0", "sda"]);
    }
}
