//! Hotplug action tags.

use devrig_core::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of topology change a hotplug notification describes.
///
/// The first five variants mirror the kernel uevent action strings. The
/// synthetic [`Initial`](Self::Initial) tag is attached by the enumerator to
/// devices that were already present when monitoring started; the binding
/// engine treats it exactly like an arrival.
///
/// # Examples
///
/// ```
/// use devrig_udev::HotplugAction;
///
/// let action: HotplugAction = "add".parse().unwrap();
/// assert_eq!(action, HotplugAction::Add);
/// assert!(action.is_arrival());
/// assert_eq!(action.to_string(), "add");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HotplugAction {
    /// A device appeared.
    Add,

    /// A device's properties changed.
    Change,

    /// A device moved within the topology.
    Move,

    /// The driver detached from a device; the kernel object still exists.
    Unbind,

    /// A device disappeared.
    Remove,

    /// Synthetic tag for a device already present at enumeration time.
    Initial,
}

impl HotplugAction {
    /// Whether this action announces a device a resource may bind to.
    pub fn is_arrival(self) -> bool {
        matches!(self, Self::Add | Self::Initial)
    }

    /// Whether this action announces that a device stopped being usable.
    pub fn is_departure(self) -> bool {
        matches!(self, Self::Unbind | Self::Remove)
    }

    /// The lowercase tag string, as the kernel spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Change => "change",
            Self::Move => "move",
            Self::Unbind => "unbind",
            Self::Remove => "remove",
            Self::Initial => "initial",
        }
    }
}

impl fmt::Display for HotplugAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HotplugAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Self::Add),
            "change" => Ok(Self::Change),
            "move" => Ok(Self::Move),
            "unbind" => Ok(Self::Unbind),
            "remove" => Ok(Self::Remove),
            "initial" => Ok(Self::Initial),
            other => Err(Error::UnknownAction(other.to_string())),
        }
    }
}
