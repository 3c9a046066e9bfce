//! Error types for hotplug resource binding.
//!
//! Structural mismatches are not errors: a device that fails a resource's
//! match rules is a normal "no match" outcome and never surfaces here. The
//! variants below cover the genuinely exceptional cases, most notably the
//! attribute-read race where a sysfs read is attempted after the physical
//! device has already gone away.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for devrig operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while binding resources to hotplug devices.
#[derive(Debug, Error)]
pub enum Error {
    /// An uncached sysfs attribute read failed.
    ///
    /// The usual cause is a device that was removed between the hotplug
    /// notification and the read; the removal event is still in flight.
    /// This is a resource-local failure and must not stop the dispatch
    /// loop from serving other resources.
    #[error("failed to read sysfs attribute {path}")]
    AttributeRead {
        /// Full path of the attribute file that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A resource or rule set was configured inconsistently at setup time.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An action string from the event source was not recognized.
    #[error("unknown hotplug action: {0}")]
    UnknownAction(String),

    /// A monitor or suggestion channel was closed by its peer.
    #[error("channel closed: {0}")]
    ChannelClosed(String),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an attribute-read error for the given sysfs path.
    pub fn attribute_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::AttributeRead {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create a channel-closed error.
    pub fn channel_closed(endpoint: impl Into<String>) -> Self {
        Self::ChannelClosed(endpoint.into())
    }
}
