//! Shared foundation for the devrig hotplug binding layer.
//!
//! This crate carries the pieces every other devrig crate needs: the common
//! [`Error`] type with its [`Result`] alias, and the tuning constants that
//! govern the dispatch loop and resource liveness budgets.
//!
//! The interesting machinery lives elsewhere: `devrig-udev` models hotplug
//! events and device snapshots, `devrig-resource` hosts the matching and
//! binding engine.

pub mod constants;
pub mod error;

pub use error::{Error, Result};
