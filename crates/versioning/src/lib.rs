//! Board versioning: named point-in-time snapshots of a canvas scene,
//! kept newest-first and persisted as one JSON blob under a fixed key.
//!
//! # Invariants
//! - The collection is ordered newest-first and ids are unique.
//! - Memory and the durable blob agree after every operation, successful or not.
//! - Failures are recorded on the store and never leave it unusable.

mod config;
mod error;
mod store;
mod version;

pub use config::{ConfigError, VersioningConfig};
pub use error::{ErrorKind, LastError, VersionError};
pub use store::VersionStore;
pub use version::{BoardVersion, VersionSummary};

pub fn crate_info() -> &'static str {
    "boardspace-versioning v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("versioning"));
    }
}
