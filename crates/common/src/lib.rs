//! Shared types and capabilities: version identifiers, id generation, wall clock.
//!
//! # Invariants
//! - Ids handed out by one generator never repeat within a process run.
//! - Clock readings are truncated to millisecond precision.

mod clock;
mod ids;

pub use clock::{Clock, FixedClock, SystemClock};
pub use ids::{
    IdGenerator, IdStrategy, RandomIds, SequentialIds, TimestampIds, UnknownIdStrategy, VersionId,
};

pub fn crate_info() -> &'static str {
    "boardspace-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
