//! Persistence: durable text blobs stored under fixed keys.
//!
//! # Invariants
//! - A write replaces the whole blob; readers never observe a partial value.
//! - A rejected write leaves the previous blob in place.

mod memory;
mod store;

pub use memory::MemoryStore;
pub use store::{DurableStore, FileStore, StoreError};

pub fn crate_info() -> &'static str {
    "boardspace-persist v0.1.0"
}
