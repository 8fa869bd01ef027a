use crate::store::{DurableStore, StoreError, check_quota, validate_key};
use std::collections::BTreeMap;

/// In-memory store for tests and ephemeral sessions.
///
/// Can be told to reject writes, which reproduces a full or read-only
/// device without touching the filesystem.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    blobs: BTreeMap<String, String>,
    quota_bytes: Option<u64>,
    reject_writes: Option<String>,
    writes: usize,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store that already holds `text` under `key`.
    pub fn with_blob(key: impl Into<String>, text: impl Into<String>) -> Self {
        let mut store = Self::new();
        store.blobs.insert(key.into(), text.into());
        store
    }

    /// Reject any single blob larger than `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Reject every write with `reason` until cleared with `None`.
    pub fn reject_writes(&mut self, reason: Option<&str>) {
        self.reject_writes = reason.map(str::to_owned);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.writes
    }

    /// Peek at a blob without going through the trait.
    pub fn blob(&self, key: &str) -> Option<&str> {
        self.blobs.get(key).map(String::as_str)
    }
}

impl DurableStore for MemoryStore {
    fn read_blob(&self, key: &str) -> Result<Option<String>, StoreError> {
        validate_key(key)?;
        Ok(self.blobs.get(key).cloned())
    }

    fn write_blob(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
        validate_key(key)?;
        if let Some(reason) = &self.reject_writes {
            return Err(StoreError::WriteRejected(reason.clone()));
        }
        check_quota(self.quota_bytes, text)?;
        self.blobs.insert(key.to_owned(), text.to_owned());
        self.writes += 1;
        Ok(())
    }
}
