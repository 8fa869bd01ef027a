//! File-backed blob storage.
//!
//! Layout inside the store directory:
//! ```text
//! <key>.json        - current blob for each key
//! <key>.json.tmp    - in-flight write, renamed over the blob on success
//! ```

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Errors from durable storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("storage quota exceeded: blob is {needed} bytes, limit is {limit}")]
    QuotaExceeded { needed: u64, limit: u64 },
    #[error("write rejected: {0}")]
    WriteRejected(String),
    #[error("invalid storage key {0:?}")]
    InvalidKey(String),
}

/// A place to keep one text blob per key across sessions.
pub trait DurableStore: Send {
    /// Read the blob under `key`, or `None` if nothing was ever written.
    fn read_blob(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Replace the blob under `key` with `text`.
    fn write_blob(&mut self, key: &str, text: &str) -> Result<(), StoreError>;
}

/// Directory-backed store, one file per key.
#[derive(Debug, Clone)]
pub struct FileStore {
    root: PathBuf,
    quota_bytes: Option<u64>,
}

impl FileStore {
    /// Open or create a store rooted at the given directory.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            quota_bytes: None,
        })
    }

    /// Reject any single blob larger than `bytes`.
    pub fn with_quota(mut self, bytes: u64) -> Self {
        self.quota_bytes = Some(bytes);
        self
    }

    /// Get the path to the store root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file holding `key`.
    pub fn blob_path(&self, key: &str) -> Result<PathBuf, StoreError> {
        validate_key(key)?;
        Ok(self.root.join(format!("{key}.json")))
    }
}

impl DurableStore for FileStore {
    fn read_blob(&self, key: &str) -> Result<Option<String>, StoreError> {
        let path = self.blob_path(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!(key, bytes = text.len(), "read blob");
                Ok(Some(text))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write_blob(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
        let path = self.blob_path(key)?;
        check_quota(self.quota_bytes, text)?;

        let tmp = path.with_extension("json.tmp");
        if let Err(e) = std::fs::write(&tmp, text).and_then(|()| std::fs::rename(&tmp, &path)) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }
        tracing::debug!(key, bytes = text.len(), "wrote blob");
        Ok(())
    }
}

pub(crate) fn check_quota(quota: Option<u64>, text: &str) -> Result<(), StoreError> {
    let needed = text.len() as u64;
    match quota {
        Some(limit) if needed > limit => Err(StoreError::QuotaExceeded { needed, limit }),
        _ => Ok(()),
    }
}

pub(crate) fn validate_key(key: &str) -> Result<(), StoreError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
    if valid {
        Ok(())
    } else {
        Err(StoreError::InvalidKey(key.to_owned()))
    }
}
