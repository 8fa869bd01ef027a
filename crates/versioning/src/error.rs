use boardspace_canvas::CanvasError;
use boardspace_persist::StoreError;
use std::fmt;

/// Errors from version operations.
#[derive(Debug, thiserror::Error)]
pub enum VersionError {
    #[error("no canvas attached")]
    CanvasUnavailable,
    #[error("failed to capture scene: {0}")]
    Capture(#[from] CanvasError),
    #[error("could not generate a unique version id after {attempts} attempts")]
    IdExhausted { attempts: u32 },
    #[error("failed to persist versions: {0}")]
    Persistence(#[from] StoreError),
    #[error("failed to encode versions: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Coarse classification of a [`VersionError`], as shown to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    CanvasUnavailable,
    CaptureFailure,
    PersistenceFailure,
}

impl VersionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::CanvasUnavailable => ErrorKind::CanvasUnavailable,
            Self::Capture(_) | Self::IdExhausted { .. } => ErrorKind::CaptureFailure,
            Self::Persistence(_) | Self::Encode(_) => ErrorKind::PersistenceFailure,
        }
    }
}

/// The most recent failure recorded by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastError {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&VersionError> for LastError {
    fn from(err: &VersionError) -> Self {
        Self {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl fmt::Display for LastError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}
