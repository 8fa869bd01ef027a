use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Opaque identifier of a saved board version.
///
/// Serialized as a bare string so blobs stay readable by other hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VersionId(String);

impl VersionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VersionId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for VersionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Source of fresh version ids.
pub trait IdGenerator: Send {
    fn generate(&self) -> VersionId;
}

/// Random UUID v4 ids. The preferred source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIds;

impl IdGenerator for RandomIds {
    fn generate(&self) -> VersionId {
        VersionId(Uuid::new_v4().to_string())
    }
}

/// Millisecond wall-clock ids, used where no random source is wanted.
///
/// Two ids requested within the same millisecond are bumped forward so the
/// sequence stays strictly increasing for the lifetime of the generator.
#[derive(Debug, Default)]
pub struct TimestampIds {
    last: AtomicU64,
}

impl TimestampIds {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for TimestampIds {
    fn generate(&self) -> VersionId {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or_default();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return VersionId(next.to_string()),
                Err(actual) => last = actual,
            }
        }
    }
}

/// Deterministic `{prefix}{n}` ids starting at 1. Intended for tests and demos.
#[derive(Debug)]
pub struct SequentialIds {
    prefix: String,
    next: AtomicU64,
}

impl SequentialIds {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(1),
        }
    }
}

impl IdGenerator for SequentialIds {
    fn generate(&self) -> VersionId {
        let n = self.next.fetch_add(1, Ordering::Relaxed);
        VersionId(format!("{}{n}", self.prefix))
    }
}

/// Which built-in generator a store should use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdStrategy {
    #[default]
    Random,
    Timestamp,
}

impl IdStrategy {
    pub fn generator(self) -> Box<dyn IdGenerator> {
        match self {
            Self::Random => Box::new(RandomIds),
            Self::Timestamp => Box::new(TimestampIds::new()),
        }
    }
}

/// Error parsing an [`IdStrategy`] name.
#[derive(Debug, thiserror::Error)]
#[error("unknown id strategy {0:?} (expected \"random\" or \"timestamp\")")]
pub struct UnknownIdStrategy(String);

impl FromStr for IdStrategy {
    type Err = UnknownIdStrategy;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(Self::Random),
            "timestamp" => Ok(Self::Timestamp),
            other => Err(UnknownIdStrategy(other.to_owned())),
        }
    }
}
