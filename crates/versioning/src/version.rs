use boardspace_canvas::Scene;
use boardspace_common::VersionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A saved, immutable copy of the board plus its identity and label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardVersion {
    pub id: VersionId,
    pub label: String,
    /// Save time, written as `YYYY-MM-DDTHH:MM:SS.sssZ`.
    #[serde(with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub scene: Scene,
}

impl BoardVersion {
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id.clone(),
            label: self.label.clone(),
            timestamp: self.timestamp,
            elements: self.scene.element_count(),
            attachments: self.scene.attachment_count(),
        }
    }
}

/// Lightweight description of a version for listings.
#[derive(Debug, Clone, PartialEq)]
pub struct VersionSummary {
    pub id: VersionId,
    pub label: String,
    pub timestamp: DateTime<Utc>,
    pub elements: usize,
    pub attachments: usize,
}

impl fmt::Display for VersionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] saved={} elements={} attachments={}",
            self.label,
            self.id,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
            self.elements,
            self.attachments
        )
    }
}

mod iso_millis {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(at: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        DateTime::parse_from_rfc3339(&raw)
            .map(|at| at.with_timezone(&Utc))
            .map_err(D::Error::custom)
    }
}
