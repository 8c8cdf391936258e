use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque identifier the backend assigns to an uploaded document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocId(pub String);

impl DocId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Descriptive fields of the active document. Fields are optional because a
/// partial update may populate one of them before its siblings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub filename: Option<String>,
    pub source_url: Option<String>,
    pub upload_timestamp: Option<String>,
}

impl DocumentMetadata {
    /// Parses `upload_timestamp`. The backend emits naive UTC ISO-8601 values,
    /// so offset-less timestamps are read as UTC.
    pub fn uploaded_at(&self) -> Option<DateTime<Utc>> {
        let raw = self.upload_timestamp.as_deref()?.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }
}

/// Field-wise patch applied by `SessionStore::update`. `None` leaves the
/// existing value untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetadataPatch {
    pub filename: Option<String>,
    pub source_url: Option<String>,
    pub upload_timestamp: Option<String>,
}

impl MetadataPatch {
    pub fn filename(value: impl Into<String>) -> Self {
        Self {
            filename: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filename.is_none() && self.source_url.is_none() && self.upload_timestamp.is_none()
    }

    pub fn apply_to(self, metadata: &mut DocumentMetadata) {
        if let Some(v) = self.filename {
            metadata.filename = Some(v);
        }
        if let Some(v) = self.source_url {
            metadata.source_url = Some(v);
        }
        if let Some(v) = self.upload_timestamp {
            metadata.upload_timestamp = Some(v);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::User,
            text: text.into(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            sender: Sender::System,
            text: text.into(),
        }
    }
}
