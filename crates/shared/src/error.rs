use serde::{Deserialize, Serialize};

/// Error body returned by the backend on rejected requests, e.g.
/// `{"detail": "Only PDFs allowed"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendErrorBody {
    pub detail: serde_json::Value,
}

impl BackendErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    /// Human-readable detail. Validation failures arrive as a JSON array, so
    /// anything that isn't a string is rendered as compact JSON.
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}
