use serde::{Deserialize, Serialize};

use crate::domain::{DocId, DocumentMetadata};

pub const UPLOAD_PATH: &str = "upload/";
pub const ASK_PATH: &str = "ask/";
/// Multipart form field that carries the PDF bytes.
pub const UPLOAD_FIELD: &str = "file";
pub const PDF_MIME_TYPE: &str = "application/pdf";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub doc_id: DocId,
    pub filename: String,
    pub uploadcare_url: String,
    pub upload_time: String,
}

impl UploadResponse {
    pub fn metadata(&self) -> DocumentMetadata {
        DocumentMetadata {
            filename: Some(self.filename.clone()),
            source_url: Some(self.uploadcare_url.clone()),
            upload_timestamp: Some(self.upload_time.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskRequest {
    pub doc_id: DocId,
    pub question: String,
}

/// Answer body. The backend echoes `doc_id` and `question` alongside the
/// answer; those are accepted but unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc_id: Option<DocId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}
