//! Backend seam: the two request/response contracts and their HTTP transport.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client, Response,
};
use shared::{
    error::BackendErrorBody,
    protocol::{
        AskRequest, AskResponse, UploadResponse, ASK_PATH, PDF_MIME_TYPE, UPLOAD_FIELD,
        UPLOAD_PATH,
    },
};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Non-success HTTP status; `reason` is the canonical reason phrase.
    #[error("{reason}")]
    Status {
        status: u16,
        reason: String,
        detail: Option<String>,
    },
    #[error("{0}")]
    Transport(String),
    #[error("malformed response: {0}")]
    Decode(String),
    #[error("invalid endpoint url: {0}")]
    Endpoint(String),
}

impl BackendError {
    fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// A user-selected file, held in memory for the duration of one upload attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl DocumentFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    pub async fn read(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("'{}' does not name a file", path.display()),
                )
            })?;
        let bytes = tokio::fs::read(path).await?;
        Ok(Self { filename, bytes })
    }

    pub fn is_pdf(&self) -> bool {
        has_pdf_extension(&self.filename)
    }
}

pub fn has_pdf_extension(filename: &str) -> bool {
    filename.to_ascii_lowercase().ends_with(".pdf")
}

#[async_trait]
pub trait QaBackend: Send + Sync {
    async fn upload_document(&self, file: DocumentFile) -> Result<UploadResponse, BackendError>;
    async fn ask(&self, request: AskRequest) -> Result<AskResponse, BackendError>;
}

pub struct HttpBackend {
    http: Client,
    upload_url: Url,
    ask_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: &Url) -> Result<Self, BackendError> {
        let mut base = base_url.clone();
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let upload_url = base
            .join(UPLOAD_PATH)
            .map_err(|err| BackendError::Endpoint(err.to_string()))?;
        let ask_url = base
            .join(ASK_PATH)
            .map_err(|err| BackendError::Endpoint(err.to_string()))?;
        Ok(Self {
            http: Client::new(),
            upload_url,
            ask_url,
        })
    }

    pub fn upload_url(&self) -> &Url {
        &self.upload_url
    }

    pub fn ask_url(&self) -> &Url {
        &self.ask_url
    }
}

async fn ensure_success(res: Response) -> Result<Response, BackendError> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    let detail = BackendErrorBody::parse(&body).map(|body| body.message());
    warn!(
        status = status.as_u16(),
        detail = detail.as_deref().unwrap_or(""),
        "backend: request rejected"
    );
    Err(BackendError::Status {
        status: status.as_u16(),
        reason: status
            .canonical_reason()
            .unwrap_or("Unknown status")
            .to_string(),
        detail,
    })
}

#[async_trait]
impl QaBackend for HttpBackend {
    async fn upload_document(&self, file: DocumentFile) -> Result<UploadResponse, BackendError> {
        debug!(
            url = %self.upload_url,
            filename = %file.filename,
            size_bytes = file.bytes.len(),
            "backend: uploading document"
        );
        let part = Part::bytes(file.bytes)
            .file_name(file.filename)
            .mime_str(PDF_MIME_TYPE)
            .map_err(BackendError::from_reqwest)?;
        let form = Form::new().part(UPLOAD_FIELD, part);

        let res = self
            .http
            .post(self.upload_url.clone())
            .multipart(form)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;
        ensure_success(res)
            .await?
            .json()
            .await
            .map_err(BackendError::from_reqwest)
    }

    async fn ask(&self, request: AskRequest) -> Result<AskResponse, BackendError> {
        debug!(url = %self.ask_url, doc_id = %request.doc_id, "backend: asking question");
        let res = self
            .http
            .post(self.ask_url.clone())
            .json(&request)
            .send()
            .await
            .map_err(BackendError::from_reqwest)?;
        ensure_success(res)
            .await?
            .json()
            .await
            .map_err(BackendError::from_reqwest)
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
