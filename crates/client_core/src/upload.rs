//! Upload lifecycle: one attempt per file selection, tagged with a generation
//! so that a late resolution cannot overwrite a newer document.

use std::sync::{
    atomic::{AtomicU64, AtomicUsize, Ordering},
    Arc,
};

use shared::{domain::MetadataPatch, protocol::UploadResponse};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::{
    backend::{BackendError, DocumentFile, QaBackend},
    session_store::SessionStore,
    ClientEvent,
};

#[derive(Debug, Clone, Error)]
pub enum UploadError {
    #[error("Please select a PDF file")]
    NotPdf { filename: String },
    #[error("Error uploading file: {}", upload_failure_reason(.0))]
    Backend(BackendError),
}

fn upload_failure_reason(err: &BackendError) -> String {
    match err {
        BackendError::Status { reason, .. } => format!("Upload failed: {reason}"),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub enum UploadOutcome {
    Stored(UploadResponse),
    Rejected(UploadError),
    Failed(UploadError),
    /// A newer attempt or a reset happened while this one was in flight; its
    /// result was dropped.
    Superseded,
}

pub struct UploadController {
    backend: Arc<dyn QaBackend>,
    store: Arc<SessionStore>,
    events: broadcast::Sender<ClientEvent>,
    generation: AtomicU64,
    in_flight: AtomicUsize,
    selected_file: Mutex<Option<String>>,
}

impl UploadController {
    pub fn new(
        backend: Arc<dyn QaBackend>,
        store: Arc<SessionStore>,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
            selected_file: Mutex::new(None),
        }
    }

    /// Advisory only; a second upload is not blocked while this is true.
    pub fn is_uploading(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst) > 0
    }

    pub async fn selected_file(&self) -> Option<String> {
        self.selected_file.lock().await.clone()
    }

    /// Drops the active document ahead of a new file selection. Any attempt
    /// still in flight becomes stale.
    pub fn reset(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        info!(generation, "upload: reset");
        self.store.clear();
    }

    pub fn rename_document(&self, filename: impl Into<String>) -> bool {
        self.patch_document(MetadataPatch::filename(filename))
    }

    pub fn patch_document(&self, patch: MetadataPatch) -> bool {
        self.store.update(patch)
    }

    pub async fn start_upload(&self, file: DocumentFile) -> UploadOutcome {
        if !file.is_pdf() {
            let err = UploadError::NotPdf {
                filename: file.filename,
            };
            warn!(error = %err, "upload: rejected file selection");
            let _ = self.events.send(ClientEvent::UploadRejected(err.to_string()));
            return UploadOutcome::Rejected(err);
        }

        let attempt = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.store.clear();
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            let _ = self
                .events
                .send(ClientEvent::UploadStateChanged { uploading: true });
        }
        *self.selected_file.lock().await = Some(file.filename.clone());
        info!(
            attempt,
            filename = %file.filename,
            size_bytes = file.bytes.len(),
            "upload: started"
        );

        let result = self.backend.upload_document(file).await;

        let current = self.generation.load(Ordering::SeqCst) == attempt;
        let outcome = if !current {
            warn!(attempt, "upload: discarding stale resolution");
            UploadOutcome::Superseded
        } else {
            match result {
                Ok(response) => {
                    self.store.set(
                        response.doc_id.clone(),
                        response.filename.clone(),
                        response.uploadcare_url.clone(),
                        response.upload_time.clone(),
                    );
                    info!(attempt, doc_id = %response.doc_id, "upload: stored");
                    let _ = self.events.send(ClientEvent::UploadSucceeded {
                        doc_id: response.doc_id.clone(),
                        filename: response.filename.clone(),
                    });
                    UploadOutcome::Stored(response)
                }
                Err(err) => {
                    let err = UploadError::Backend(err);
                    warn!(attempt, error = %err, "upload: failed");
                    let _ = self.events.send(ClientEvent::UploadFailed(err.to_string()));
                    UploadOutcome::Failed(err)
                }
            }
        };

        self.finish_attempt(current).await;
        outcome
    }

    async fn finish_attempt(&self, current: bool) {
        let remaining = self.in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
        if remaining == 0 {
            let _ = self
                .events
                .send(ClientEvent::UploadStateChanged { uploading: false });
        }
        if current || remaining == 0 {
            self.selected_file.lock().await.take();
            let _ = self.events.send(ClientEvent::FileSelectionReset);
        }
    }
}

#[cfg(test)]
#[path = "tests/upload_tests.rs"]
mod tests;
