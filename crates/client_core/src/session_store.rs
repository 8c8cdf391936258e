use shared::domain::{DocId, DocumentMetadata, MetadataPatch};
use tokio::sync::watch;
use tracing::{debug, info};

/// Identity of the active document, if any. `metadata` is never present
/// without `doc_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocumentState {
    pub doc_id: Option<DocId>,
    pub metadata: Option<DocumentMetadata>,
}

impl DocumentState {
    pub fn is_active(&self) -> bool {
        self.doc_id.is_some()
    }
}

/// Single source of truth for which document is active. Every mutation is one
/// observable transition on the underlying watch channel.
pub struct SessionStore {
    state: watch::Sender<DocumentState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        let (state, _) = watch::channel(DocumentState::default());
        Self { state }
    }

    pub fn snapshot(&self) -> DocumentState {
        self.state.borrow().clone()
    }

    pub fn doc_id(&self) -> Option<DocId> {
        self.state.borrow().doc_id.clone()
    }

    pub fn metadata(&self) -> Option<DocumentMetadata> {
        self.state.borrow().metadata.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<DocumentState> {
        self.state.subscribe()
    }

    pub fn clear(&self) {
        let changed = self.state.send_if_modified(|state| {
            let had_document = state.doc_id.is_some() || state.metadata.is_some();
            *state = DocumentState::default();
            had_document
        });
        if changed {
            info!("session: document cleared");
        }
    }

    pub fn set(
        &self,
        doc_id: DocId,
        filename: impl Into<String>,
        source_url: impl Into<String>,
        upload_timestamp: impl Into<String>,
    ) {
        info!(doc_id = %doc_id, "session: document set");
        self.state.send_replace(DocumentState {
            doc_id: Some(doc_id),
            metadata: Some(DocumentMetadata {
                filename: Some(filename.into()),
                source_url: Some(source_url.into()),
                upload_timestamp: Some(upload_timestamp.into()),
            }),
        });
    }

    /// Merges `patch` into the existing metadata. Returns false, and leaves the
    /// store untouched, when there is no metadata to merge into.
    pub fn update(&self, patch: MetadataPatch) -> bool {
        let applied = self.state.send_if_modified(|state| match state.metadata.as_mut() {
            Some(metadata) if !patch.is_empty() => {
                patch.apply_to(metadata);
                true
            }
            _ => false,
        });
        if !applied {
            debug!("session: metadata update ignored");
        }
        applied
    }
}

#[cfg(test)]
#[path = "tests/session_store_tests.rs"]
mod tests;
