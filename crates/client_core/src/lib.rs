use std::sync::Arc;

use shared::domain::{DocId, Message};
use tokio::sync::broadcast;

pub mod backend;
pub mod config;
pub mod conversation;
pub mod session_store;
pub mod upload;

pub use backend::{BackendError, DocumentFile, HttpBackend, QaBackend};
pub use config::{load_settings, ClientSettings, ConfigError};
pub use conversation::{
    ConversationController, KeyOutcome, KeyPress, PendingAsk, SubmitOutcome, Submission,
    ERROR_PREFIX, NO_DOCUMENT_ADVISORY,
};
pub use session_store::{DocumentState, SessionStore};
pub use upload::{UploadController, UploadError, UploadOutcome};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Notifications for the presentation layer. Store transitions are observed
/// through `SessionStore::subscribe` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    UploadStateChanged { uploading: bool },
    UploadRejected(String),
    UploadSucceeded { doc_id: DocId, filename: String },
    UploadFailed(String),
    /// The file picker may offer the same file again.
    FileSelectionReset,
    /// A message was appended at `index`; views scroll to the latest entry.
    TranscriptAppended { index: usize, message: Message },
}

/// One chat session: a store shared by both controllers and a common event
/// channel.
pub struct DocQaClient {
    pub store: Arc<SessionStore>,
    pub uploads: Arc<UploadController>,
    pub conversation: Arc<ConversationController>,
    events: broadcast::Sender<ClientEvent>,
}

impl DocQaClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, BackendError> {
        let backend = HttpBackend::new(&settings.base_url)?;
        Ok(Self::with_backend(Arc::new(backend)))
    }

    pub fn with_backend(backend: Arc<dyn QaBackend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let store = Arc::new(SessionStore::new());
        let uploads = Arc::new(UploadController::new(
            Arc::clone(&backend),
            Arc::clone(&store),
            events.clone(),
        ));
        let conversation = Arc::new(ConversationController::new(
            backend,
            Arc::clone(&store),
            events.clone(),
        ));
        Self {
            store,
            uploads,
            conversation,
            events,
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
