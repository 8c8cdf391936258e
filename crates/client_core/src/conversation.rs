//! Transcript and the question/answer exchange.
//!
//! A submission is split at its only suspension point: `begin_submit` appends
//! the user message and decides whether a request is needed, `complete` waits
//! for the backend and appends the system reply. Callers that run `complete`
//! on separate tasks keep user messages in submission order while replies land
//! in resolution order.

use std::sync::Arc;

use shared::{domain::Message, protocol::AskRequest};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::{backend::QaBackend, session_store::SessionStore, ClientEvent};

pub const NO_DOCUMENT_ADVISORY: &str = "Please upload a PDF first.";
pub const ERROR_PREFIX: &str = "Error:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPress {
    Char(char),
    Backspace,
    /// `modified` is true when Shift (or another modifier) is held.
    Enter { modified: bool },
}

#[derive(Debug)]
pub enum KeyOutcome {
    Edited,
    Submitted(Submission),
}

/// Request prepared by `begin_submit`, awaiting its network round trip.
#[derive(Debug)]
pub struct PendingAsk {
    request: AskRequest,
}

impl PendingAsk {
    pub fn question(&self) -> &str {
        &self.request.question
    }
}

#[derive(Debug)]
pub enum Submission {
    /// Input was empty after trimming; nothing happened.
    Ignored,
    /// No active document; the advisory was appended.
    NoDocument,
    Pending(PendingAsk),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Ignored,
    NoDocument,
    Answered,
    Failed,
}

pub struct ConversationController {
    backend: Arc<dyn QaBackend>,
    store: Arc<SessionStore>,
    events: broadcast::Sender<ClientEvent>,
    transcript: Mutex<Vec<Message>>,
    input: Mutex<String>,
}

impl ConversationController {
    pub fn new(
        backend: Arc<dyn QaBackend>,
        store: Arc<SessionStore>,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            backend,
            store,
            events,
            transcript: Mutex::new(Vec::new()),
            input: Mutex::new(String::new()),
        }
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.transcript.lock().await.clone()
    }

    pub async fn transcript_len(&self) -> usize {
        self.transcript.lock().await.len()
    }

    pub async fn input(&self) -> String {
        self.input.lock().await.clone()
    }

    pub async fn set_input(&self, text: impl Into<String>) {
        *self.input.lock().await = text.into();
    }

    pub async fn handle_key(&self, key: KeyPress) -> KeyOutcome {
        match key {
            KeyPress::Char(c) => {
                self.input.lock().await.push(c);
                KeyOutcome::Edited
            }
            KeyPress::Backspace => {
                self.input.lock().await.pop();
                KeyOutcome::Edited
            }
            KeyPress::Enter { modified: true } => {
                self.input.lock().await.push('\n');
                KeyOutcome::Edited
            }
            KeyPress::Enter { modified: false } => {
                let text = self.input().await;
                KeyOutcome::Submitted(self.begin_submit(&text).await)
            }
        }
    }

    pub async fn submit(&self, question_text: &str) -> SubmitOutcome {
        match self.begin_submit(question_text).await {
            Submission::Ignored => SubmitOutcome::Ignored,
            Submission::NoDocument => SubmitOutcome::NoDocument,
            Submission::Pending(pending) => self.complete(pending).await,
        }
    }

    /// Runs everything a submission does before touching the network.
    pub async fn begin_submit(&self, question_text: &str) -> Submission {
        let question = question_text.trim();
        if question.is_empty() {
            debug!("conversation: ignoring empty submission");
            return Submission::Ignored;
        }

        self.append(Message::user(question)).await;
        self.input.lock().await.clear();

        let Some(doc_id) = self.store.doc_id() else {
            info!("conversation: no active document; skipping ask");
            self.append(Message::system(NO_DOCUMENT_ADVISORY)).await;
            return Submission::NoDocument;
        };

        Submission::Pending(PendingAsk {
            request: AskRequest {
                doc_id,
                question: question.to_string(),
            },
        })
    }

    pub async fn complete(&self, pending: PendingAsk) -> SubmitOutcome {
        let doc_id = pending.request.doc_id.clone();
        match self.backend.ask(pending.request).await {
            Ok(response) => {
                info!(doc_id = %doc_id, "conversation: answer received");
                self.append(Message::system(response.answer.trim())).await;
                SubmitOutcome::Answered
            }
            Err(err) => {
                warn!(doc_id = %doc_id, error = %err, "conversation: ask failed");
                self.append(Message::system(format!("{ERROR_PREFIX} {err}")))
                    .await;
                SubmitOutcome::Failed
            }
        }
    }

    async fn append(&self, message: Message) {
        let mut transcript = self.transcript.lock().await;
        transcript.push(message.clone());
        let index = transcript.len() - 1;
        let _ = self
            .events
            .send(ClientEvent::TranscriptAppended { index, message });
    }
}

#[cfg(test)]
#[path = "tests/conversation_tests.rs"]
mod tests;
