use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    extract::{Multipart, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use shared::{
    domain::DocId,
    protocol::{AskRequest, AskResponse, UploadResponse},
};
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};
use url::Url;

use crate::backend::{BackendError, DocumentFile, QaBackend};

type Reply<T> = oneshot::Receiver<Result<T, BackendError>>;
pub(crate) type ReplySender<T> = oneshot::Sender<Result<T, BackendError>>;

/// Scripted backend. Each call consumes the next queued reply; deferred
/// replies let a test decide when (and in which order) calls resolve.
#[derive(Default)]
pub(crate) struct FakeBackend {
    upload_replies: Mutex<VecDeque<Reply<UploadResponse>>>,
    ask_replies: Mutex<VecDeque<Reply<AskResponse>>>,
    uploaded: Mutex<Vec<String>>,
    asked: Mutex<Vec<AskRequest>>,
    upload_calls: AtomicUsize,
    ask_calls: AtomicUsize,
}

impl FakeBackend {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) async fn push_upload(&self, reply: Result<UploadResponse, BackendError>) {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(reply);
        self.upload_replies.lock().await.push_back(rx);
    }

    pub(crate) async fn defer_upload(&self) -> ReplySender<UploadResponse> {
        let (tx, rx) = oneshot::channel();
        self.upload_replies.lock().await.push_back(rx);
        tx
    }

    pub(crate) async fn push_ask(&self, reply: Result<AskResponse, BackendError>) {
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(reply);
        self.ask_replies.lock().await.push_back(rx);
    }

    pub(crate) async fn defer_ask(&self) -> ReplySender<AskResponse> {
        let (tx, rx) = oneshot::channel();
        self.ask_replies.lock().await.push_back(rx);
        tx
    }

    pub(crate) fn upload_calls(&self) -> usize {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn ask_calls(&self) -> usize {
        self.ask_calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().await.clone()
    }

    pub(crate) async fn asked(&self) -> Vec<AskRequest> {
        self.asked.lock().await.clone()
    }
}

async fn await_reply<T>(reply: Option<Reply<T>>) -> Result<T, BackendError> {
    match reply {
        Some(rx) => rx
            .await
            .unwrap_or_else(|_| Err(BackendError::Transport("reply dropped".into()))),
        None => Err(BackendError::Transport("no scripted reply".into())),
    }
}

#[async_trait]
impl QaBackend for FakeBackend {
    async fn upload_document(&self, file: DocumentFile) -> Result<UploadResponse, BackendError> {
        self.uploaded.lock().await.push(file.filename);
        let reply = self.upload_replies.lock().await.pop_front();
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        await_reply(reply).await
    }

    async fn ask(&self, request: AskRequest) -> Result<AskResponse, BackendError> {
        self.asked.lock().await.push(request);
        let reply = self.ask_replies.lock().await.pop_front();
        self.ask_calls.fetch_add(1, Ordering::SeqCst);
        await_reply(reply).await
    }
}

pub(crate) fn pdf(name: &str) -> DocumentFile {
    DocumentFile::new(name, b"%PDF-1.4 test".to_vec())
}

pub(crate) fn upload_response(doc_id: &str, filename: &str) -> UploadResponse {
    UploadResponse {
        doc_id: DocId::from(doc_id),
        filename: filename.to_string(),
        uploadcare_url: format!("https://x/{doc_id}"),
        upload_time: "2024-01-01T00:00:00Z".to_string(),
    }
}

pub(crate) fn answer(text: &str) -> AskResponse {
    AskResponse {
        answer: text.to_string(),
        doc_id: None,
        question: None,
    }
}

pub(crate) fn server_error() -> BackendError {
    BackendError::Status {
        status: 500,
        reason: "Internal Server Error".to_string(),
        detail: None,
    }
}

pub(crate) async fn wait_until(cond: impl Fn() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached in time");
}

#[derive(Debug, Clone)]
pub(crate) struct MockReply {
    status: StatusCode,
    body: String,
}

impl MockReply {
    pub(crate) fn json(status: StatusCode, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub(crate) fn raw(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn respond(&self) -> impl IntoResponse {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body.clone(),
        )
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ReceivedUpload {
    pub field: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Clone)]
struct MockState {
    upload_reply: MockReply,
    ask_reply: MockReply,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    asks: Arc<Mutex<Vec<serde_json::Value>>>,
}

pub(crate) struct MockBackend {
    pub base_url: Url,
    uploads: Arc<Mutex<Vec<ReceivedUpload>>>,
    asks: Arc<Mutex<Vec<serde_json::Value>>>,
}

impl MockBackend {
    pub(crate) async fn uploads(&self) -> Vec<ReceivedUpload> {
        self.uploads.lock().await.clone()
    }

    pub(crate) async fn asks(&self) -> Vec<serde_json::Value> {
        self.asks.lock().await.clone()
    }
}

async fn handle_upload(
    State(state): State<MockState>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    while let Ok(Some(field)) = multipart.next_field().await {
        let field_name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
        state.uploads.lock().await.push(ReceivedUpload {
            field: field_name,
            filename,
            content_type,
            bytes,
        });
    }
    state.upload_reply.respond()
}

async fn handle_ask(
    State(state): State<MockState>,
    Json(payload): Json<serde_json::Value>,
) -> impl IntoResponse {
    state.asks.lock().await.push(payload);
    state.ask_reply.respond()
}

pub(crate) async fn spawn_mock_backend(
    upload_reply: MockReply,
    ask_reply: MockReply,
) -> anyhow::Result<MockBackend> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = MockState {
        upload_reply,
        ask_reply,
        uploads: Arc::new(Mutex::new(Vec::new())),
        asks: Arc::new(Mutex::new(Vec::new())),
    };
    let backend = MockBackend {
        base_url: Url::parse(&format!("http://{addr}/"))?,
        uploads: Arc::clone(&state.uploads),
        asks: Arc::clone(&state.asks),
    };
    let app = Router::new()
        .route("/upload/", post(handle_upload))
        .route("/ask/", post(handle_ask))
        .with_state(state);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(backend)
}
