use client_core::{ClientEvent, DocumentState};
use shared::domain::{Message, Sender};

const SYSTEM_PREFIX: &str = "bot> ";
const USER_PREFIX: &str = "you> ";

/// Text to print for a client event, if any. User messages are not echoed
/// since the terminal already shows what was typed.
pub fn render_event(event: &ClientEvent) -> Option<String> {
    match event {
        ClientEvent::UploadStateChanged { uploading: true } => Some("Uploading...".to_string()),
        ClientEvent::UploadStateChanged { uploading: false } => None,
        ClientEvent::UploadRejected(reason) | ClientEvent::UploadFailed(reason) => {
            Some(format!("! {reason}"))
        }
        ClientEvent::UploadSucceeded { doc_id, filename } => {
            Some(format!("Uploaded {filename} (id {doc_id}). Ask away."))
        }
        ClientEvent::FileSelectionReset => None,
        ClientEvent::TranscriptAppended { message, .. } => match message.sender {
            Sender::System => Some(render_message(message)),
            Sender::User => None,
        },
    }
}

pub fn render_message(message: &Message) -> String {
    let prefix = match message.sender {
        Sender::User => USER_PREFIX,
        Sender::System => SYSTEM_PREFIX,
    };
    let indent = " ".repeat(prefix.len());
    let mut out = String::new();
    for (i, line) in message.text.lines().enumerate() {
        if i == 0 {
            out.push_str(prefix);
        } else {
            out.push('\n');
            out.push_str(&indent);
        }
        out.push_str(line);
    }
    if out.is_empty() {
        out.push_str(prefix.trim_end());
    }
    out
}

pub fn describe_document(state: &DocumentState) -> String {
    let (Some(doc_id), Some(metadata)) = (&state.doc_id, &state.metadata) else {
        return "No document uploaded.".to_string();
    };

    let mut out = format!(
        "{} (id {doc_id})",
        metadata.filename.as_deref().unwrap_or("<unnamed>")
    );
    if let Some(url) = &metadata.source_url {
        out.push_str(&format!("\n  link: {url}"));
    }
    match (metadata.uploaded_at(), &metadata.upload_timestamp) {
        (Some(at), _) => out.push_str(&format!(
            "\n  uploaded: {}",
            at.format("%Y-%m-%d %H:%M UTC")
        )),
        (None, Some(raw)) => out.push_str(&format!("\n  uploaded: {raw}")),
        (None, None) => {}
    }
    out
}
