use std::{path::PathBuf, sync::Arc};

use anyhow::Result;
use clap::Parser;
use client_core::{
    load_settings, ClientEvent, DocQaClient, DocumentFile, KeyOutcome, KeyPress, Submission,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod commands;
mod view;

use commands::{parse_command, Command, HELP};
use view::{describe_document, render_event, render_message};

#[derive(Parser, Debug)]
#[command(name = "docqa", about = "Ask questions about a PDF through a Q&A backend")]
struct Args {
    /// Backend base URL; takes precedence over docqa.toml and the environment.
    #[arg(long)]
    base_url: Option<String>,
    /// PDF to upload before the prompt opens.
    #[arg(long)]
    upload: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(raw) = &args.base_url {
        settings = settings.with_base_url(raw)?;
    }
    info!(base_url = %settings.base_url, "docqa: starting");

    let client = Arc::new(DocQaClient::new(&settings)?);
    let renderer = tokio::spawn(print_events(client.subscribe_events()));

    if let Some(path) = args.upload {
        begin_upload(&client, path);
    }
    println!("{HELP}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match parse_command(&line) {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Invalid(reason) => println!("! {reason}"),
            Command::Upload(path) => begin_upload(&client, path),
            Command::New => {
                client.uploads.reset();
                println!("Document cleared.");
            }
            Command::Doc => println!("{}", describe_document(&client.store.snapshot())),
            Command::Rename(name) => {
                if !client.uploads.rename_document(name) {
                    println!("No document uploaded.");
                }
            }
            Command::History => {
                for message in client.conversation.transcript().await {
                    println!("{}", render_message(&message));
                }
            }
            Command::Input { text, continued } => {
                feed_input(&client, &text, continued).await;
            }
        }
    }

    renderer.abort();
    Ok(())
}

/// Types `text` into the input buffer and presses Enter. A pending ask is
/// completed on its own task so the prompt stays usable.
async fn feed_input(client: &Arc<DocQaClient>, text: &str, continued: bool) {
    for c in text.chars() {
        client.conversation.handle_key(KeyPress::Char(c)).await;
    }
    let outcome = client
        .conversation
        .handle_key(KeyPress::Enter {
            modified: continued,
        })
        .await;
    if let KeyOutcome::Submitted(Submission::Pending(pending)) = outcome {
        let conversation = Arc::clone(&client.conversation);
        tokio::spawn(async move {
            conversation.complete(pending).await;
        });
    }
}

fn begin_upload(client: &Arc<DocQaClient>, path: PathBuf) {
    if client.uploads.is_uploading() {
        println!("! An upload is already in progress.");
        return;
    }
    client.uploads.reset();

    let uploads = Arc::clone(&client.uploads);
    tokio::spawn(async move {
        match DocumentFile::read(&path).await {
            Ok(file) => {
                uploads.start_upload(file).await;
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "docqa: could not read file");
                println!("! Error uploading file: {err}");
            }
        }
    });
}

async fn print_events(mut events: broadcast::Receiver<ClientEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(text) = render_event(&event) {
                    println!("{text}");
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "docqa: event stream lagged");
            }
            Err(RecvError::Closed) => break,
        }
    }
}
