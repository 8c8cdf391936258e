//! Prompt line parsing. Slash-prefixed lines are commands; anything else is
//! question input.

use std::path::PathBuf;

pub const HELP: &str = "\
Commands:
  /upload <path>   upload a PDF (replaces the current document)
  /new             drop the current document
  /doc             show the current document
  /rename <name>   change the displayed filename
  /history         print the transcript
  /help            show this help
  /quit            exit
Anything else is sent as a question. End a line with '\\' to continue on the next line.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Upload(PathBuf),
    New,
    Doc,
    Rename(String),
    History,
    Help,
    Quit,
    /// Question text. `continued` means the line ended in a backslash, which
    /// acts as Shift+Enter.
    Input { text: String, continued: bool },
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim_end_matches(['\r', '\n']);
    let Some(rest) = line.trim_start().strip_prefix('/') else {
        return match line.strip_suffix('\\') {
            Some(text) => Command::Input {
                text: text.to_string(),
                continued: true,
            },
            None => Command::Input {
                text: line.to_string(),
                continued: false,
            },
        };
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    match name {
        "upload" if arg.is_empty() => Command::Invalid("usage: /upload <path>".into()),
        "upload" => Command::Upload(PathBuf::from(arg)),
        "new" => Command::New,
        "doc" => Command::Doc,
        "rename" if arg.is_empty() => Command::Invalid("usage: /rename <name>".into()),
        "rename" => Command::Rename(arg.to_string()),
        "history" => Command::History,
        "help" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => Command::Invalid(format!("unknown command '/{other}'; try /help")),
    }
}
