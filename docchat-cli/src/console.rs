//! Interactive read-eval-print loop over a [`ChatSession`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use docchat_rag::{ChatSession, Document};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::error;

const HELP: &str = "\
Type a question to ask about the loaded document.

Commands:
  /load <path>   index a new document (clears the conversation)
  /reset         clear the conversation, keep the document
  /history       show the conversation so far
  /help          show this help
  /quit          exit";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Load(PathBuf),
    Reset,
    History,
    Help,
    Quit,
    Nothing,
}

/// Interpret a line of input.
///
/// Lines starting with `/` are commands; anything else is a question.
pub fn parse_command(line: &str) -> std::result::Result<Command, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(Command::Nothing);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(Command::Ask(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "load" if arg.is_empty() => Err("usage: /load <path>".to_string()),
        "load" => Ok(Command::Load(PathBuf::from(arg))),
        "reset" => Ok(Command::Reset),
        "history" => Ok(Command::History),
        "help" | "?" => Ok(Command::Help),
        "quit" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command /{other} (try /help)")),
    }
}

/// Read a UTF-8 text file as a [`Document`].
pub fn load_document(path: &Path) -> Result<Document> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    Ok(Document::new(text).with_source(path.display().to_string()))
}

/// Index the file at `path` into `session` and report the outcome.
pub async fn upload_file(session: &mut ChatSession, path: &Path) -> Result<()> {
    let document = load_document(path)?;
    let report = session.upload(&document).await?;
    println!("Indexed {} ({} chunks).", path.display(), report.chunk_count);
    Ok(())
}

/// Ask one question and print the answer.
///
/// Recoverable failures are printed and swallowed so the caller can keep
/// going; only configuration errors are returned.
pub async fn ask(session: &mut ChatSession, question: &str) -> Result<()> {
    match session.ask(question).await {
        Ok(answer) => {
            println!("\n{}\n", answer.content.trim());
            Ok(())
        }
        Err(e) if e.is_recoverable() => {
            error!(error = %e, "question failed");
            println!("Error: {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Ask a single question outside the console and print the answer.
///
/// Every failure is returned so the process exits non-zero.
pub async fn ask_once(session: &mut ChatSession, question: &str) -> Result<()> {
    let answer = session.ask(question).await.context("question failed")?;
    println!("{}", answer.content.trim());
    Ok(())
}

fn print_history(session: &ChatSession) {
    for message in session.history() {
        println!("[{}] {}", message.role, message.content);
    }
}

/// Run the console until `/quit`, Ctrl-D or Ctrl-C.
pub async fn run_console(session: &mut ChatSession) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    println!("Type /help for commands.\n");

    loop {
        let line = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }

        match parse_command(&line) {
            Ok(Command::Ask(question)) => ask(session, &question).await?,
            Ok(Command::Load(path)) => {
                if let Err(e) = upload_file(session, &path).await {
                    println!("Error: {e:#}");
                }
            }
            Ok(Command::Reset) => {
                session.reset_conversation();
                println!("Conversation cleared.");
            }
            Ok(Command::History) => print_history(session),
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Ok(Command::Nothing) => {}
            Err(message) => println!("{message}"),
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docchat_model::{MockChatModel, ModelError};
    use docchat_rag::{HashingEmbedder, RagError};

    use super::*;

    #[test]
    fn plain_text_is_a_question() {
        assert_eq!(parse_command("  What color? "), Ok(Command::Ask("What color?".into())));
        assert_eq!(parse_command("   "), Ok(Command::Nothing));
    }

    #[test]
    fn slash_commands_parse() {
        assert_eq!(parse_command("/load notes.txt"), Ok(Command::Load("notes.txt".into())));
        assert_eq!(parse_command("/reset"), Ok(Command::Reset));
        assert_eq!(parse_command("/history"), Ok(Command::History));
        assert_eq!(parse_command("/exit"), Ok(Command::Quit));
        assert!(parse_command("/load").is_err());
        assert!(parse_command("/frobnicate").is_err());
    }

    #[tokio::test]
    async fn uploads_a_file_and_answers() {
        let path = std::env::temp_dir().join(format!("docchat-console-{}.txt", std::process::id()));
        std::fs::write(&path, "The sky is blue. Grass is green.").unwrap();

        let model = Arc::new(MockChatModel::replying("Blue"));
        let mut session = ChatSession::builder()
            .embedder(Arc::new(HashingEmbedder::new(64).unwrap()))
            .model(model.clone())
            .build()
            .unwrap();

        upload_file(&mut session, &path).await.unwrap();
        ask(&mut session, "What color is the sky?").await.unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(session.chunks().unwrap().len(), 1);
        assert_eq!(session.history().len(), 3);
        assert_eq!(model.call_count().await, 1);
    }

    #[tokio::test]
    async fn recoverable_errors_do_not_end_the_console() {
        let mut session = ChatSession::builder()
            .embedder(Arc::new(HashingEmbedder::new(64).unwrap()))
            .model(Arc::new(MockChatModel::replying("unused")))
            .build()
            .unwrap();

        // No document yet: NotReady is reported, not returned.
        assert!(ask(&mut session, "anything?").await.is_ok());
        assert!(load_document(Path::new("/definitely/not/here.txt")).is_err());
    }

    #[tokio::test]
    async fn one_shot_question_reports_failures() {
        let model = Arc::new(MockChatModel::replying("Blue"));
        let mut session = ChatSession::builder()
            .embedder(Arc::new(HashingEmbedder::new(64).unwrap()))
            .model(model.clone())
            .build()
            .unwrap();

        let err = ask_once(&mut session, "anything?").await.unwrap_err();
        assert!(matches!(err.downcast_ref::<RagError>(), Some(RagError::NotReady)));

        session.upload(&Document::new("The sky is blue.")).await.unwrap();
        let busy = ModelError::Api { provider: "mock".into(), status: 503, message: "busy".into() };
        model.push_error(busy).await;
        assert!(ask_once(&mut session, "What color is the sky?").await.is_err());

        ask_once(&mut session, "What color is the sky?").await.unwrap();
        assert_eq!(session.history().len(), 3);
    }
}
