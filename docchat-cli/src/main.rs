use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use docchat_cli::console;
use docchat_cli::setup::{self, EmbedderKind};
use docchat_rag::Settings;
use docchat_telemetry::{LogFormat, init_telemetry};

#[derive(Parser, Debug)]
#[command(name = "docchat", version, about = "Chat with a text document")]
struct Cli {
    /// Text file to index at startup
    document: Option<PathBuf>,

    /// Embedding backend
    #[arg(long, value_enum)]
    embedder: Option<EmbedderKind>,

    /// Ask one question, print the answer and exit
    #[arg(short, long, requires = "document")]
    question: Option<String>,

    /// Log output format: text or json (defaults to DOCCHAT_LOG_FORMAT, then text)
    #[arg(long)]
    log_format: Option<LogFormat>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let log_format = match cli.log_format {
        Some(format) => format,
        None => match std::env::var("DOCCHAT_LOG_FORMAT") {
            Ok(raw) => raw.parse().map_err(anyhow::Error::msg)?,
            Err(_) => LogFormat::default(),
        },
    };
    init_telemetry(log_format).context("failed to install the log subscriber")?;

    let settings = Settings::from_env().context("invalid configuration")?;
    tracing::debug!(?settings, "settings loaded");

    let embedder_kind = cli.embedder.unwrap_or_else(EmbedderKind::preferred);
    let embedder = setup::build_embedder(embedder_kind, &settings)?;
    let model = setup::build_model(&settings)?;
    let mut session = setup::build_session(&settings, embedder, model)?;

    if let Some(path) = &cli.document {
        console::upload_file(&mut session, path).await?;
    }

    match cli.question {
        Some(question) => console::ask_once(&mut session, &question).await,
        None => {
            if cli.document.is_none() {
                println!("No document loaded yet; use /load <path>.");
            }
            console::run_console(&mut session).await
        }
    }
}
