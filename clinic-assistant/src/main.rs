use clap::Parser;
use clinic_assistant::{build_assistant, AssistantResult, InboundTurn};
use colored::*;
use config_engine::ConfigEngine;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;

/// Interactive clinic assistant
#[derive(Parser, Debug)]
#[command(name = "clinic-assistant")]
#[command(about = "Chat with the clinic assistant from the terminal")]
struct Args {
    /// Configuration file (YAML, TOML or JSON)
    #[arg(short, long, env = "CLINIC_CONFIG")]
    config: Option<PathBuf>,

    /// Caller identifier used for the session
    #[arg(long, default_value = "terminal")]
    caller: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> AssistantResult<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut engine = ConfigEngine::new();
    if let Some(path) = &args.config {
        engine = engine.with_file(path);
    }
    let mut config = engine.load()?;
    if args.verbose {
        config.logging.log_level = "debug".to_string();
    }
    logger_redacted::init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        storage = ?config.storage.kind,
        responder = ?config.responder.kind,
        "Starting clinic assistant"
    );
    let assistant = build_assistant(&config).await?;

    println!("{}", "Clinic assistant. Type a message, /doc <file> to upload a referral, /quit to exit.".bright_cyan());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    let mut session_id: Option<String> = None;

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line == "/quit" {
            break;
        }

        let mut turn = InboundTurn::new(args.caller.as_str(), line);
        if let Some(path) = line.strip_prefix("/doc ") {
            match tokio::fs::read(path.trim()).await {
                Ok(bytes) => turn = InboundTurn::new(args.caller.as_str(), "").with_document(bytes),
                Err(e) => {
                    println!("{}", format!("Cannot read {}: {e}", path.trim()).bright_red());
                    continue;
                }
            }
        }
        if let Some(id) = &session_id {
            turn = turn.with_session_id(id.as_str());
        }

        let reply = assistant.handle_turn(turn).await;
        if !reply.session_id.is_empty() {
            session_id = Some(reply.session_id);
        }
        println!("{}\n", reply.reply_text.bright_white());
    }

    info!("Clinic assistant stopped");
    Ok(())
}
