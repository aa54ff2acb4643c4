//! ponder: run thinking commands against a note database.
//!
//! Results are printed to stdout as JSON; logs go to stderr or `LOG_FILE`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use uuid::Uuid;

use ponder_core::defaults;
use ponder_db::Database;
use ponder_inference::{build_synthesizer, SynthesizerConfig};
use ponder_thinking::{
    ResolvePolicy, ResolveRequest, SaveAs, SessionResolver, ThinkingCommand, ThinkingConfig,
    ThinkingEngine,
};

#[derive(Parser)]
#[command(name = "ponder")]
#[command(author, version, about = "Contextual thinking commands over your notes")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain the notes most related to a note
    Connect(NoteArgs),

    /// Find a note that challenges a note
    Contrast(NoteArgs),

    /// Merge a note with a related one into a new concept
    Combine(NoteArgs),

    /// Suggest concepts bridging a note and a distant one
    Bridge(NoteArgs),

    /// Save a thinking result as a permanent note
    Save {
        /// Session returned by a thinking command
        session_id: Uuid,

        /// Note id of the result to save
        result_note_id: Uuid,

        /// Title of the new note
        #[arg(short, long)]
        title: Option<String>,

        /// File with edited content replacing the draft
        #[arg(short, long)]
        content_file: Option<PathBuf>,

        /// Refuse sessions past their expiry
        #[arg(long)]
        reject_expired: bool,
    },

    /// Delete expired thinking sessions
    PurgeSessions,
}

#[derive(clap::Args)]
struct NoteArgs {
    /// Origin note id
    note_id: Uuid,

    /// Recently viewed note ids, most recent first (repeatable)
    #[arg(short, long = "recent")]
    recent: Vec<Uuid>,
}

impl Commands {
    fn thinking(&self) -> Option<(ThinkingCommand, &NoteArgs)> {
        match self {
            Commands::Connect(args) => Some((ThinkingCommand::Connect, args)),
            Commands::Contrast(args) => Some((ThinkingCommand::Contrast, args)),
            Commands::Combine(args) => Some((ThinkingCommand::Combine, args)),
            Commands::Bridge(args) => Some((ThinkingCommand::Bridge, args)),
            _ => None,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_tracing();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

/// Configure logging.
///
/// Environment variables:
///   LOG_FORMAT  - "json" or "text" (default: "text")
///   LOG_FILE    - path to log file (optional, enables file logging)
///   LOG_ANSI    - "true"/"false" override ANSI colors
///   RUST_LOG    - standard env filter (default: "ponder=info,ponder_thinking=info")
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let log_file = std::env::var("LOG_FILE").ok();
    let log_ansi = std::env::var("LOG_ANSI")
        .ok()
        .map(|v| v == "true" || v == "1");

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ponder=info,ponder_thinking=info".into());

    let registry = tracing_subscriber::registry().with(env_filter);

    let guard = if let Some(ref path) = log_file {
        let file_dir = std::path::Path::new(path)
            .parent()
            .unwrap_or(std::path::Path::new("."));
        let file_name = std::path::Path::new(path)
            .file_name()
            .and_then(|f| f.to_str())
            .unwrap_or("ponder.log");
        let file_appender = tracing_appender::rolling::daily(file_dir, file_name);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(non_blocking),
                )
                .init();
        } else {
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(log_ansi.unwrap_or(false));
            registry.with(layer).init();
        }
        Some(guard)
    } else {
        // stdout carries the JSON results
        if log_format == "json" {
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_writer(std::io::stderr),
                )
                .init();
        } else {
            let mut layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
            if let Some(ansi) = log_ansi {
                layer = layer.with_ansi(ansi);
            }
            registry.with(layer).init();
        }
        None
    };

    info!(
        log_format = %log_format,
        log_file = log_file.as_deref().unwrap_or("(stderr)"),
        "Logging initialized"
    );
    guard
}

async fn connect_database() -> anyhow::Result<Database> {
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| defaults::DATABASE_URL.to_string());
    let db = Database::connect(&database_url)
        .await
        .context("Failed to connect to database")?;
    db.migrate().await.context("Failed to run migrations")?;
    Ok(db)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let db = connect_database().await?;

    if let Some((command, args)) = cli.command.thinking() {
        let synthesizer = build_synthesizer(&SynthesizerConfig::from_env());
        let engine = ThinkingEngine::new(
            Arc::new(db.context.clone()),
            Arc::new(db.sessions.clone()),
            synthesizer,
            ThinkingConfig::from_env(),
        );
        let response = engine.run(command, args.note_id, &args.recent).await?;
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match cli.command {
        Commands::Save {
            session_id,
            result_note_id,
            title,
            content_file,
            reject_expired,
        } => {
            let user_content = match content_file {
                Some(path) => Some(
                    std::fs::read_to_string(&path)
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None => None,
            };
            let resolver = SessionResolver::new(
                Arc::new(db.sessions.clone()),
                Arc::new(db.context.clone()),
                Arc::new(db.notes.clone()),
            )
            .with_policy(ResolvePolicy { reject_expired });
            let response = resolver
                .resolve(ResolveRequest {
                    session_id,
                    result_note_id,
                    save_as: SaveAs::NewNote,
                    user_content,
                    result_title: title,
                })
                .await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Commands::PurgeSessions => {
            let engine_sessions = ponder_thinking::SessionStore::new(Arc::new(db.sessions.clone()));
            let deleted = engine_sessions.purge_expired().await?;
            println!("{}", serde_json::json!({ "deleted": deleted }));
        }
        Commands::Connect(_) | Commands::Contrast(_) | Commands::Combine(_) | Commands::Bridge(_) => {}
    }
    Ok(())
}
