//! # Session Admin CLI
//!
//! Inspect and invalidate sessions on the configured Redis servers.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use session_domain::SessionKey;
use session_store::{
    BackendDeps, ExecutionLimit, InMemoryRecords, SessionBackend, SessionConfig, build_backend,
    default_connector,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "session-admin")]
#[command(about = "Inspect and invalidate Redis-backed sessions", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the configured session servers
    Servers,

    /// Check whether any server holds a session
    Exists { sid: String },

    /// Delete one session from every server
    Kill { sid: String },

    /// Delete every session listed in a JSON-lines export of the session table
    KillAll {
        /// File with one `{"id": .., "sid": ..}` object per line
        #[arg(long)]
        records: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = SessionConfig::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut deps = BackendDeps::new(default_connector()?)
        .with_limit(ExecutionLimit::new(config.execution_time_limit));
    if let Command::KillAll { records } = &args.command {
        deps = deps.with_records(Arc::new(InMemoryRecords::from_json_lines(records).await?));
    }

    let (backend, settings) = build_backend(&config, deps)?;
    tracing::info!(
        version = session_store::VERSION,
        kind = backend.kind(),
        save_path = %settings.save_path,
        "Session backend ready"
    );

    let ok = match args.command {
        Command::Servers => {
            for server in backend.servers() {
                println!("{server} prefix={}", server.prefix);
            }
            true
        }
        Command::Exists { sid } => {
            let found = backend.exists(&SessionKey::new(sid)).await?;
            println!("{}", if found { "present" } else { "absent" });
            found
        }
        Command::Kill { sid } => backend.kill(&SessionKey::new(sid)).await?,
        Command::KillAll { .. } => backend.kill_all().await?,
    };

    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
