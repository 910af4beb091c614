//! IP Blocker CLI
//!
//! Enable or disable the IP blocker from the command line.

use anyhow::{Context, Result};
use clap::Parser;
use ipblock_cli::{CliConfig, JsonFileConfigStore, Options, run};
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("ipblock_cli=warn".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Unknown options print the offending flags and exit non-zero
    let options = Options::parse();
    let config = CliConfig::from_env();

    let mut store = JsonFileConfigStore::open(&config.config_path)
        .with_context(|| format!("opening {}", config.config_path.display()))?;

    let stdout = std::io::stdout();
    let action = run(&options, &config.wwwroot, &mut store, &mut stdout.lock())?;
    tracing::debug!(?action, path = %store.path().display(), "Done");

    Ok(())
}
