//! # IP Blocker CLI
//!
//! Turns the IP blocker on or off and sets the message shown to blocked
//! users. With no option the current status is printed.

#![forbid(unsafe_code)]
#![warn(clippy::all)]

pub mod store;

use std::env;
use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use thiserror::Error;

pub use store::{ConfigStore, ConfigStoreError, JsonFileConfigStore, MemoryConfigStore};

// =============================================================================
// SETTINGS
// =============================================================================

pub const CONFIG_ENABLED: &str = "enableipblocker";
pub const CONFIG_THEME: &str = "enableipblockertheme";
pub const CONFIG_MESSAGE: &str = "ipblockermessage";

/// Message restored by `--reset`
pub const DEFAULT_BLOCKED_MESSAGE: &str = "This site is not available currently.";

const HEADING: &str = "IP Blocker";
const THEME_NOTICE: &str = "The IP blocker message will be displayed inside the current theme.";
const RESET_NOTICE: &str = "IP blocker message and theme settings have been reset to their defaults.";
const ENABLE_NOTICE: &str = "Enabling the IP blocker.";
const DISABLE_NOTICE: &str = "Disabling the IP blocker.";
const STATUS_ENABLED: &str = "Status: enabled";
const STATUS_DISABLED: &str = "Status: disabled";

// =============================================================================
// OPTIONS
// =============================================================================

/// IP Blocker settings.
///
/// Current status will be displayed if no option is specified.
#[derive(Parser, Debug, Default, Clone)]
#[command(name = "ipblock")]
pub struct Options {
    /// Enable the IP blocker.
    #[arg(long)]
    pub enable: bool,

    /// Disable the IP blocker.
    #[arg(long)]
    pub disable: bool,

    /// Encapsulate the error message around the current theme.
    #[arg(long)]
    pub theme: bool,

    /// The message that is shown to blocked users.
    #[arg(long, value_name = "STRING")]
    pub message: Option<String>,

    /// Resets IP blocker message defaults that could be configured here.
    #[arg(long)]
    pub reset: bool,
}

/// What an invocation ended up doing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Reset,
    Enabled,
    Disabled,
    /// No toggle given; carries the current state
    Status { enabled: bool },
}

/// CLI errors
#[derive(Debug, Error)]
pub enum IpBlockError {
    #[error(transparent)]
    Store(#[from] ConfigStoreError),

    #[error("Output error: {0}")]
    Output(#[from] std::io::Error),
}

/// Where the tool finds the site and its settings
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub wwwroot: String,
    pub config_path: PathBuf,
}

impl CliConfig {
    /// Load from `WWWROOT` and `IPBLOCK_CONFIG_PATH`
    pub fn from_env() -> Self {
        Self {
            wwwroot: env::var("WWWROOT").unwrap_or_else(|_| "http://localhost".to_string()),
            config_path: env::var("IPBLOCK_CONFIG_PATH")
                .map_or_else(|_| PathBuf::from("ipblock.json"), PathBuf::from),
        }
    }
}

// =============================================================================
// RUN
// =============================================================================

/// Apply `options` to `store`, writing human-readable progress to `out`.
///
/// The message and theme settings are applied first. Then at most one of
/// reset, enable, disable takes effect, checked in that order.
///
/// # Errors
///
/// Fails if a setting cannot be saved or output cannot be written.
pub fn run(
    options: &Options,
    wwwroot: &str,
    store: &mut dyn ConfigStore,
    out: &mut dyn Write,
) -> Result<Action, IpBlockError> {
    writeln!(out, "== {HEADING} ({wwwroot}) ==")?;

    if let Some(message) = options.message.as_deref().filter(|m| !m.is_empty()) {
        store.set(CONFIG_MESSAGE, message)?;
    }

    if options.theme {
        store.set(CONFIG_THEME, "1")?;
        writeln!(out, "{THEME_NOTICE}")?;
    } else {
        store.set(CONFIG_THEME, "0")?;
    }

    let action = if options.reset {
        writeln!(out, "{RESET_NOTICE}")?;
        store.set(CONFIG_MESSAGE, DEFAULT_BLOCKED_MESSAGE)?;
        store.set(CONFIG_THEME, "0")?;
        store.set(CONFIG_ENABLED, "0")?;
        Action::Reset
    } else if options.enable {
        writeln!(out, "{ENABLE_NOTICE}")?;
        store.set(CONFIG_ENABLED, "1")?;
        Action::Enabled
    } else if options.disable {
        writeln!(out, "{DISABLE_NOTICE}")?;
        store.set(CONFIG_ENABLED, "0")?;
        Action::Disabled
    } else {
        let enabled = store.flag(CONFIG_ENABLED);
        writeln!(out, "{}", if enabled { STATUS_ENABLED } else { STATUS_DISABLED })?;
        Action::Status { enabled }
    };

    tracing::debug!(?action, "IP blocker settings applied");
    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invoke(args: &[&str], store: &mut MemoryConfigStore) -> (Action, String) {
        let options = Options::try_parse_from(std::iter::once("ipblock").chain(args.iter().copied())).unwrap();
        let mut out = Vec::new();
        let action = run(&options, "https://lms.example.com", store, &mut out).unwrap();
        (action, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_status_when_no_option() {
        let mut store = MemoryConfigStore::default();
        let (action, out) = invoke(&[], &mut store);

        assert_eq!(action, Action::Status { enabled: false });
        assert_eq!(out, "== IP Blocker (https://lms.example.com) ==\nStatus: disabled\n");
        // theme is always written
        assert_eq!(store.get(CONFIG_THEME).as_deref(), Some("0"));
    }

    #[test]
    fn test_enable_then_status() {
        let mut store = MemoryConfigStore::default();
        let (action, _) = invoke(&["--enable"], &mut store);
        assert_eq!(action, Action::Enabled);

        let (action, out) = invoke(&[], &mut store);
        assert_eq!(action, Action::Status { enabled: true });
        assert!(out.ends_with("Status: enabled\n"));
    }

    #[test]
    fn test_enable_wins_over_disable() {
        let mut store = MemoryConfigStore::default();
        let (action, _) = invoke(&["--disable", "--enable"], &mut store);
        assert_eq!(action, Action::Enabled);
        assert!(store.flag(CONFIG_ENABLED));
    }

    #[test]
    fn test_reset_takes_precedence() {
        let mut store = MemoryConfigStore::default();
        store.set(CONFIG_ENABLED, "1").unwrap();

        let (action, out) = invoke(&["--enable", "--theme", "--message=Blocked", "--reset"], &mut store);

        assert_eq!(action, Action::Reset);
        assert!(out.contains(THEME_NOTICE));
        assert!(out.contains(RESET_NOTICE));
        assert!(!store.flag(CONFIG_ENABLED));
        assert!(!store.flag(CONFIG_THEME));
        assert_eq!(store.get(CONFIG_MESSAGE).as_deref(), Some(DEFAULT_BLOCKED_MESSAGE));
    }

    #[test]
    fn test_message_and_theme() {
        let mut store = MemoryConfigStore::default();
        let (action, out) = invoke(&["--message", "Access denied from your network", "--theme"], &mut store);

        assert_eq!(action, Action::Status { enabled: false });
        assert!(out.contains(THEME_NOTICE));
        assert_eq!(store.get(CONFIG_MESSAGE).as_deref(), Some("Access denied from your network"));
        assert!(store.flag(CONFIG_THEME));
    }

    #[test]
    fn test_empty_message_ignored() {
        let mut store = MemoryConfigStore::default();
        store.set(CONFIG_MESSAGE, "Keep me").unwrap();
        invoke(&["--message="], &mut store);
        assert_eq!(store.get(CONFIG_MESSAGE).as_deref(), Some("Keep me"));
    }

    #[test]
    fn test_unknown_option_rejected() {
        let err = Options::try_parse_from(["ipblock", "--enable", "--bogus"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
        assert!(err.to_string().contains("--bogus"));
        assert_ne!(err.exit_code(), 0);
    }

    #[test]
    fn test_help_flags() {
        for flag in ["-h", "--help"] {
            let err = Options::try_parse_from(["ipblock", flag]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
            assert_eq!(err.exit_code(), 0);
        }
    }
}
