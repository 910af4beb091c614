//! # Session Store Library
//!
//! Redis-backed session storage for the web tier.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Hosting session runtime                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ start / exists / kill / kill_all
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 SessionBackend (trait)                       │
//! │        SingleServerBackend    MultiServerBackend             │
//! └─────────────────────────────────────────────────────────────┘
//!                    │                   │
//!                    ▼                   ▼
//! ┌─────────────────────────┐   ┌──────────────────────────────┐
//! │  CacheConnector         │   │  SessionRecordSource         │
//! │  (one conn per server)  │   │  (known session ids)         │
//! └─────────────────────────┘   └──────────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - `redis`: Enable the Redis connector (default). Without it every backend
//!   fails `init` with [`InitError::ExtensionUnavailable`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use session_store::{build_backend, default_connector, BackendDeps, SessionBackend, SessionConfig};
//!
//! let config = SessionConfig::from_env();
//! let (backend, settings) = build_backend(&config, BackendDeps::new(default_connector()?))?;
//!
//! if backend.exists(&"abc123".into()).await? {
//!     backend.kill(&"abc123".into()).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod records;
pub mod time_limit;

// Re-export commonly used types
pub use backend::{
    Backend, BackendDeps, HandlerSettings, ImmediateStart, MultiServerBackend, SessionBackend,
    SessionLifecycle, SingleServerBackend, build_backend,
};
pub use cache::{CacheConnection, CacheConnector, SharedConnector, default_connector};
pub use config::{SessionConfig, SingleServerConfig};
pub use error::{CacheError, InitError, RecordError, Result, SessionError};
pub use records::{InMemoryRecords, SessionRecordSource};
pub use time_limit::{ExecutionLimit, TimeLimitGuard};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build the configured backend with the compiled-in cache client.
///
/// # Errors
///
/// Returns an error if the cache client is unavailable or no session server
/// is configured.
pub fn init_from_env() -> std::result::Result<(Backend, HandlerSettings), InitError> {
    let config = SessionConfig::from_env();
    let deps = BackendDeps::new(default_connector()?)
        .with_limit(ExecutionLimit::new(config.execution_time_limit));
    build_backend(&config, deps)
}
