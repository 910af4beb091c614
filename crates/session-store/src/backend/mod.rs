//! # Session Backends
//!
//! Capability trait implemented by each Redis backend variant, plus the
//! configuration-driven factory that picks one.
//!
//! ```text
//!        SessionConfig
//!              │ build_backend
//!              ▼
//!   ┌──────────────────────┐
//!   │ Backend (enum)       │
//!   │  ├─ SingleServer     │──┐
//!   │  └─ MultiServer      │──┤  FanOut over &[ServerEndpoint]
//!   └──────────────────────┘  ▼
//!                       CacheConnector ──► Redis
//! ```

mod fan_out;
pub mod lifecycle;
pub mod multi_server;
pub mod single_server;

use async_trait::async_trait;
use session_domain::{ServerEndpoint, SessionKey};
use std::sync::Arc;

use crate::cache::SharedConnector;
use crate::config::SessionConfig;
use crate::error::{InitError, Result};
use crate::records::{InMemoryRecords, SessionRecordSource};
use crate::time_limit::ExecutionLimit;

pub use lifecycle::{ImmediateStart, SessionLifecycle};
pub use multi_server::MultiServerBackend;
pub use single_server::SingleServerBackend;

/// Save handler name published to the hosting session runtime
pub const SAVE_HANDLER: &str = "redis";

/// What the hosting session runtime must be configured with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerSettings {
    pub save_handler: &'static str,
    pub save_path: String,
}

/// Operations every session backend supports
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Validate the setup and describe how the runtime should store sessions.
    ///
    /// # Errors
    ///
    /// Fails when the cache client is missing or no server is configured.
    fn init(&self) -> std::result::Result<HandlerSettings, InitError>;

    /// Start the session, waiting up to the acquire-lock timeout.
    async fn start(&self) -> Result<bool>;

    /// Whether any configured server holds data for `sid`.
    async fn exists(&self, sid: &SessionKey) -> Result<bool>;

    /// Remove one session from every server.
    async fn kill(&self, sid: &SessionKey) -> Result<bool>;

    /// Remove every known session from every server.
    async fn kill_all(&self) -> Result<bool>;
}

/// Collaborators shared by every backend variant
#[derive(Clone)]
pub struct BackendDeps {
    pub connector: SharedConnector,
    pub lifecycle: Arc<dyn SessionLifecycle>,
    pub records: Arc<dyn SessionRecordSource>,
    pub limit: ExecutionLimit,
}

impl BackendDeps {
    /// Deps with no lifecycle work and an empty record table
    pub fn new(connector: SharedConnector) -> Self {
        Self {
            connector,
            lifecycle: Arc::new(ImmediateStart),
            records: Arc::new(InMemoryRecords::default()),
            limit: ExecutionLimit::default(),
        }
    }

    #[must_use]
    pub fn with_lifecycle(mut self, lifecycle: Arc<dyn SessionLifecycle>) -> Self {
        self.lifecycle = lifecycle;
        self
    }

    #[must_use]
    pub fn with_records(mut self, records: Arc<dyn SessionRecordSource>) -> Self {
        self.records = records;
        self
    }

    #[must_use]
    pub fn with_limit(mut self, limit: ExecutionLimit) -> Self {
        self.limit = limit;
        self
    }
}

/// Backend selected from configuration
pub enum Backend {
    Single(SingleServerBackend),
    Multi(MultiServerBackend),
}

impl Backend {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Single(_) => "single-server",
            Self::Multi(_) => "multi-server",
        }
    }

    /// Servers the selected variant talks to, in configuration order
    pub fn servers(&self) -> &[ServerEndpoint] {
        match self {
            Self::Single(backend) => backend.servers(),
            Self::Multi(backend) => backend.servers().as_slice(),
        }
    }

    fn inner(&self) -> &dyn SessionBackend {
        match self {
            Self::Single(backend) => backend,
            Self::Multi(backend) => backend,
        }
    }
}

#[async_trait]
impl SessionBackend for Backend {
    fn init(&self) -> std::result::Result<HandlerSettings, InitError> {
        self.inner().init()
    }

    async fn start(&self) -> Result<bool> {
        self.inner().start().await
    }

    async fn exists(&self, sid: &SessionKey) -> Result<bool> {
        self.inner().exists(sid).await
    }

    async fn kill(&self, sid: &SessionKey) -> Result<bool> {
        self.inner().kill(sid).await
    }

    async fn kill_all(&self) -> Result<bool> {
        self.inner().kill_all().await
    }
}

/// Pick the backend variant for `config` and initialise it.
///
/// A server connection string selects the multi-server backend; otherwise a
/// server ip selects the single-server backend.
///
/// # Errors
///
/// [`InitError::MissingConfiguration`] when neither is set, or whatever the
/// chosen backend's `init` reports.
pub fn build_backend(
    config: &SessionConfig,
    deps: BackendDeps,
) -> std::result::Result<(Backend, HandlerSettings), InitError> {
    let backend = if config.connection_string.as_deref().is_some_and(|s| !s.trim().is_empty()) {
        Backend::Multi(MultiServerBackend::from_config(config, deps))
    } else if !config.single.server_ip.trim().is_empty() {
        Backend::Single(SingleServerBackend::from_config(config, deps))
    } else {
        return Err(InitError::MissingConfiguration(crate::config::ENV_SAVE_PATH));
    };

    let settings = backend.init()?;
    tracing::info!(
        kind = backend.kind(),
        save_path = %settings.save_path,
        "Session backend initialised"
    );

    Ok((backend, settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::mock::MockConnector;
    use crate::config::SingleServerConfig;

    fn deps(mock: &MockConnector) -> BackendDeps {
        BackendDeps::new(Arc::new(mock.clone()))
    }

    #[test]
    fn test_connection_string_selects_multi() {
        let mock = MockConnector::default();
        let config = SessionConfig {
            connection_string: Some("tcp://a, tcp://b?database=3".to_string()),
            single: SingleServerConfig {
                server_ip: "ignored".to_string(),
                ..SingleServerConfig::default()
            },
            ..SessionConfig::default()
        };

        let (backend, settings) = build_backend(&config, deps(&mock)).unwrap();

        assert_eq!(backend.kind(), "multi-server");
        assert_eq!(settings.save_handler, "redis");
        assert_eq!(settings.save_path, "tcp://a:6379?database=0,tcp://b:6379?database=3");
    }

    #[test]
    fn test_server_ip_selects_single() {
        let mock = MockConnector::default();
        let config = SessionConfig {
            single: SingleServerConfig {
                server_ip: "10.0.0.1".to_string(),
                ..SingleServerConfig::default()
            },
            ..SessionConfig::default()
        };

        let (backend, _) = build_backend(&config, deps(&mock)).unwrap();
        assert_eq!(backend.kind(), "single-server");
    }

    #[test]
    fn test_servers_of_selected_backend() {
        let mock = MockConnector::default();
        let single = SessionConfig {
            single: SingleServerConfig {
                server_ip: "10.0.0.1".to_string(),
                port: 6380,
                prefix: Some("lms:".to_string()),
                ..SingleServerConfig::default()
            },
            ..SessionConfig::default()
        };

        let (backend, _) = build_backend(&single, deps(&mock)).unwrap();
        assert_eq!(
            backend.servers(),
            &[ServerEndpoint::new("10.0.0.1").with_port(6380).with_prefix("lms:")]
        );

        let multi = SessionConfig {
            connection_string: Some("tcp://a, tcp://b?database=3".to_string()),
            ..single
        };
        let (backend, _) = build_backend(&multi, deps(&mock)).unwrap();
        let hosts: Vec<_> = backend.servers().iter().map(|s| s.host.as_str()).collect();
        assert_eq!(hosts, vec!["a", "b"]);
    }

    #[test]
    fn test_blocking_dispatch() {
        let mock = MockConnector::default();
        mock.put("10.0.0.1", 0, "PHPREDIS_SESSION:abc", "payload");
        let config = SessionConfig {
            single: SingleServerConfig {
                server_ip: "10.0.0.1".to_string(),
                ..SingleServerConfig::default()
            },
            ..SessionConfig::default()
        };
        let (backend, _) = build_backend(&config, deps(&mock)).unwrap();

        assert!(tokio_test::block_on(backend.exists(&"abc".into())).unwrap());
        assert!(tokio_test::block_on(backend.kill(&"abc".into())).unwrap());
        assert!(!mock.contains("10.0.0.1", 0, "PHPREDIS_SESSION:abc"));
    }

    #[test]
    fn test_nothing_configured() {
        let mock = MockConnector::default();
        let result = build_backend(&SessionConfig::default(), deps(&mock));
        assert!(matches!(result, Err(InitError::MissingConfiguration(_))));
    }

    #[test]
    fn test_missing_cache_client() {
        let mock = MockConnector::unavailable();
        let config = SessionConfig {
            connection_string: Some("tcp://a".to_string()),
            ..SessionConfig::default()
        };

        let result = build_backend(&config, deps(&mock));
        assert!(matches!(result, Err(InitError::ExtensionUnavailable(_))));
    }

    #[tokio::test]
    async fn test_enum_dispatch() {
        let mock = MockConnector::default();
        mock.put("a", 0, "PHPREDIS_SESSION:abc", "payload");
        let config = SessionConfig {
            connection_string: Some("tcp://a".to_string()),
            ..SessionConfig::default()
        };
        let (backend, _) = build_backend(&config, deps(&mock)).unwrap();

        assert!(backend.exists(&"abc".into()).await.unwrap());
        assert!(backend.kill(&"abc".into()).await.unwrap());
        assert!(!backend.exists(&"abc".into()).await.unwrap());
        assert!(backend.start().await.unwrap());
    }
}
