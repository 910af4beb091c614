//! Backend for one Redis server configured through discrete settings.

use async_trait::async_trait;
use session_domain::{ServerEndpoint, SessionKey};
use std::time::Duration;

use super::fan_out::FanOut;
use super::lifecycle::start_with_lock_timeout;
use super::{BackendDeps, HandlerSettings, SAVE_HANDLER, SessionBackend};
use crate::config::{ENV_SERVER_IP, SessionConfig, SingleServerConfig};
use crate::error::{InitError, Result};

/// Sessions stored on a single Redis server
pub struct SingleServerBackend {
    /// Empty when no server ip is configured
    server: Vec<ServerEndpoint>,
    acquire_lock_timeout: Duration,
    deps: BackendDeps,
}

impl SingleServerBackend {
    pub fn new(settings: &SingleServerConfig, acquire_lock_timeout: Duration, deps: BackendDeps) -> Self {
        let server = if settings.server_ip.trim().is_empty() {
            Vec::new()
        } else {
            let mut endpoint = ServerEndpoint::new(settings.server_ip.trim())
                .with_port(settings.port)
                .with_database(settings.database);
            if let Some(prefix) = &settings.prefix {
                endpoint = endpoint.with_prefix(prefix.clone());
            }
            vec![endpoint]
        };

        Self {
            server,
            acquire_lock_timeout,
            deps,
        }
    }

    pub fn from_config(config: &SessionConfig, deps: BackendDeps) -> Self {
        Self::new(&config.single, config.acquire_lock_timeout, deps)
    }

    pub fn server(&self) -> Option<&ServerEndpoint> {
        self.server.first()
    }

    pub fn servers(&self) -> &[ServerEndpoint] {
        &self.server
    }

    fn fan_out(&self) -> FanOut<'_> {
        FanOut::new(&self.server, self.deps.connector.as_ref())
    }
}

#[async_trait]
impl SessionBackend for SingleServerBackend {
    fn init(&self) -> std::result::Result<HandlerSettings, InitError> {
        if !self.deps.connector.is_available() {
            return Err(InitError::ExtensionUnavailable(
                "redis client is not available".to_string(),
            ));
        }
        let server = self
            .server()
            .ok_or(InitError::MissingConfiguration(ENV_SERVER_IP))?;

        Ok(HandlerSettings {
            save_handler: SAVE_HANDLER,
            save_path: server.to_save_path(),
        })
    }

    async fn start(&self) -> Result<bool> {
        start_with_lock_timeout(
            self.deps.lifecycle.as_ref(),
            &self.deps.limit,
            self.acquire_lock_timeout,
        )
        .await
    }

    async fn exists(&self, sid: &SessionKey) -> Result<bool> {
        self.fan_out().exists(sid).await
    }

    async fn kill(&self, sid: &SessionKey) -> Result<bool> {
        self.fan_out().kill(sid).await
    }

    async fn kill_all(&self) -> Result<bool> {
        self.fan_out().kill_all(self.deps.records.as_ref()).await
    }
}
