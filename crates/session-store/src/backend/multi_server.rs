//! Backend over a server list parsed from a connection string.

use async_trait::async_trait;
use session_domain::{ServerList, SessionKey};
use std::time::Duration;

use super::fan_out::FanOut;
use super::lifecycle::start_with_lock_timeout;
use super::{BackendDeps, HandlerSettings, SAVE_HANDLER, SessionBackend};
use crate::config::{ENV_SAVE_PATH, SessionConfig};
use crate::error::{InitError, Result};

/// Sessions spread over several Redis servers.
///
/// The owning server of a session is unknown, so every lookup and delete
/// visits all servers.
pub struct MultiServerBackend {
    servers: ServerList,
    acquire_lock_timeout: Duration,
    deps: BackendDeps,
}

impl MultiServerBackend {
    pub fn new(servers: ServerList, acquire_lock_timeout: Duration, deps: BackendDeps) -> Self {
        Self {
            servers,
            acquire_lock_timeout,
            deps,
        }
    }

    pub fn from_config(config: &SessionConfig, deps: BackendDeps) -> Self {
        let servers = ServerList::parse(config.connection_string.as_deref().unwrap_or_default());
        Self::new(servers, config.acquire_lock_timeout, deps)
    }

    pub const fn servers(&self) -> &ServerList {
        &self.servers
    }

    fn fan_out(&self) -> FanOut<'_> {
        FanOut::new(self.servers.as_slice(), self.deps.connector.as_ref())
    }
}

#[async_trait]
impl SessionBackend for MultiServerBackend {
    fn init(&self) -> std::result::Result<HandlerSettings, InitError> {
        if !self.deps.connector.is_available() {
            return Err(InitError::ExtensionUnavailable(
                "redis client is not available".to_string(),
            ));
        }
        if self.servers.is_empty() {
            return Err(InitError::MissingConfiguration(ENV_SAVE_PATH));
        }

        Ok(HandlerSettings {
            save_handler: SAVE_HANDLER,
            save_path: self.servers.to_save_path(),
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
