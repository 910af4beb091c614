//! # Cache Module
//!
//! Connection seam to the cache engine. Backends only ever see
//! [`CacheConnector`] and [`CacheConnection`]; the Redis implementation
//! lives behind the `redis` feature.

#[cfg(test)]
pub(crate) mod mock;
#[cfg(feature = "redis")]
pub mod redis_client;

use async_trait::async_trait;
use session_domain::ServerEndpoint;
use std::sync::Arc;

use crate::error::{CacheError, InitError};

#[cfg(feature = "redis")]
pub use redis_client::{RedisConnection, RedisConnector};

/// Opens fresh connections to a single cache server
#[async_trait]
pub trait CacheConnector: Send + Sync {
    /// Connect to `server`. The database is not selected yet.
    async fn connect(&self, server: &ServerEndpoint) -> Result<Box<dyn CacheConnection>, CacheError>;

    /// Whether the client library backing this connector is usable
    fn is_available(&self) -> bool {
        true
    }
}

/// One open connection to a cache server
#[async_trait]
pub trait CacheConnection: Send {
    async fn select(&mut self, database: i64) -> Result<(), CacheError>;

    /// `None` when the key is absent
    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    /// `true` when a key was removed
    async fn del(&mut self, key: &str) -> Result<bool, CacheError>;

    /// Release the connection. Later calls fail with [`CacheError::Closed`].
    async fn close(&mut self);
}

/// Shared connector handle
pub type SharedConnector = Arc<dyn CacheConnector>;

/// Whether the crate was built with a cache client
pub const fn cache_capability_available() -> bool {
    cfg!(feature = "redis")
}

/// Connector for the compiled-in cache client
///
/// # Errors
///
/// Returns [`InitError::ExtensionUnavailable`] when built without the
/// `redis` feature.
pub fn default_connector() -> Result<SharedConnector, InitError> {
    #[cfg(feature = "redis")]
    {
        Ok(Arc::new(RedisConnector))
    }

    #[cfg(not(feature = "redis"))]
    {
        Err(InitError::ExtensionUnavailable(
            "redis client is not compiled in".to_string(),
        ))
    }
}
