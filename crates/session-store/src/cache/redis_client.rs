//! # Redis Connector
//!
//! Opens one multiplexed connection per call. Nothing is pooled: every
//! session operation connects, works, and closes.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client, ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use session_domain::ServerEndpoint;

use super::{CacheConnection, CacheConnector};
use crate::error::CacheError;

/// Connector backed by `redis-rs`
#[derive(Debug, Clone, Copy, Default)]
pub struct RedisConnector;

impl RedisConnector {
    fn connection_info(server: &ServerEndpoint) -> ConnectionInfo {
        ConnectionInfo {
            addr: ConnectionAddr::Tcp(server.host.clone(), server.port),
            redis: RedisConnectionInfo {
                password: server.option("auth").map(str::to_string),
                ..Default::default()
            },
        }
    }
}

#[async_trait]
impl CacheConnector for RedisConnector {
    async fn connect(&self, server: &ServerEndpoint) -> Result<Box<dyn CacheConnection>, CacheError> {
        let client = Client::open(Self::connection_info(server))?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Unreachable {
                server: server.to_string(),
                reason: e.to_string(),
            })?;

        tracing::debug!(server = %server, "Connected to session cache");

        Ok(Box::new(RedisConnection {
            conn: Some(conn),
            server: server.to_string(),
        }))
    }
}

/// Live Redis connection for one server
pub struct RedisConnection {
    conn: Option<MultiplexedConnection>,
    server: String,
}

impl RedisConnection {
    fn conn(&mut self) -> Result<&mut MultiplexedConnection, CacheError> {
        self.conn
            .as_mut()
            .ok_or_else(|| CacheError::Closed(self.server.clone()))
    }
}

#[async_trait]
impl CacheConnection for RedisConnection {
    async fn select(&mut self, database: i64) -> Result<(), CacheError> {
        let conn = self.conn()?;
        let _: () = redis::cmd("SELECT").arg(database).query_async(conn).await?;
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let conn = self.conn()?;
        let value: Option<Vec<u8>> = conn.get(key).await?;
        Ok(value)
    }

    async fn del(&mut self, key: &str) -> Result<bool, CacheError> {
        let conn = self.conn()?;
        let removed: i64 = conn.del(key).await?;
        Ok(removed > 0)
    }

    async fn close(&mut self) {
        if self.conn.take().is_some() {
            tracing::debug!(server = %self.server, "Closed session cache connection");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_info_uses_endpoint() {
        let mut server = ServerEndpoint::new("cache-1").with_port(6380).with_database(4);
        server.options.insert("auth".to_string(), "s3cret".to_string());

        let info = RedisConnector::connection_info(&server);
        assert!(matches!(&info.addr, ConnectionAddr::Tcp(host, 6380) if host == "cache-1"));
        assert_eq!(info.redis.password.as_deref(), Some("s3cret"));
        // database is selected explicitly after connect
        assert_eq!(info.redis.db, 0);
    }
}
