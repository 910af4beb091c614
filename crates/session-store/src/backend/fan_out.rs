//! Fan-out of session operations across every configured server.
//!
//! The cache client does not report which server ended up holding a session
//! written through a server list, so lookups and deletes go to all of them.
//! Per-server failures are logged and the sweep continues.

use futures_util::StreamExt;
use futures_util::future::join_all;
use session_domain::{ServerEndpoint, SessionKey};

use crate::cache::{CacheConnection, CacheConnector};
use crate::error::{CacheError, Result, SessionError};
use crate::records::SessionRecordSource;

/// Borrowed view of a server list plus the connector used to reach it
#[derive(Clone, Copy)]
pub(crate) struct FanOut<'a> {
    servers: &'a [ServerEndpoint],
    connector: &'a dyn CacheConnector,
}

impl<'a> FanOut<'a> {
    pub(crate) fn new(servers: &'a [ServerEndpoint], connector: &'a dyn CacheConnector) -> Self {
        Self { servers, connector }
    }

    /// Connect and select the server's database. The connection is closed
    /// again if the select fails.
    async fn open(&self, server: &ServerEndpoint) -> std::result::Result<Box<dyn CacheConnection>, CacheError> {
        let mut conn = self.connector.connect(server).await?;
        if let Err(e) = conn.select(server.database).await {
            conn.close().await;
            return Err(e);
        }
        Ok(conn)
    }

    async fn lookup_on(&self, server: &ServerEndpoint, sid: &SessionKey) -> std::result::Result<bool, CacheError> {
        let mut conn = self.open(server).await?;
        let value = conn.get(&sid.cache_key(server)).await;
        conn.close().await;
        Ok(value?.is_some())
    }

    async fn delete_on(&self, server: &ServerEndpoint, sid: &SessionKey) -> std::result::Result<bool, CacheError> {
        let mut conn = self.open(server).await?;
        let removed = conn.del(&sid.cache_key(server)).await;
        conn.close().await;
        removed
    }

    /// `true` as soon as one server holds the session, in list order.
    ///
    /// # Errors
    ///
    /// [`SessionError::AllServersFailed`] when no server could be asked.
    pub(crate) async fn exists(&self, sid: &SessionKey) -> Result<bool> {
        if self.servers.is_empty() {
            return Ok(false);
        }

        let mut failures = 0;
        for server in self.servers {
            match self.lookup_on(server, sid).await {
                Ok(true) => {
                    tracing::debug!(server = %server, sid = %sid, "Session found");
                    return Ok(true);
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(server = %server, error = %e, "Session lookup failed, trying next server");
                    failures += 1;
                }
            }
        }

        if failures == self.servers.len() {
            return Err(SessionError::AllServersFailed { count: failures });
        }
        Ok(false)
    }

    /// Delete `sid` on every server. `Ok(false)` when the list is empty or
    /// any server failed.
    pub(crate) async fn kill(&self, sid: &SessionKey) -> Result<bool> {
        if self.servers.is_empty() {
            return Ok(false);
        }

        let outcomes = join_all(self.servers.iter().map(|server| self.delete_on(server, sid))).await;

        let mut ok = true;
        for (server, outcome) in self.servers.iter().zip(outcomes) {
            match outcome {
                Ok(removed) => tracing::debug!(server = %server, sid = %sid, removed, "Session deleted"),
                Err(e) => {
                    tracing::warn!(server = %server, sid = %sid, error = %e, "Session delete failed");
                    ok = false;
                }
            }
        }
        Ok(ok)
    }

    /// Delete every recorded session on every server.
    ///
    /// One connection per server is held for the whole sweep and closed
    /// once the record stream ends, error or not.
    ///
    /// # Errors
    ///
    /// [`SessionError::RecordSource`] if the record stream fails part-way.
    pub(crate) async fn kill_all(&self, records: &dyn SessionRecordSource) -> Result<bool> {
        if self.servers.is_empty() {
            return Ok(false);
        }

        let mut ok = true;
        let mut open = Vec::with_capacity(self.servers.len());
        for server in self.servers {
            match self.open(server).await {
                Ok(conn) => open.push((server, conn)),
                Err(e) => {
                    tracing::warn!(server = %server, error = %e, "Skipping unreachable session server");
                    ok = false;
                }
            }
        }

        if open.is_empty() {
            return Ok(false);
        }

        let mut sessions = 0usize;
        let mut deletes = 0usize;
        let mut stream = records.records();
        let outcome = loop {
            match stream.next().await {
                None => break Ok(()),
                Some(Err(e)) => break Err(e),
                Some(Ok(record)) => {
                    sessions += 1;
                    for (server, conn) in &mut open {
                        deletes += 1;
                        if let Err(e) = conn.del(&record.sid.cache_key(*server)).await {
                            tracing::warn!(server = %server, sid = %record.sid, error = %e, "Session delete failed");
                            ok = false;
                        }
                    }
                }
            }
        };
        drop(stream);

        for (_, conn) in &mut open {
            conn.close().await;
        }

        outcome?;
        tracing::info!(servers = open.len(), sessions, deletes, "Killed all sessions");
        Ok(ok)
    }
}
