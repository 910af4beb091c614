//! Hook into the hosting session runtime.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::{Result, SessionError};
use crate::time_limit::ExecutionLimit;

/// Session start as performed by the hosting runtime (lock acquisition,
/// cookie handling, reading the session payload)
#[async_trait]
pub trait SessionLifecycle: Send + Sync {
    async fn start(&self) -> Result<bool>;
}

/// Lifecycle for tools that never start a browser session
#[derive(Debug, Clone, Copy, Default)]
pub struct ImmediateStart;

#[async_trait]
impl SessionLifecycle for ImmediateStart {
    async fn start(&self) -> Result<bool> {
        Ok(true)
    }
}

/// Run `lifecycle.start()` with the execution budget widened to
/// `acquire_timeout`. The widening is withdrawn whatever the outcome, even
/// when other starts on the same limit are still running.
pub(crate) async fn start_with_lock_timeout(
    lifecycle: &dyn SessionLifecycle,
    limit: &ExecutionLimit,
    acquire_timeout: Duration,
) -> Result<bool> {
    let _guard = limit.widen(acquire_timeout);

    if acquire_timeout.is_zero() {
        return lifecycle.start().await;
    }

    match tokio::time::timeout(acquire_timeout, lifecycle.start()).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(timeout_secs = acquire_timeout.as_secs(), "Session lock not acquired in time");
            Err(SessionError::LockTimeout {
                timeout_secs: acquire_timeout.as_secs(),
            })
        }
    }
}
