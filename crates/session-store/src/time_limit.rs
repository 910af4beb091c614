//! Scoped execution budget.
//!
//! Session start may block on the session lock for longer than a request is
//! normally allowed to run. [`ExecutionLimit::widen`] raises the budget and
//! hands back a guard; once every outstanding guard has dropped the budget
//! is back at its baseline, whatever order the guards dropped in.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

#[derive(Debug, Default)]
struct LimitState {
    baseline: u64,
    /// Active widenings as (token, seconds), oldest first
    widenings: Vec<(u64, u64)>,
    next_token: u64,
}

impl LimitState {
    fn current(&self) -> u64 {
        self.widenings.last().map_or(self.baseline, |&(_, secs)| secs)
    }
}

/// Current execution budget in whole seconds; zero means unlimited
#[derive(Debug, Clone, Default)]
pub struct ExecutionLimit {
    state: Arc<Mutex<LimitState>>,
}

impl ExecutionLimit {
    pub fn new(limit: Duration) -> Self {
        Self {
            state: Arc::new(Mutex::new(LimitState {
                baseline: limit.as_secs(),
                ..LimitState::default()
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LimitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current(&self) -> Duration {
        Duration::from_secs(self.lock().current())
    }

    /// Set the budget to `limit` until the returned guard is dropped
    #[must_use = "the widening is undone when the guard drops"]
    pub fn widen(&self, limit: Duration) -> TimeLimitGuard {
        let mut state = self.lock();
        let previous = state.current();
        let token = state.next_token;
        state.next_token += 1;
        state.widenings.push((token, limit.as_secs()));
        drop(state);

        tracing::debug!(previous_secs = previous, limit_secs = limit.as_secs(), "Execution limit widened");

        TimeLimitGuard {
            limit: self.clone(),
            token,
        }
    }
}

/// Withdraws one widening on drop
#[derive(Debug)]
pub struct TimeLimitGuard {
    limit: ExecutionLimit,
    token: u64,
}

impl Drop for TimeLimitGuard {
    fn drop(&mut self) {
        let token = self.token;
        self.limit.lock().widenings.retain(|&(t, _)| t != token);
    }
}
