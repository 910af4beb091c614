//! Recording in-memory connector for backend tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use session_domain::ServerEndpoint;

use super::{CacheConnection, CacheConnector};
use crate::error::CacheError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Connect(String),
    Select(String, i64),
    Get(String, String),
    Del(String, String),
    Close(String),
}

#[derive(Default)]
struct State {
    /// host -> (database, key) -> value
    data: HashMap<String, HashMap<(i64, String), Vec<u8>>>,
    unreachable: HashSet<String>,
    failing_ops: HashSet<String>,
    calls: Vec<Call>,
}

#[derive(Clone)]
pub struct MockConnector {
    state: Arc<Mutex<State>>,
    available: bool,
}

impl Default for MockConnector {
    fn default() -> Self {
        Self {
            state: Arc::default(),
            available: true,
        }
    }
}

impl MockConnector {
    pub fn unavailable() -> Self {
        Self {
            available: false,
            ..Self::default()
        }
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn put(&self, host: &str, database: i64, key: &str, value: &str) {
        self.state()
            .data
            .entry(host.to_string())
            .or_default()
            .insert((database, key.to_string()), value.as_bytes().to_vec());
    }

    pub fn contains(&self, host: &str, database: i64, key: &str) -> bool {
        self.state()
            .data
            .get(host)
            .is_some_and(|db| db.contains_key(&(database, key.to_string())))
    }

    /// Refuse connections to `host`
    pub fn set_unreachable(&self, host: &str) {
        self.state().unreachable.insert(host.to_string());
    }

    /// Accept connections to `host` but fail every get/del
    pub fn set_failing(&self, host: &str) {
        self.state().failing_ops.insert(host.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state().calls.clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.state().calls.iter().filter(|c| pred(c)).count()
    }

    pub fn connects(&self) -> usize {
        self.count(|c| matches!(c, Call::Connect(_)))
    }

    pub fn closes(&self) -> usize {
        self.count(|c| matches!(c, Call::Close(_)))
    }

    pub fn deletes(&self) -> usize {
        self.count(|c| matches!(c, Call::Del(..)))
    }
}

#[async_trait]
impl CacheConnector for MockConnector {
    async fn connect(&self, server: &ServerEndpoint) -> Result<Box<dyn CacheConnection>, CacheError> {
        let mut state = self.state();
        state.calls.push(Call::Connect(server.host.clone()));
        if state.unreachable.contains(&server.host) {
            return Err(CacheError::Unreachable {
                server: server.to_string(),
                reason: "connection refused".to_string(),
            });
        }

        Ok(Box::new(MockConnection {
            state: Arc::clone(&self.state),
            host: server.host.clone(),
            database: 0,
            open: true,
        }))
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

struct MockConnection {
    state: Arc<Mutex<State>>,
    host: String,
    database: i64,
    open: bool,
}

impl MockConnection {
    fn record(&self, call: Call) -> Result<MutexGuard<'_, State>, CacheError> {
        if !self.open {
            return Err(CacheError::Closed(self.host.clone()));
        }
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        Ok(state)
    }

    fn check_failing(&self, state: &State) -> Result<(), CacheError> {
        if state.failing_ops.contains(&self.host) {
            return Err(CacheError::Redis("READONLY simulated failure".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheConnection for MockConnection {
    async fn select(&mut self, database: i64) -> Result<(), CacheError> {
        drop(self.record(Call::Select(self.host.clone(), database))?);
        self.database = database;
        Ok(())
    }

    async fn get(&mut self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let state = self.record(Call::Get(self.host.clone(), key.to_string()))?;
        self.check_failing(&state)?;
        Ok(state
            .data
            .get(&self.host)
            .and_then(|db| db.get(&(self.database, key.to_string())))
            .cloned())
    }

    async fn del(&mut self, key: &str) -> Result<bool, CacheError> {
        let mut state = self.record(Call::Del(self.host.clone(), key.to_string()))?;
        self.check_failing(&state)?;
        let database = self.database;
        Ok(state
            .data
            .get_mut(&self.host)
            .and_then(|db| db.remove(&(database, key.to_string())))
            .is_some())
    }

    async fn close(&mut self) {
        if self.open {
            self.state.lock().unwrap().calls.push(Call::Close(self.host.clone()));
            self.open = false;
        }
    }
}
