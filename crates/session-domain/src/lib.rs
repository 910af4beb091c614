//! # Session Storage - Domain Model
//!
//! Cache server descriptors, session identifiers and session records shared
//! by every session backend. A [`ServerList`] is built once from the raw
//! connection-string setting and is read-only afterwards.
//!
//! ```text
//! "tcp://h1:111?database=2, tcp://h2?prefix=x"
//!        │
//!        ▼  ServerList::parse
//! [ h1:111/2 "PHPREDIS_SESSION:" ] [ h2:6379/0 "x" ]
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod parser;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::form_urlencoded::byte_serialize;

pub use error::ParseError;
pub use parser::parse_segment;

// =============================================================================
// DEFAULTS
// =============================================================================

/// Port used when a descriptor does not carry one
pub const DEFAULT_PORT: u16 = 6379;

/// Database index used when a descriptor does not carry one
pub const DEFAULT_DATABASE: i64 = 0;

/// Key namespace used when a descriptor does not carry one
pub const DEFAULT_PREFIX: &str = "PHPREDIS_SESSION:";

// =============================================================================
// VALUE OBJECTS
// =============================================================================

/// One fully-resolved cache server descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub database: i64,
    pub prefix: String,
    /// Query keys other than `database` and `prefix`, decoded
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl ServerEndpoint {
    /// Descriptor for `host` with every other field at its default
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            database: DEFAULT_DATABASE,
            prefix: DEFAULT_PREFIX.to_string(),
            options: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Cache key under which `sid` is stored on this server
    pub fn session_key(&self, sid: &str) -> String {
        format!("{}{sid}", self.prefix)
    }

    /// Extra option by name (e.g. `auth`)
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options.get(name).map(String::as_str)
    }

    /// Render as a `tcp://host:port?database=N&prefix=P` save path.
    ///
    /// The prefix is only emitted when it differs from [`DEFAULT_PREFIX`].
    /// Query keys and values are percent-encoded so that parsing the result
    /// gives back the same descriptor.
    pub fn to_save_path(&self) -> String {
        let encode = |raw: &str| byte_serialize(raw.as_bytes()).collect::<String>();

        let host = if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]", self.host)
        } else {
            self.host.clone()
        };

        let mut path = format!("tcp://{host}:{}?database={}", self.port, self.database);
        if self.prefix != DEFAULT_PREFIX {
            path.push_str("&prefix=");
            path.push_str(&encode(&self.prefix));
        }
        for (key, value) in &self.options {
            path.push('&');
            path.push_str(&encode(key));
            path.push('=');
            path.push_str(&encode(value));
        }
        path
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Ordered, immutable list of configured cache servers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerList(Vec<ServerEndpoint>);

impl ServerList {
    /// Parse a comma-separated connection string.
    ///
    /// Malformed segments are logged and dropped; an empty string yields an
    /// empty list.
    pub fn parse(raw: &str) -> Self {
        Self(parser::parse_server_list(raw))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServerEndpoint> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[ServerEndpoint] {
        &self.0
    }

    /// Comma-joined save paths of every server
    pub fn to_save_path(&self) -> String {
        self.0
            .iter()
            .map(ServerEndpoint::to_save_path)
            .collect::<Vec<_>>()
            .join(",")
    }
}

impl From<Vec<ServerEndpoint>> for ServerList {
    fn from(servers: Vec<ServerEndpoint>) -> Self {
        Self(servers)
    }
}

impl<'a> IntoIterator for &'a ServerList {
    type Item = &'a ServerEndpoint;
    type IntoIter = std::slice::Iter<'a, ServerEndpoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// =============================================================================
// SESSIONS
// =============================================================================

/// Session identifier as issued to the browser
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    pub fn new(sid: impl Into<String>) -> Self {
        Self(sid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Namespaced key on `server`
    pub fn cache_key(&self, server: &ServerEndpoint) -> String {
        server.session_key(&self.0)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionKey {
    fn from(sid: &str) -> Self {
        Self::new(sid)
    }
}

impl From<String> for SessionKey {
    fn from(sid: String) -> Self {
        Self(sid)
    }
}

/// Row of the session table that knows every live session id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub sid: SessionKey,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_modified: Option<DateTime<Utc>>,
}

impl SessionRecord {
    pub fn new(id: i64, sid: impl Into<SessionKey>) -> Self {
        Self {
            id,
            sid: sid.into(),
            time_modified: None,
        }
    }
}
