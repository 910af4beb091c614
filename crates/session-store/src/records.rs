//! # Session Records
//!
//! Read-only view of the table that knows every live session id. Only
//! `kill_all` consumes it: the cache itself cannot enumerate sessions.

use std::path::Path;

use futures_util::StreamExt;
use futures_util::stream::{self, BoxStream};
use session_domain::SessionRecord;

use crate::error::RecordError;

/// Source of known session records, newest first (id descending)
pub trait SessionRecordSource: Send + Sync {
    fn records(&self) -> BoxStream<'_, Result<SessionRecord, RecordError>>;
}

/// Records held in memory, ordered newest first on construction
#[derive(Debug, Clone, Default)]
pub struct InMemoryRecords {
    records: Vec<SessionRecord>,
}

impl InMemoryRecords {
    pub fn new(mut records: Vec<SessionRecord>) -> Self {
        records.sort_by(|a, b| b.id.cmp(&a.id));
        Self { records }
    }

    /// Load one JSON object per line (`{"id": 1, "sid": "..."}`); blank lines
    /// are ignored.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or a line is not a session record.
    pub async fn from_json_lines(path: impl AsRef<Path>) -> Result<Self, RecordError> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;

        let records = content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(idx, line)| {
                serde_json::from_str(line).map_err(|source| RecordError::Json {
                    line: idx + 1,
                    source,
                })
            })
            .collect::<Result<Vec<SessionRecord>, _>>()?;

        tracing::debug!(count = records.len(), path = %path.as_ref().display(), "Loaded session records");
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl SessionRecordSource for InMemoryRecords {
    fn records(&self) -> BoxStream<'_, Result<SessionRecord, RecordError>> {
        stream::iter(self.records.iter().cloned().map(Ok)).boxed()
    }
}
