use std::collections::{HashSet, VecDeque};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use jamesos_core::{LogEntry, LogId, NewLog, SessionId};

use crate::backend::Backend;
use crate::error::StoreError;

/// Repository counters surfaced by the health endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub total_logs: usize,
    pub total_sessions: usize,
}

/// Owns the bounded log collection and enforces its lifecycle rules.
///
/// The collection is a flat list in most-recent-first order; parent/child
/// relationships are plain back-references reconstructed by scanning, never an
/// explicit tree. Entries are immutable once inserted and leave the
/// collection only through cascading delete, bulk clear, or eviction past the
/// retention bound.
pub struct LogRepo {
    backend: Backend,
}

impl LogRepo {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Insert a top-level (or explicitly parented) entry.
    ///
    /// The id and timestamp are always freshly assigned; a session id is
    /// generated unless the caller supplied one. Past the retention bound the
    /// oldest entries are evicted, without cascading to their children.
    #[instrument(skip(self, data))]
    pub fn insert(&self, data: NewLog) -> Result<LogEntry, StoreError> {
        let entry = self.build_entry(&data, data.session_id.clone(), data.parent_id.clone())?;
        let capacity = self.backend.capacity();

        self.backend.with_logs_mut(|logs| {
            logs.insert(0, entry.clone());
            logs.truncate(capacity);
            Ok(())
        })?;

        tracing::debug!(id = %entry.id, level = %entry.level, category = %entry.category, "log inserted");
        Ok(entry)
    }

    /// Insert a child of an existing entry. The child's session id is forced
    /// to the parent's, overriding any caller-supplied value. Fails with
    /// `NotFound` (and leaves the collection untouched) when the parent does
    /// not exist.
    #[instrument(skip(self, data), fields(parent_id = %parent_id))]
    pub fn insert_child(&self, parent_id: &LogId, data: NewLog) -> Result<LogEntry, StoreError> {
        let message = self.require_message(&data)?;
        let capacity = self.backend.capacity();
        let parent_id = parent_id.clone();

        let entry = self.backend.with_logs_mut(|logs| {
            let parent = logs
                .iter()
                .find(|l| l.id == parent_id)
                .ok_or_else(|| StoreError::NotFound(format!("log {parent_id}")))?;

            let entry = LogEntry {
                id: LogId::new(),
                session_id: parent.session_id.clone(),
                parent_id: Some(parent_id.clone()),
                timestamp: Utc::now().to_rfc3339(),
                level: data.level(),
                category: data.category(),
                message,
                details: data.details.clone(),
                metadata: data.metadata.clone(),
                duration: data.duration,
            };

            logs.insert(0, entry.clone());
            logs.truncate(capacity);
            Ok(entry)
        })?;

        tracing::debug!(id = %entry.id, parent_id = %parent_id, "child log inserted");
        Ok(entry)
    }

    /// Point lookup by id.
    pub fn get(&self, id: &LogId) -> Result<Option<LogEntry>, StoreError> {
        self.backend
            .with_logs(|logs| Ok(logs.iter().find(|l| &l.id == id).cloned()))
    }

    /// Entries with no parent, most-recent-first.
    pub fn list_top_level(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.backend.with_logs(|logs| {
            Ok(logs
                .iter()
                .filter(|l| l.parent_id.is_none())
                .cloned()
                .collect())
        })
    }

    /// Entries of any nesting level belonging to one session.
    pub fn list_by_session(&self, session_id: &SessionId) -> Result<Vec<LogEntry>, StoreError> {
        self.backend.with_logs(|logs| {
            Ok(logs
                .iter()
                .filter(|l| &l.session_id == session_id)
                .cloned()
                .collect())
        })
    }

    /// Direct children of one entry (a single level).
    pub fn list_by_parent(&self, parent_id: &LogId) -> Result<Vec<LogEntry>, StoreError> {
        self.backend.with_logs(|logs| {
            Ok(logs
                .iter()
                .filter(|l| l.parent_id.as_ref() == Some(parent_id))
                .cloned()
                .collect())
        })
    }

    /// The entire collection, unfiltered.
    pub fn list_all(&self) -> Result<Vec<LogEntry>, StoreError> {
        self.backend.with_logs(|logs| Ok(logs.to_vec()))
    }

    /// Delete an entry together with every descendant reachable through
    /// `parent_id` links.
    ///
    /// Returns the size of the delete set, which unconditionally includes the
    /// requested id, so the count is at least 1 even when the id was absent.
    /// Callers needing the found/not-found distinction check existence first.
    /// The traversal is iterative with a visited set, so a cyclic or
    /// self-referential chain in corrupted state terminates.
    #[instrument(skip(self), fields(id = %id))]
    pub fn delete(&self, id: &LogId) -> Result<usize, StoreError> {
        let id = id.clone();
        let removed = self.backend.with_logs_mut(|logs| {
            let mut doomed: HashSet<LogId> = HashSet::new();
            doomed.insert(id.clone());
            let mut frontier: VecDeque<LogId> = VecDeque::new();
            frontier.push_back(id);

            while let Some(current) = frontier.pop_front() {
                for log in logs.iter() {
                    if log.parent_id.as_ref() == Some(&current) && doomed.insert(log.id.clone()) {
                        frontier.push_back(log.id.clone());
                    }
                }
            }

            logs.retain(|l| !doomed.contains(&l.id));
            Ok(doomed.len())
        })?;

        tracing::debug!(removed, "log subtree deleted");
        Ok(removed)
    }

    /// Empty the collection unconditionally.
    pub fn delete_all(&self) -> Result<(), StoreError> {
        self.backend.with_logs_mut(|logs| {
            logs.clear();
            Ok(())
        })?;
        tracing::debug!("all logs deleted");
        Ok(())
    }

    /// Current collection size and the number of distinct session ids.
    pub fn stats(&self) -> Result<Stats, StoreError> {
        self.backend.with_logs(|logs| {
            let sessions: HashSet<&str> = logs
                .iter()
                .map(|l| l.session_id.as_str())
                .filter(|s| !s.is_empty())
                .collect();
            Ok(Stats {
                total_logs: logs.len(),
                total_sessions: sessions.len(),
            })
        })
    }

    fn require_message(&self, data: &NewLog) -> Result<String, StoreError> {
        data.resolve_message()
            .map(str::to_owned)
            .ok_or_else(|| StoreError::Validation("message or content is required".into()))
    }

    fn build_entry(
        &self,
        data: &NewLog,
        session_id: Option<SessionId>,
        parent_id: Option<LogId>,
    ) -> Result<LogEntry, StoreError> {
        let message = self.require_message(data)?;
        Ok(LogEntry {
            id: LogId::new(),
            session_id: session_id.unwrap_or_default(),
            parent_id,
            timestamp: Utc::now().to_rfc3339(),
            level: data.level(),
            category: data.category(),
            message,
            details: data.details.clone(),
            metadata: data.metadata.clone(),
            duration: data.duration,
        })
    }
}
