use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use jamesos_core::{LogId, SessionId};

use crate::backend::Backend;
use crate::error::StoreError;

/// Derived, read-only view of one session. Never stored; recomputed from the
/// log collection on demand.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: SessionId,
    /// Timestamp of the first entry seen in storage order, i.e. the most
    /// recent entry of the session.
    pub created_at: String,
    pub log_count: usize,
    /// Message of the first entry seen in storage order.
    pub summary: String,
    /// First top-level entry of the session in storage order, if any.
    pub top_level_id: Option<LogId>,
}

pub struct SessionRepo {
    backend: Backend,
}

impl SessionRepo {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }

    /// Group the collection by session id, most-recent-first by each
    /// session's representative timestamp.
    pub fn list(&self) -> Result<Vec<SessionSummary>, StoreError> {
        self.backend.with_logs(|logs| {
            let mut order: Vec<SessionId> = Vec::new();
            let mut grouped: HashMap<SessionId, SessionSummary> = HashMap::new();

            for log in logs {
                if log.session_id.as_str().is_empty() {
                    continue;
                }
                let summary = grouped
                    .entry(log.session_id.clone())
                    .or_insert_with(|| {
                        order.push(log.session_id.clone());
                        SessionSummary {
                            session_id: log.session_id.clone(),
                            created_at: log.timestamp.clone(),
                            log_count: 0,
                            summary: log.message.clone(),
                            top_level_id: None,
                        }
                    });
                summary.log_count += 1;
                if summary.top_level_id.is_none() && log.parent_id.is_none() {
                    summary.top_level_id = Some(log.id.clone());
                }
            }

            let mut sessions: Vec<SessionSummary> = order
                .into_iter()
                .filter_map(|id| grouped.remove(&id))
                .collect();
            // RFC 3339 strings with a fixed offset compare chronologically.
            sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(sessions)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logs::LogRepo;
    use jamesos_core::NewLog;

    fn in_session(text: &str, session: &str) -> NewLog {
        NewLog {
            message: Some(text.into()),
            session_id: Some(SessionId::from_raw(session)),
            ..Default::default()
        }
    }

    #[test]
    fn groups_entries_by_session() {
        let backend = Backend::in_memory();
        let repo = LogRepo::new(backend.clone());
        let sessions = SessionRepo::new(backend);

        let a = repo.insert(in_session("task started", "sess_a")).unwrap();
        repo.insert_child(
            &a.id,
            NewLog {
                message: Some("step 1".into()),
                ..Default::default()
            },
        )
        .unwrap();
        repo.insert(in_session("other task", "sess_b")).unwrap();

        let list = sessions.list().unwrap();
        assert_eq!(list.len(), 2);
        let by_id: HashMap<&str, &SessionSummary> = list
            .iter()
            .map(|s| (s.session_id.as_str(), s))
            .collect();
        assert_eq!(by_id["sess_a"].log_count, 2);
        assert_eq!(by_id["sess_b"].log_count, 1);
    }

    #[test]
    fn summary_comes_from_most_recent_entry() {
        let backend = Backend::in_memory();
        let repo = LogRepo::new(backend.clone());
        let sessions = SessionRepo::new(backend);

        repo.insert(in_session("older", "sess_a")).unwrap();
        repo.insert(in_session("newest", "sess_a")).unwrap();

        let list = sessions.list().unwrap();
        assert_eq!(list[0].summary, "newest");
        assert_eq!(list[0].log_count, 2);
    }

    #[test]
    fn top_level_id_found_past_leading_children() {
        // Storage order puts the newest entry first; when that entry is a
        // child, the session's top-level entry is still reported.
        let backend = Backend::in_memory();
        let repo = LogRepo::new(backend.clone());
        let sessions = SessionRepo::new(backend);

        let root = repo.insert(in_session("root", "sess_a")).unwrap();
        repo.insert_child(
            &root.id,
            NewLog {
                message: Some("newest child".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let list = sessions.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].top_level_id.as_ref(), Some(&root.id));
        assert_eq!(list[0].summary, "newest child");
    }

    #[test]
    fn session_without_top_level_reports_none() {
        // Orphaned children (parent evicted) leave a session with no
        // top-level entry.
        let backend = Backend::in_memory();
        let repo = LogRepo::new(backend.clone().with_capacity(1));
        let sessions = SessionRepo::new(backend.with_capacity(1));

        let parent = repo.insert(in_session("parent", "sess_a")).unwrap();
        repo.insert_child(
            &parent.id,
            NewLog {
                message: Some("survivor".into()),
                ..Default::default()
            },
        )
        .unwrap();

        let list = sessions.list().unwrap();
        assert_eq!(list.len(), 1);
        assert!(list[0].top_level_id.is_none());
    }

    #[test]
    fn sessions_sorted_most_recent_first() {
        let backend = Backend::in_memory();
        let repo = LogRepo::new(backend.clone());
        let sessions = SessionRepo::new(backend);

        repo.insert(in_session("first", "sess_a")).unwrap();
        repo.insert(in_session("second", "sess_b")).unwrap();
        repo.insert(in_session("third", "sess_c")).unwrap();

        let list = sessions.list().unwrap();
        let ids: Vec<&str> = list.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["sess_c", "sess_b", "sess_a"]);
    }

    #[test]
    fn empty_collection_yields_no_sessions() {
        let sessions = SessionRepo::new(Backend::in_memory());
        assert!(sessions.list().unwrap().is_empty());
    }

    #[test]
    fn summary_serializes_camel_case() {
        let summary = SessionSummary {
            session_id: SessionId::from_raw("sess_1"),
            created_at: "2026-08-06T12:00:00+00:00".into(),
            log_count: 3,
            summary: "did a thing".into(),
            top_level_id: None,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["sessionId"], "sess_1");
        assert_eq!(value["logCount"], 3);
        assert!(value["topLevelId"].is_null());
    }
}
