use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{info, warn};

use jamesos_core::LogEntry;

use crate::error::StoreError;

/// Retention bound for the in-memory variant.
pub const DEFAULT_MEMORY_CAPACITY: usize = 1000;
/// Retention bound for the file-backed variant.
pub const DEFAULT_FILE_CAPACITY: usize = 500;

/// Shared storage for the log collection.
///
/// All access is serialized through one mutex; every operation runs as a
/// single read(-modify-write) unit inside the lock. The in-memory variant
/// holds the collection as canonical state. The file-backed variant treats a
/// JSON array on disk as canonical: each operation re-reads the file, applies
/// the closure, and rewrites the file wholesale. Concurrent writers from
/// other processes are not supported.
#[derive(Clone)]
pub struct Backend {
    inner: Arc<Mutex<State>>,
    capacity: usize,
    created: bool,
}

struct State {
    logs: Vec<LogEntry>,
    file: Option<PathBuf>,
}

impl Backend {
    /// Process-memory storage.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Mutex::new(State {
                logs: Vec::new(),
                file: None,
            })),
            capacity: DEFAULT_MEMORY_CAPACITY,
            created: false,
        }
    }

    /// File-backed storage at `path`. Creates the file (as an empty array)
    /// when it does not exist; `was_created` reports which case occurred so
    /// callers can seed a first entry.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .map_err(|e| StoreError::Io(format!("create dir: {e}")))?;
            }
        }

        let created = !path.exists();
        if created {
            fs::write(path, "[]").map_err(|e| StoreError::Io(format!("create file: {e}")))?;
        }

        info!(path = %path.display(), created, "log file opened");

        Ok(Self {
            inner: Arc::new(Mutex::new(State {
                logs: Vec::new(),
                file: Some(path.to_owned()),
            })),
            capacity: DEFAULT_FILE_CAPACITY,
            created,
        })
    }

    /// Override the retention bound.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether `open` had to create the backing file.
    pub fn was_created(&self) -> bool {
        self.created
    }

    /// Run a read-only closure against the collection.
    pub fn with_logs<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&[LogEntry]) -> Result<T, StoreError>,
    {
        let mut state = self.inner.lock();
        reload(&mut state);
        f(&state.logs)
    }

    /// Run a mutating closure against the collection. For the file-backed
    /// variant the whole read-apply-rewrite sequence happens inside the lock;
    /// the file is only rewritten when the closure succeeds.
    pub fn with_logs_mut<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Vec<LogEntry>) -> Result<T, StoreError>,
    {
        let mut state = self.inner.lock();
        reload(&mut state);
        let result = f(&mut state.logs)?;
        persist(&state)?;
        Ok(result)
    }
}

/// Refresh in-process state from the backing file, if any. A missing or
/// corrupt file reads as an empty collection.
fn reload(state: &mut State) {
    let Some(path) = &state.file else {
        return;
    };
    state.logs = match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "log file unreadable, starting empty");
            Vec::new()
        }),
        Err(_) => Vec::new(),
    };
}

fn persist(state: &State) -> Result<(), StoreError> {
    let Some(path) = &state.file else {
        return Ok(());
    };
    let json = serde_json::to_string_pretty(&state.logs)?;
    fs::write(path, json).map_err(|e| StoreError::Io(format!("write log file: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jamesos_core::{LogCategory, LogId, LogLevel, SessionId};

    fn entry(message: &str) -> LogEntry {
        LogEntry {
            id: LogId::new(),
            session_id: SessionId::new(),
            parent_id: None,
            timestamp: "2026-08-06T12:00:00+00:00".into(),
            level: LogLevel::Info,
            category: LogCategory::System,
            message: message.into(),
            details: None,
            metadata: None,
            duration: None,
        }
    }

    #[test]
    fn in_memory_roundtrip() {
        let backend = Backend::in_memory();
        backend
            .with_logs_mut(|logs| {
                logs.push(entry("a"));
                Ok(())
            })
            .unwrap();
        let len = backend.with_logs(|logs| Ok(logs.len())).unwrap();
        assert_eq!(len, 1);
    }

    #[test]
    fn default_capacities() {
        assert_eq!(Backend::in_memory().capacity(), 1000);
        let dir = tempfile::tempdir().unwrap();
        let backend = Backend::open(&dir.path().join("logs.json")).unwrap();
        assert_eq!(backend.capacity(), 500);
    }

    #[test]
    fn with_capacity_overrides_default() {
        let backend = Backend::in_memory().with_capacity(10);
        assert_eq!(backend.capacity(), 10);
    }

    #[test]
    fn open_creates_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        let backend = Backend::open(&path).unwrap();
        assert!(backend.was_created());
        assert!(path.exists());

        let reopened = Backend::open(&path).unwrap();
        assert!(!reopened.was_created());
    }

    #[test]
    fn file_state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");

        let backend = Backend::open(&path).unwrap();
        backend
            .with_logs_mut(|logs| {
                logs.push(entry("persisted"));
                Ok(())
            })
            .unwrap();
        drop(backend);

        let reopened = Backend::open(&path).unwrap();
        let messages = reopened
            .with_logs(|logs| Ok(logs.iter().map(|l| l.message.clone()).collect::<Vec<_>>()))
            .unwrap();
        assert_eq!(messages, vec!["persisted"]);
    }

    #[test]
    fn corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");
        fs::write(&path, "not json at all").unwrap();

        let backend = Backend::open(&path).unwrap();
        let len = backend.with_logs(|logs| Ok(logs.len())).unwrap();
        assert_eq!(len, 0);
    }

    #[test]
    fn failed_mutation_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs.json");

        let backend = Backend::open(&path).unwrap();
        backend
            .with_logs_mut(|logs| {
                logs.push(entry("kept"));
                Ok(())
            })
            .unwrap();

        let result: Result<(), StoreError> = backend.with_logs_mut(|logs| {
            logs.clear();
            Err(StoreError::Validation("rejected".into()))
        });
        assert!(result.is_err());

        // The canonical file still holds the earlier entry.
        let len = backend.with_logs(|logs| Ok(logs.len())).unwrap();
        assert_eq!(len, 1);
    }
}
