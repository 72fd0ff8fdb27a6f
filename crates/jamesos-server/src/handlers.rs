//! REST handlers for the dashboard API.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use jamesos_core::{LogEntry, LogId, NewLog, SessionId};
use jamesos_store::{SessionSummary, Stats};

use crate::error::ApiError;
use crate::server::AppState;

/// Filters for GET /api/logs. Precedence: parentId > sessionId > verbose.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogsQuery {
    #[serde(default)]
    pub verbose: bool,
    pub session_id: Option<SessionId>,
    pub parent_id: Option<LogId>,
}

/// A single entry plus its direct children, for GET /api/logs/{id}.
#[derive(Debug, Serialize)]
pub struct LogDetail {
    #[serde(flatten)]
    pub entry: LogEntry,
    pub children: Vec<LogEntry>,
}

#[derive(Debug, Serialize)]
pub struct CreatedLog {
    pub success: bool,
    pub log: LogEntry,
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub success: bool,
    pub deleted: usize,
}

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: String,
    pub stats: Stats,
}

/// GET /api/logs
pub async fn list_logs(
    State(state): State<AppState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<LogEntry>>, ApiError> {
    let logs = if let Some(parent_id) = &query.parent_id {
        state.repo.list_by_parent(parent_id)?
    } else if let Some(session_id) = &query.session_id {
        state.repo.list_by_session(session_id)?
    } else if query.verbose {
        state.repo.list_all()?
    } else {
        state.repo.list_top_level()?
    };
    Ok(Json(logs))
}

/// GET /api/logs/{id}
pub async fn get_log(
    State(state): State<AppState>,
    Path(id): Path<LogId>,
) -> Result<Json<LogDetail>, ApiError> {
    let entry = state
        .repo
        .get(&id)?
        .ok_or_else(|| ApiError::NotFound("log not found".into()))?;
    let children = state.repo.list_by_parent(&id)?;
    Ok(Json(LogDetail { entry, children }))
}

/// POST /api/logs
pub async fn create_log(
    State(state): State<AppState>,
    Json(data): Json<NewLog>,
) -> Result<Json<CreatedLog>, ApiError> {
    let log = state.repo.insert(data)?;
    tracing::info!(id = %log.id, level = %log.level, category = %log.category, "log created");
    Ok(Json(CreatedLog { success: true, log }))
}

/// POST /api/logs/{parentId}/children
pub async fn create_child_log(
    State(state): State<AppState>,
    Path(parent_id): Path<LogId>,
    Json(data): Json<NewLog>,
) -> Result<Json<CreatedLog>, ApiError> {
    let log = state.repo.insert_child(&parent_id, data)?;
    tracing::info!(id = %log.id, parent_id = %parent_id, "child log created");
    Ok(Json(CreatedLog { success: true, log }))
}

/// DELETE /api/logs/{id}
pub async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<LogId>,
) -> Result<Json<Deleted>, ApiError> {
    let deleted = state.repo.delete(&id)?;
    tracing::info!(id = %id, deleted, "log deleted");
    Ok(Json(Deleted {
        success: true,
        deleted,
    }))
}

/// DELETE /api/logs
pub async fn clear_logs(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    state.repo.delete_all()?;
    tracing::info!("all logs cleared");
    Ok(Json(json!({ "success": true })))
}

/// GET /api/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<Vec<SessionSummary>>, ApiError> {
    Ok(Json(state.sessions.list()?))
}

/// GET /api/health
pub async fn health(State(state): State<AppState>) -> Result<Json<Health>, ApiError> {
    let stats = state.repo.stats()?;
    Ok(Json(Health {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
        environment: state.environment.clone(),
        stats,
    }))
}
