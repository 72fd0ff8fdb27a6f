use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use jamesos_store::{Backend, LogRepo, SessionRepo};

use crate::handlers;

/// Server configuration.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: "development".into(),
        }
    }
}

/// Shared application state passed to Axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<LogRepo>,
    pub sessions: Arc<SessionRepo>,
    pub environment: String,
}

impl AppState {
    pub fn new(backend: Backend, environment: String) -> Self {
        Self {
            repo: Arc::new(LogRepo::new(backend.clone())),
            sessions: Arc::new(SessionRepo::new(backend)),
            environment,
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/logs",
            get(handlers::list_logs)
                .post(handlers::create_log)
                .delete(handlers::clear_logs),
        )
        .route(
            "/api/logs/{id}",
            get(handlers::get_log).delete(handlers::delete_log),
        )
        .route("/api/logs/{id}/children", post(handlers::create_child_log))
        .route("/api/sessions", get(handlers::list_sessions))
        .route("/api/health", get(handlers::health))
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Create and start the server. Returns a handle holding the bound port.
pub async fn start(config: ServerConfig, backend: Backend) -> Result<ServerHandle, std::io::Error> {
    let state = AppState::new(backend, config.environment.clone());
    let router = build_router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(port = local_addr.port(), "dashboard server started");

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });

    Ok(ServerHandle {
        port: local_addr.port(),
        _server: server_handle,
    })
}

/// Handle returned by `start()` — keeps the serve task alive.
pub struct ServerHandle {
    pub port: u16,
    _server: tokio::task::JoinHandle<()>,
}
