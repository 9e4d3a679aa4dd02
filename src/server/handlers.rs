//! HTTP request handlers and routing

use super::error::ApiError;
use crate::pipeline::Ingestor;
use crate::protocol::{
    is_safe_report_name, routes, CleanupResponse, HealthResponse, ReadingsResponse,
    StartResponse, StatusResponse, API_VERSION,
};
use crate::session::{ReleaseOutcome, SessionManager, SessionOutcome};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppContext {
    pub manager: Arc<SessionManager>,
    pub ingestor: Arc<Ingestor>,

    /// Directory `GET /reports/:filename` serves from
    pub report_dir: PathBuf,

    pub max_upload_bytes: usize,
}

impl AppContext {
    pub fn new(ingestor: Arc<Ingestor>, max_upload_bytes: usize) -> Self {
        let manager = Arc::clone(ingestor.manager());
        let report_dir = manager.report_dir().to_path_buf();
        Self {
            manager,
            ingestor,
            report_dir,
            max_upload_bytes,
        }
    }
}

/// Build the router with all routes
pub fn create_router(ctx: AppContext) -> Router {
    let max_upload_bytes = ctx.max_upload_bytes;

    Router::new()
        .route(routes::HEALTH, get(health))
        .route(routes::READINGS, post(post_reading))
        .route(routes::SESSION_START, post(start_session))
        .route(routes::SESSION_END, post(end_session))
        .route(routes::SESSION_STATUS, get(session_status))
        .route(routes::SESSION_CLEANUP, post(cleanup_session))
        .route(&format!("{}/:filename", routes::REPORTS), get(get_report))
        .with_state(ctx)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        // The browser extension posts from its own origin
        .layer(CorsLayer::permissive())
}

/// GET /health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        api_version: API_VERSION,
    })
}

/// POST /readings - body is one screenshot
async fn post_reading(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<Json<ReadingsResponse>, ApiError> {
    let outcome = ctx.ingestor.ingest(body.to_vec()).await?;

    tracing::info!(
        "Screenshot {:?}: {} reading(s) for session {}",
        outcome.source_image.file_name().unwrap_or_default(),
        outcome.readings.len(),
        outcome.session_id
    );

    Ok(Json(ReadingsResponse {
        session_id: outcome.session_id,
        readings: outcome.readings,
        session: ctx.manager.status().await,
    }))
}

/// POST /session/start
async fn start_session(State(ctx): State<AppContext>) -> Json<StartResponse> {
    let session_id = ctx.manager.start().await;
    Json(StartResponse { session_id })
}

/// POST /session/end - summary, report and cleanup result
async fn end_session(State(ctx): State<AppContext>) -> Result<Json<SessionOutcome>, ApiError> {
    let outcome = ctx.manager.end().await?;
    Ok(Json(outcome))
}

/// GET /session/status
async fn session_status(State(ctx): State<AppContext>) -> Json<StatusResponse> {
    let session = ctx.manager.status().await;
    Json(StatusResponse {
        active: session.is_some(),
        session,
    })
}

/// POST /session/cleanup - delete files and reset without a report
async fn cleanup_session(State(ctx): State<AppContext>) -> Json<CleanupResponse> {
    let response = match ctx.manager.abort().await {
        Some(outcome) => CleanupResponse {
            session: Some(outcome.summary),
            release: outcome.release,
        },
        None => CleanupResponse {
            session: None,
            release: ReleaseOutcome::default(),
        },
    };
    Json(response)
}

/// GET /reports/:filename - serve a persisted report
async fn get_report(
    State(ctx): State<AppContext>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    if !is_safe_report_name(&filename) {
        return Err(ApiError::BadRequest(format!(
            "Invalid report name '{}'",
            filename
        )));
    }

    let path = ctx.report_dir.join(&filename);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ApiError::NotFound(format!("Report '{}'", filename)));
        }
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    if filename.ends_with(".html") {
        Ok(Html(content).into_response())
    } else {
        Ok((
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response())
    }
}
