use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::extractor::service::now_rfc3339;
use crate::extractor::{ExtractionRequest, ExtractionResult, ExtractionService};

const SERVICE_NAME: &str = "Universal Video Extractor Engine";
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    service: Arc<ExtractionService>,
    default_timeout: i64,
}

impl AppState {
    pub fn new(service: ExtractionService, default_timeout: i64) -> Self {
        Self {
            service: Arc::new(service),
            default_timeout,
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/health", get(health))
        .route("/api/extract", post(extract))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: "Universal Video Extraction Engine",
        version: VERSION,
        api: "/api/extract",
        health: "/api/health",
    })
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let invoker = state.service.invoker();
    let yt_dlp_version = invoker
        .tool()
        .version(invoker.runner())
        .await
        .unwrap_or_else(|| "Not found".to_string());

    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        version: VERSION,
        yt_dlp_version,
        timestamp: now_rfc3339(),
    })
}

async fn extract(
    State(state): State<AppState>,
    payload: Result<Json<ExtractionRequest>, JsonRejection>,
) -> Result<Json<ExtractionResult>, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let timeout = request.timeout_or(state.default_timeout);

    let preview: String = request.url.chars().take(50).collect();
    info!(url = %preview, timeout, "extract request");

    // Run in its own task so a panic inside extraction becomes a 500 response
    let service = state.service.clone();
    let result = tokio::spawn(async move { service.extract(&request.url, timeout).await })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if !result.success {
        return Err(ApiError::ExtractionFailed(
            result
                .error_message
                .unwrap_or_else(|| "Extraction failed".to_string()),
        ));
    }

    info!(
        video = result.total_video_streams,
        audio = result.total_audio_streams,
        "extract request succeeded"
    );
    Ok(Json(result))
}

#[derive(Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
    api: &'static str,
    health: &'static str,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    yt_dlp_version: String,
    timestamp: String,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),
    #[error("{0}")]
    ExtractionFailed(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_kind(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::InvalidRequest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_REQUEST"),
            ApiError::ExtractionFailed(_) => (StatusCode::BAD_REQUEST, "EXTRACTION_FAILED"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind) = self.status_and_kind();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: self.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}
