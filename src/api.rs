//! Inbound HTTP surface.
//!
//! - `GET /api/hubcloud?url=<link>` runs one extraction
//! - `GET /` prints a usage banner

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

use crate::classifier::StreamLink;
use crate::error::ApiError;
use crate::extractor::Extractor;

pub const SOURCE: &str = "custom-hubcloud-api";
pub const BANNER: &str = "Hubcloud Extractor API is running. Use /api/hubcloud?url=YOUR_LINK";

const MISSING_URL: &str = "Missing \"url\" query parameter.";
const EXTRACTION_FAILED: &str = "An error occurred during extraction.";

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub extractor: Arc<Extractor>,
    pub permits: Arc<Semaphore>,
    pub extract_timeout: Duration,
}

impl AppState {
    pub fn new(extractor: Extractor, max_concurrent: usize, extract_timeout: Duration) -> Self {
        Self {
            extractor: Arc::new(extractor),
            permits: Arc::new(Semaphore::new(max_concurrent)),
            extract_timeout,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ExtractionResponse {
    pub success: bool,
    pub links: Vec<StreamLink>,
    pub count: usize,
    pub source: String,
}

impl ExtractionResponse {
    pub fn new(links: Vec<StreamLink>) -> Self {
        Self {
            success: true,
            count: links.len(),
            links,
            source: SOURCE.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/api/hubcloud", get(hubcloud_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler() -> &'static str {
    BANNER
}

pub async fn hubcloud_handler(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let Some(url) = params.get("url").filter(|url| !url.is_empty()).cloned() else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                success: false,
                message: MISSING_URL.to_string(),
                error: None,
            }),
        )
            .into_response();
    };

    match run_extraction(&state, url).await {
        Ok(links) => Json(ExtractionResponse::new(links)).into_response(),
        Err(e) => {
            error!(error = %e, "API error");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    success: false,
                    message: EXTRACTION_FAILED.to_string(),
                    error: Some(e.to_string()),
                }),
            )
                .into_response()
        }
    }
}

/// Run one extraction on its own task, bounded by the permit pool.
///
/// The token is cancelled when this future is dropped (client went away)
/// or when the deadline passes, whichever comes first.
async fn run_extraction(state: &AppState, url: String) -> Result<Vec<StreamLink>, ApiError> {
    let _permit = state.permits.clone().acquire_owned().await?;

    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    let deadline = state.extract_timeout;
    let watchdog = cancel.clone();
    tokio::spawn(async move {
        tokio::select! {
            _ = tokio::time::sleep(deadline) => {
                debug!(?deadline, "extraction deadline reached");
                watchdog.cancel();
            }
            _ = watchdog.cancelled() => {}
        }
    });

    let extractor = state.extractor.clone();
    let task_cancel = cancel.clone();
    let links = tokio::spawn(async move { extractor.extract(&url, &task_cancel).await }).await?;
    Ok(links)
}
