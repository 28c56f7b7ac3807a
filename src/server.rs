//! HTTP server setup and configuration.
//!
//! This module provides the router and application state used by both
//! the production server and integration tests.

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Multipart, Path, State},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::api::{self, GenerateRequest};
use crate::error::ApiError;
use crate::models::{AppConfig, Credentials};
use crate::services::{
    ArkClient, BackgroundRemover, CompressService, GenerationHistory, ImageFetcher,
    ImageGenerator, ImageRecognizer, RemoveBgClient,
};

/// Room for multipart boundaries and text fields on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub compressor: Arc<CompressService>,
    pub generator: Arc<dyn ImageGenerator>,
    pub recognizer: Arc<dyn ImageRecognizer>,
    pub background_remover: Arc<dyn BackgroundRemover>,
    pub fetcher: Arc<ImageFetcher>,
    pub history: Arc<GenerationHistory>,
}

/// Create application state with the real vendor clients.
///
/// Missing API keys are not an error here; the affected endpoints report
/// them when called.
pub fn create_app_state(config: AppConfig, credentials: Credentials) -> anyhow::Result<AppState> {
    let ark = Arc::new(
        ArkClient::new(&config.vendors.ark, credentials.ark)
            .map_err(|e| anyhow::anyhow!("Failed to create Ark client: {e}"))?,
    );
    let remove_bg = Arc::new(
        RemoveBgClient::new(&config.vendors.remove_bg, credentials.remove_bg)
            .map_err(|e| anyhow::anyhow!("Failed to create remove.bg client: {e}"))?,
    );
    let fetcher = Arc::new(
        ImageFetcher::new(config.vendors.ark.timeout())
            .map_err(|e| anyhow::anyhow!("Failed to create image fetcher: {e}"))?,
    );

    if !ark.has_credential() {
        tracing::warn!("ARK_API_KEY not set, generation and recognition will fail");
    }
    if !remove_bg.has_credential() {
        tracing::warn!("REMOVE_BG_API_KEY not set, background removal will fail");
    }

    let history = Arc::new(GenerationHistory::new(config.history.capacity));

    Ok(AppState {
        config: Arc::new(config),
        compressor: Arc::new(CompressService::new()),
        generator: ark.clone(),
        recognizer: ark,
        background_remover: remove_bg,
        fetcher,
        history,
    })
}

/// Build the API router with all endpoints and middleware.
///
/// This is the core router used by both production and tests.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.uploads.largest() + MULTIPART_OVERHEAD;

    Router::new()
        .route("/", get(api::handle_index))
        .route("/api/compress", post(handle_compress))
        .route("/api/remove-bg", post(handle_remove_bg))
        .route("/api/image-recognition", post(handle_recognize))
        .route("/api/ai-generate", post(handle_generate))
        .route(
            "/api/ai-generate/history",
            get(handle_history).delete(handle_clear_history),
        )
        .route("/api/ai-generate/history/:id/download", get(handle_download))
        // Health check
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
}

// Wrapper handlers to extract state components for the underlying API handlers

async fn handle_compress(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    api::handle_compress(State(state.config), State(state.compressor), multipart).await
}

async fn handle_remove_bg(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    api::handle_remove_bg(
        State(state.config),
        State(state.background_remover),
        multipart,
    )
    .await
}

async fn handle_recognize(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_recognize(State(state.config), State(state.recognizer), multipart).await
}

async fn handle_generate(
    State(state): State<AppState>,
    body: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    api::handle_generate(State(state.generator), State(state.history), body).await
}

async fn handle_history(State(state): State<AppState>) -> impl IntoResponse {
    api::handle_history(State(state.history)).await
}

async fn handle_clear_history(State(state): State<AppState>) -> impl IntoResponse {
    api::handle_clear_history(State(state.history)).await
}

async fn handle_download(
    State(state): State<AppState>,
    path: Path<u64>,
) -> Result<Response, ApiError> {
    api::handle_download(State(state.history), State(state.fetcher), path).await
}
