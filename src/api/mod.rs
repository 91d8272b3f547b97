//! HTTP API exposing the translator.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};

use crate::error::FrankError;
use crate::translate::{TranslateOptions, Translator};

#[derive(Clone)]
pub struct AppState {
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    pub fn new(translator: Arc<dyn Translator>) -> Self {
        Self { translator }
    }
}

#[derive(Debug, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    #[serde(default = "default_source_lang")]
    pub sl: String,
    #[serde(default = "default_target_lang")]
    pub tl: String,
}

fn default_source_lang() -> String {
    "auto".to_string()
}

fn default_target_lang() -> String {
    "en".to_string()
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct TranslateResponse {
    pub translation: String,
    pub src_lang: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl From<FrankError> for ApiError {
    fn from(err: FrankError) -> Self {
        let status = match &err {
            FrankError::Transport(_) | FrankError::Decode(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/translate", post(translate))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn translate(
    State(state): State<AppState>,
    Json(req): Json<TranslateRequest>,
) -> Result<Json<TranslateResponse>, ApiError> {
    let options = TranslateOptions::new(req.sl, req.tl);
    let result = state
        .translator
        .translate(&req.text, &options)
        .await
        .inspect_err(|e| warn!("Translation via {} failed: {}", state.translator.name(), e))?;

    Ok(Json(TranslateResponse {
        translation: result.translation,
        src_lang: result.src_lang.unwrap_or_else(|| "unknown".to_string()),
    }))
}

/// Serve the API on `addr` until the process is stopped.
pub async fn serve(addr: std::net::SocketAddr, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_app(state)).await
}
