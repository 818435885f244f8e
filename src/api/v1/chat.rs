//! Chat and text completion endpoints

use axum::{extract::State, http::HeaderMap, response::Response};
use serde_json::{Map, Value};

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::request::Capability;

use super::common::run_dispatch;

/// POST /v1/chat/completions
pub async fn create_chat_completion(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Response, ApiError> {
    run_dispatch(&state, Capability::ChatCompletion, &headers, payload, None).await
}

/// POST /v1/completions
pub async fn create_completion(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Response, ApiError> {
    run_dispatch(&state, Capability::Completion, &headers, payload, None).await
}
