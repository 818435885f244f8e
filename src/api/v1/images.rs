//! Image endpoints; generation is JSON, edits and variations carry the
//! source image as multipart

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::Response,
};
use serde_json::{Map, Value};

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};
use crate::domain::request::Capability;

use super::common::{run_dispatch, split_multipart};

/// POST /v1/images/generations
pub async fn create_image(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    Json(payload): Json<Map<String, Value>>,
) -> Result<Response, ApiError> {
    run_dispatch(&state, Capability::ImageGeneration, &headers, payload, None).await
}

/// POST /v1/images/edits
pub async fn create_image_edit(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (payload, attachment) = split_multipart(multipart).await?;

    run_dispatch(&state, Capability::ImageEdit, &headers, payload, attachment).await
}

/// POST /v1/images/variations
pub async fn create_image_variation(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (payload, attachment) = split_multipart(multipart).await?;

    run_dispatch(
        &state,
        Capability::ImageVariation,
        &headers,
        payload,
        attachment,
    )
    .await
}
