//! Audio endpoints; both take multipart bodies with the audio file

use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    response::Response,
};

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::request::Capability;

use super::common::{run_dispatch, split_multipart};

/// POST /v1/audio/transcriptions
pub async fn create_transcription(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (payload, attachment) = split_multipart(multipart).await?;

    run_dispatch(
        &state,
        Capability::AudioTranscription,
        &headers,
        payload,
        attachment,
    )
    .await
}

/// POST /v1/audio/translations
pub async fn create_translation(
    State(state): State<AppState>,
    _auth: RequireApiKey,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let (payload, attachment) = split_multipart(multipart).await?;

    run_dispatch(
        &state,
        Capability::AudioTranslation,
        &headers,
        payload,
        attachment,
    )
    .await
}
