//! Cache administration endpoints

use axum::{extract::State, http::StatusCode};
use serde::Serialize;
use tracing::info;

use crate::api::middleware::RequireApiKey;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json};

#[derive(Debug, Serialize)]
pub struct CacheStatsResponse {
    pub enabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries: Option<usize>,
}

/// GET /admin/cache/stats
pub async fn cache_stats(
    State(state): State<AppState>,
    _auth: RequireApiKey,
) -> Result<Json<CacheStatsResponse>, ApiError> {
    let Some(cache) = &state.cache else {
        return Ok(Json(CacheStatsResponse {
            enabled: false,
            entries: None,
        }));
    };

    let entries = cache.len().await?;

    Ok(Json(CacheStatsResponse {
        enabled: true,
        entries: Some(entries),
    }))
}

/// POST /admin/cache/purge
pub async fn purge_cache(
    State(state): State<AppState>,
    _auth: RequireApiKey,
) -> Result<StatusCode, ApiError> {
    let Some(cache) = &state.cache else {
        return Ok(StatusCode::NO_CONTENT);
    };

    cache.clear().await?;
    info!("Cache purged");

    Ok(StatusCode::NO_CONTENT)
}
