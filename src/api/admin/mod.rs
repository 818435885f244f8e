use axum::{
    routing::{get, post},
    Router,
};

use super::state::AppState;

pub mod cache;

pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        .route("/cache/stats", get(cache::cache_stats))
        .route("/cache/purge", post(cache::purge_cache))
}
