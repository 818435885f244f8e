//! OpenAI-style v1 surface

use axum::{routing::post, Router};

use super::state::AppState;

pub mod audio;
pub mod chat;
mod common;
pub mod embeddings;
pub mod images;

pub use common::CACHE_STATUS_HEADER;

pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        .route("/chat/completions", post(chat::create_chat_completion))
        .route("/completions", post(chat::create_completion))
        .route("/embeddings", post(embeddings::create_embeddings))
        .route("/audio/transcriptions", post(audio::create_transcription))
        .route("/audio/translations", post(audio::create_translation))
        .route("/images/generations", post(images::create_image))
        .route("/images/edits", post(images::create_image_edit))
        .route("/images/variations", post(images::create_image_variation))
}
