//! HTTP request handlers.

pub mod chat;
pub mod images;
pub mod search;

use axum::{response::IntoResponse, Json};

pub use chat::{chatbot, ChatbotRequest, ChatbotResponse};
pub use images::{update_image_info, ImageId, MessageResponse, UpdateImageInfoRequest};
pub use search::{search_similar_images, SearchSimilarImagesRequest};

/// Liveness probe.
#[utoipa::path(get, path = "/health", tag = "System",
    responses((status = 200, description = "Service is up")))]
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
