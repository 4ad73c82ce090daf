//! # jadoo-api
//!
//! HTTP API for the jadoo image backend.
//!
//! | Route | Operation |
//! |---|---|
//! | `POST /update_image_info` | enrich a stored image (labels, description, entities, embedding) |
//! | `POST /search_similar_images` | text-to-image similarity search |
//! | `POST /chatbot` | ask a question about an image |
//! | `GET /health` | liveness probe |
//! | `GET /docs` | Swagger UI (`/api-docs/openapi.json`) |

pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use jadoo_core::defaults::REQUEST_BODY_LIMIT_BYTES;

pub use config::{AppConfig, ConfigError};
pub use error::ApiError;
pub use services::{ChatService, EnrichmentOptions, EnrichmentService, SearchService};

/// Shared application state. Services are stateless and shared without
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub enrichment: Arc<EnrichmentService>,
    pub search: Arc<SearchService>,
    pub chat: Arc<ChatService>,
}

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "jadoo API", description = "Image enrichment, similarity search, and visual Q&A"),
    paths(
        handlers::images::update_image_info,
        handlers::search::search_similar_images,
        handlers::chat::chatbot,
        handlers::health_check,
    ),
    components(schemas(
        handlers::UpdateImageInfoRequest,
        handlers::ImageId,
        handlers::MessageResponse,
        handlers::SearchSimilarImagesRequest,
        handlers::ChatbotRequest,
        handlers::ChatbotResponse,
        jadoo_core::ImageMatch,
    )),
    tags(
        (name = "Images", description = "Image enrichment"),
        (name = "Search", description = "Similarity search"),
        (name = "Chat", description = "Visual question answering"),
        (name = "System", description = "Health"),
    )
)]
pub struct ApiDoc;

/// Parse configured CORS origins, skipping invalid entries.
pub fn parse_allowed_origins(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

/// Build the application router with all middleware.
pub fn build_router(state: AppState, allowed_origins: Vec<HeaderValue>) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/update_image_info", post(handlers::update_image_info))
        .route("/search_similar_images", post(handlers::search_similar_images))
        .route("/chatbot", post(handlers::chatbot))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(allowed_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
                .max_age(Duration::from_secs(3600)),
        )
        .layer(RequestBodyLimitLayer::new(REQUEST_BODY_LIMIT_BYTES))
        .with_state(state)
}
