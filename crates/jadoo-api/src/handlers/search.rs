//! Similarity search handler.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

use jadoo_core::ImageMatch;

use crate::{ApiError, AppState};

/// Request body for similarity search.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchSimilarImagesRequest {
    /// Free-text description of the wanted images (required).
    pub query: Option<String>,
    /// Maximum number of results (default 5, at most 100).
    pub limit: Option<i64>,
}

/// Find enriched images whose description is similar to the query.
///
/// Matches have cosine similarity above 0.7 and are ordered best first.
#[utoipa::path(post, path = "/search_similar_images", tag = "Search",
    request_body = SearchSimilarImagesRequest,
    responses(
        (status = 200, description = "Matching images", body = [ImageMatch]),
        (status = 400, description = "Missing query or invalid limit"),
        (status = 500, description = "Embedding or vector search failure"),
    ))]
pub async fn search_similar_images(
    State(state): State<AppState>,
    payload: Result<Json<SearchSimilarImagesRequest>, JsonRejection>,
) -> Result<Json<Vec<ImageMatch>>, ApiError> {
    let Json(req) = payload?;
    let query = req
        .query
        .filter(|q| !q.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query is required.".to_string()))?;

    let matches = state.search.search(&query, req.limit).await?;
    Ok(Json(matches))
}
