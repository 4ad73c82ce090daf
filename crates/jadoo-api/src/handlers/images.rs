//! Image enrichment handler.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{ApiError, AppState};

/// Image key as sent by clients: a string or an integer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ImageId {
    Text(String),
    Number(i64),
}

impl ImageId {
    /// The key as text; integers are rendered in decimal.
    pub fn as_key(&self) -> String {
        match self {
            ImageId::Text(s) => s.trim().to_string(),
            ImageId::Number(n) => n.to_string(),
        }
    }
}

/// Request body for enriching an image.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateImageInfoRequest {
    /// Key of the record in the `images` table (required).
    pub id: Option<ImageId>,
}

/// Generic message response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// Enrich an image record with labels, description, entities and embedding.
///
/// # Returns
/// - 200 OK once tags, description and embedding are persisted
/// - 400 Bad Request if `id` is missing or empty
/// - 404 Not Found if the record does not exist or has no URL
/// - 415 Unsupported Media Type if the image is not JPEG or PNG
/// - 500 Internal Server Error if a service call or the write fails
#[utoipa::path(post, path = "/update_image_info", tag = "Images",
    request_body = UpdateImageInfoRequest,
    responses(
        (status = 200, description = "Image enriched", body = MessageResponse),
        (status = 400, description = "Missing image id", body = MessageResponse),
        (status = 404, description = "Image URL not found", body = MessageResponse),
        (status = 415, description = "Unsupported image type", body = MessageResponse),
        (status = 500, description = "Service or persistence failure", body = MessageResponse),
    ))]
pub async fn update_image_info(
    State(state): State<AppState>,
    payload: Result<Json<UpdateImageInfoRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let id = req
        .id
        .map(|id| id.as_key())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Image ID is required.".to_string()))?;

    state.enrichment.enrich(&id).await?;

    Ok(Json(MessageResponse {
        message: "Image info updated successfully.".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_id_accepts_string_and_number() {
        let req: UpdateImageInfoRequest = serde_json::from_str(r#"{"id":"img-1"}"#).unwrap();
        assert_eq!(req.id.unwrap().as_key(), "img-1");

        let req: UpdateImageInfoRequest = serde_json::from_str(r#"{"id":42}"#).unwrap();
        assert_eq!(req.id.unwrap().as_key(), "42");

        let req: UpdateImageInfoRequest = serde_json::from_str(r#"{}"#).unwrap();
        assert!(req.id.is_none());

        let req: UpdateImageInfoRequest = serde_json::from_str(r#"{"id":null}"#).unwrap();
        assert!(req.id.is_none());
    }
}
