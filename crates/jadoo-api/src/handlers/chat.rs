//! Visual Q&A handler.

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{ApiError, AppState};

/// Request body for a question about an image.
#[derive(Debug, Deserialize, ToSchema)]
pub struct ChatbotRequest {
    /// The question (required).
    pub content: Option<String>,
    /// URL the image can be downloaded from (required).
    pub image_url: Option<String>,
    /// Extra context prepended to the question.
    pub context: Option<String>,
}

/// Answer from the vision-language model.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ChatbotResponse {
    pub reply: String,
}

fn required(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("{} is required.", field)))
}

/// Ask a question about an image.
#[utoipa::path(post, path = "/chatbot", tag = "Chat",
    request_body = ChatbotRequest,
    responses(
        (status = 200, description = "Model reply", body = ChatbotResponse),
        (status = 400, description = "Missing content or image_url"),
        (status = 500, description = "Image download or model failure"),
    ))]
pub async fn chatbot(
    State(state): State<AppState>,
    payload: Result<Json<ChatbotRequest>, JsonRejection>,
) -> Result<Json<ChatbotResponse>, ApiError> {
    let Json(req) = payload?;
    let content = required(req.content, "content")?;
    let image_url = required(req.image_url, "image_url")?;
    let context = req.context.unwrap_or_default();

    let reply = state.chat.ask(&content, &image_url, &context).await?;
    Ok(Json(ChatbotResponse { reply }))
}
