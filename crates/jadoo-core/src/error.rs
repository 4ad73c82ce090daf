//! Error types for jadoo.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using jadoo's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Enrichment pipeline stage that calls an external service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Vision label detection.
    LabelDetection,
    /// Vision-language description of the image.
    Description,
    /// Named entity extraction over the description.
    EntityExtraction,
    /// Text embedding of the description.
    Embedding,
}

impl Stage {
    /// Stable identifier used in structured logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LabelDetection => "label_detection",
            Self::Description => "description",
            Self::EntityExtraction => "entity_extraction",
            Self::Embedding => "embedding",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LabelDetection => write!(f, "Label detection"),
            Self::Description => write!(f, "Description generation"),
            Self::EntityExtraction => write!(f, "Entity extraction"),
            Self::Embedding => write!(f, "Embedding generation"),
        }
    }
}

/// Core error type for jadoo operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed required request field
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Referenced record (or its URL) is absent
    #[error("Not found: {0}")]
    NotFound(String),

    /// Image format is not one the description model accepts
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// An external AI service call failed during the named stage
    #[error("{stage} failed: {message}")]
    Service { stage: Stage, message: String },

    /// Data store write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Image download failed
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// Query embedding or vector search failed
    #[error("Search error: {0}")]
    Search(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP/network request failed before a response was received
    #[error("Request error: {0}")]
    Request(String),

    /// Upstream service answered with a non-success status
    #[error("Upstream returned {status}: {message}")]
    Upstream { status: u16, message: String },

    /// External call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Attribute an error raised by a collaborator to a pipeline stage.
    ///
    /// Errors that already carry a typed kind (media type, service) pass
    /// through unchanged so the first classification wins.
    pub fn at_stage(self, stage: Stage) -> Self {
        match self {
            Error::Service { .. } | Error::UnsupportedMediaType(_) => self,
            other => Error::Service {
                stage,
                message: other.to_string(),
            },
        }
    }

    /// Whether a retry of the same call may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Upstream { status, .. } => *status == 429 || (500..=599).contains(status),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else if e.is_decode() {
            Error::Serialization(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
