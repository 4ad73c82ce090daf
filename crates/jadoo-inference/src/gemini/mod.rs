//! Gemini backend.
//!
//! Implements both [`VisionBackend`](jadoo_core::VisionBackend) (multimodal
//! `generateContent` with inline image data) and
//! [`EmbeddingBackend`](jadoo_core::EmbeddingBackend) (`batchEmbedContents`)
//! against the Generative Language REST API.

mod backend;
mod types;

pub use backend::{GeminiBackend, GeminiConfig};
pub use types::*;
