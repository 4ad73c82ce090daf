//! # jadoo-inference
//!
//! External AI service backends for jadoo.
//!
//! This crate provides:
//! - Gemini backend for image description, question answering, and text
//!   embeddings
//! - Cloud Vision backend for label detection
//! - GLiNER sidecar client for named entity extraction
//! - HTTP image fetcher with media type detection
//! - Bounded retry with exponential backoff for transient failures
//!
//! # Example
//!
//! ```rust,no_run
//! use jadoo_inference::{GeminiBackend, GeminiConfig};
//! use jadoo_core::EmbeddingBackend;
//!
//! #[tokio::main]
//! async fn main() {
//!     let backend = GeminiBackend::new(GeminiConfig::new("api-key")).unwrap();
//!     let texts = vec!["A red car parked by the sea".to_string()];
//!     let vectors = backend.embed_texts(&texts).await.unwrap();
//! }
//! ```

pub mod fetch;
pub mod gemini;
pub mod gliner;
pub mod labels;
pub mod retry;

// Re-export core types
pub use jadoo_core::*;

pub use fetch::HttpImageFetcher;
pub use gemini::{GeminiBackend, GeminiConfig};
pub use gliner::GlinerBackend;
pub use labels::{CloudVisionBackend, CloudVisionConfig};
pub use retry::RetryPolicy;
