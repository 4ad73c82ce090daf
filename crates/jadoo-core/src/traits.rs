//! Core traits for jadoo abstractions.
//!
//! These traits define the interfaces that concrete implementations
//! must satisfy, enabling pluggable backends and testability. All
//! implementations are stateless with respect to requests and are shared
//! across handlers behind `Arc`.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::*;
use crate::tags::TagSet;

// =============================================================================
// IMAGE REPOSITORY
// =============================================================================

/// Data store access for image records.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Fetch a record by key. `Ok(None)` when no row matches.
    async fn get(&self, id: &str) -> Result<Option<ImageRecord>>;

    /// Write tags, description and embedding in one statement.
    ///
    /// Fails with `Error::Persistence` if no row matched, so a write can
    /// never be silently dropped.
    async fn save_enrichment(
        &self,
        id: &str,
        tags: &TagSet,
        description: &str,
        embedding: &Vector,
    ) -> Result<()>;

    /// Nearest neighbours of `embedding` with cosine similarity above
    /// `threshold`, best first.
    async fn match_images(
        &self,
        embedding: &Vector,
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<ImageMatch>>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend detecting labels for an image reachable by URL.
#[async_trait]
pub trait LabelBackend: Send + Sync {
    /// Short descriptive labels, most confident first.
    async fn detect_labels(&self, image_url: &str) -> Result<Vec<String>>;
}

/// Backend for describing images and answering questions about them.
#[async_trait]
pub trait VisionBackend: Send + Sync {
    /// Send the image and a prompt; returns the first text segment produced.
    async fn describe_image(&self, image: &ImagePayload, prompt: &str) -> Result<String>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend for generating text embeddings.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Backend trait for named entity recognition.
#[async_trait]
pub trait NerBackend: Send + Sync {
    /// Extract named entities from text.
    async fn extract(
        &self,
        text: &str,
        entity_types: &[&str],
        threshold: Option<f32>,
    ) -> Result<Vec<NerEntity>>;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}

/// Downloads image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the image at `url`. Non-success transfer status is an error.
    async fn fetch(&self, url: &str) -> Result<ImagePayload>;
}
