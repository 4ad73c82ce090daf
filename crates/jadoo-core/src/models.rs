//! Domain models for image records, enrichment, and search.

use serde::{Deserialize, Serialize};

use crate::tags::TagSet;

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

/// A row of the `images` table.
///
/// Records are created by the upload flow; this service only reads them and
/// rewrites `tags`, `description` and `embedding` together.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    /// Opaque key, rendered as text whatever the column type.
    pub id: String,
    /// Public or signed storage URL. Empty when never set.
    pub url: String,
    pub tags: TagSet,
    pub description: Option<String>,
    pub embedding: Option<Vector>,
}

impl ImageRecord {
    /// URL to enrich, or `None` when the record has no usable URL.
    pub fn enrichable_url(&self) -> Option<&str> {
        let url = self.url.trim();
        if url.is_empty() {
            None
        } else {
            Some(url)
        }
    }
}

/// Everything one enrichment run derives for an image.
#[derive(Debug, Clone)]
pub struct EnrichmentResult {
    /// Labels from the vision service.
    pub labels: Vec<String>,
    /// Entity surface forms found in the description.
    pub entities: Vec<String>,
    pub description: String,
    pub embedding: Vector,
}

impl EnrichmentResult {
    /// Labels followed by entities, exact duplicates removed.
    pub fn tags(&self) -> TagSet {
        let mut tags: TagSet = self.labels.iter().collect();
        tags.extend(&self.entities);
        tags
    }
}

/// A nearest-neighbour match returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ImageMatch {
    pub id: String,
    pub url: String,
    /// Persisted tag string, e.g. `"Car, Road"`.
    pub tags: Option<String>,
    pub description: Option<String>,
    /// Cosine similarity to the query (1.0 = identical).
    pub similarity: f64,
}

/// Raw image bytes with their MIME type, ready for a multimodal request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    pub data: Vec<u8>,
    pub mime_type: String,
}

/// A named entity extracted from text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NerEntity {
    /// The entity text as it appears in the source.
    pub text: String,
    /// The entity type label (e.g., "organization", "person").
    pub label: String,
    /// Confidence score from the NER model (0.0-1.0).
    pub score: f32,
    /// Character start offset in the source text.
    pub start: usize,
    /// Character end offset in the source text.
    pub end: usize,
}
