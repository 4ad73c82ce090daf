//! Similarity search over enriched images.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use jadoo_core::defaults::{SEARCH_LIMIT, SEARCH_LIMIT_MAX, SIMILARITY_THRESHOLD};
use jadoo_core::{EmbeddingBackend, Error, ImageMatch, ImageRepository, Result};

/// Embeds free text and delegates nearest-neighbour lookup to the store.
pub struct SearchService {
    repo: Arc<dyn ImageRepository>,
    embeddings: Arc<dyn EmbeddingBackend>,
    threshold: f64,
}

impl SearchService {
    pub fn new(repo: Arc<dyn ImageRepository>, embeddings: Arc<dyn EmbeddingBackend>) -> Self {
        Self {
            repo,
            embeddings,
            threshold: SIMILARITY_THRESHOLD,
        }
    }

    /// Images whose embedding is similar to `query`, best match first.
    ///
    /// `limit` defaults to 5; non-positive values are rejected and values
    /// above the maximum are clamped.
    pub async fn search(&self, query: &str, limit: Option<i64>) -> Result<Vec<ImageMatch>> {
        let start = Instant::now();
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidRequest("Query is required.".to_string()));
        }
        let limit = resolve_limit(limit)?;

        let embedding = self
            .embeddings
            .embed_texts(&[query.to_string()])
            .await
            .map_err(|e| Error::Search(format!("query embedding failed: {}", e)))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Search("query embedding failed: no vector returned".to_string()))?;

        let matches = self
            .repo
            .match_images(&embedding, self.threshold, limit)
            .await
            .map_err(|e| Error::Search(format!("vector search failed: {}", e)))?;

        debug!(
            subsystem = "api",
            component = "search",
            op = "match_images",
            limit,
            result_count = matches.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Similarity search complete"
        );
        Ok(matches)
    }
}

/// Apply the default and the upper bound to a requested result count.
pub fn resolve_limit(limit: Option<i64>) -> Result<i64> {
    match limit {
        None => Ok(SEARCH_LIMIT),
        Some(n) if n <= 0 => Err(Error::InvalidRequest(
            "limit must be a positive integer".to_string(),
        )),
        Some(n) => Ok(n.min(SEARCH_LIMIT_MAX)),
    }
}
