//! Image repository implementation.

use std::time::Instant;

use async_trait::async_trait;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, trace};

use jadoo_core::{Error, ImageMatch, ImageRecord, ImageRepository, Result, TagSet};

/// PostgreSQL implementation of ImageRepository.
///
/// Keys are compared as text (`id::text`), so integer and UUID primary keys
/// both work without the caller knowing the column type.
#[derive(Clone)]
pub struct PgImageRepository {
    pool: Pool<Postgres>,
}

impl PgImageRepository {
    /// Create a new PgImageRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageRepository for PgImageRepository {
    async fn get(&self, id: &str) -> Result<Option<ImageRecord>> {
        let row = sqlx::query(
            "SELECT id::text AS id, COALESCE(url, '') AS url, tags, description, embedding
             FROM images
             WHERE id::text = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| {
            let tags: Option<String> = row.get("tags");
            ImageRecord {
                id: row.get("id"),
                url: row.get("url"),
                tags: tags.as_deref().map(TagSet::parse).unwrap_or_default(),
                description: row.get("description"),
                embedding: row.get("embedding"),
            }
        }))
    }

    async fn save_enrichment(
        &self,
        id: &str,
        tags: &TagSet,
        description: &str,
        embedding: &Vector,
    ) -> Result<()> {
        let start = Instant::now();

        let result = sqlx::query(
            "UPDATE images
             SET tags = $2, description = $3, embedding = $4::vector
             WHERE id::text = $1",
        )
        .bind(id)
        .bind(tags.to_joined())
        .bind(description)
        .bind(embedding)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::Persistence(format!(
                "no image row matched id {}",
                id
            )));
        }

        debug!(
            subsystem = "db",
            component = "images",
            op = "save_enrichment",
            image_id = %id,
            tag_count = tags.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Enrichment persisted"
        );
        Ok(())
    }

    async fn match_images(
        &self,
        embedding: &Vector,
        threshold: f64,
        limit: i64,
    ) -> Result<Vec<ImageMatch>> {
        let rows = sqlx::query(
            "SELECT id::text AS id, COALESCE(url, '') AS url, tags, description,
                    1.0 - (embedding <=> $1::vector) AS similarity
             FROM images
             WHERE embedding IS NOT NULL
               AND 1.0 - (embedding <=> $1::vector) > $2
             ORDER BY embedding <=> $1::vector
             LIMIT $3",
        )
        .bind(embedding)
        .bind(threshold)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let matches: Vec<ImageMatch> = rows
            .into_iter()
            .map(|row| ImageMatch {
                id: row.get("id"),
                url: row.get("url"),
                tags: row.get("tags"),
                description: row.get("description"),
                similarity: row.get::<f64, _>("similarity"),
            })
            .collect();

        for m in &matches {
            trace!(image_id = %m.id, similarity = m.similarity, "Similarity match");
        }

        Ok(matches)
    }
}
