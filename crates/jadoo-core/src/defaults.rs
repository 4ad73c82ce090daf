//! Centralized default constants for jadoo.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP bind host.
pub const SERVER_HOST: &str = "0.0.0.0";

/// Default HTTP server port (the front end talks to `localhost:5000`).
pub const SERVER_PORT: u16 = 5000;

/// Default CORS origin (Next.js dev server).
pub const ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Maximum accepted JSON request body.
pub const REQUEST_BODY_LIMIT_BYTES: usize = 1024 * 1024;

// =============================================================================
// EXTERNAL SERVICES
// =============================================================================

/// Gemini REST endpoint (generation and embeddings).
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Cloud Vision REST endpoint.
pub const VISION_URL: &str = "https://vision.googleapis.com/v1";

/// Default vision-language model for descriptions and Q&A.
pub const GEN_MODEL: &str = "gemini-1.5-flash-002";

/// Default text embedding model.
pub const EMBED_MODEL: &str = "text-embedding-004";

/// Embedding vector dimension for the default model.
pub const EMBED_DIMENSION: usize = 768;

/// Per-call timeout for external services (seconds).
pub const SERVICE_TIMEOUT_SECS: u64 = 30;

/// Retries after the first attempt for transient service errors.
pub const SERVICE_MAX_RETRIES: u32 = 2;

/// Base delay for exponential backoff between retries (milliseconds).
pub const RETRY_BASE_DELAY_MS: u64 = 250;

/// Upper bound on a single backoff delay (milliseconds).
pub const RETRY_MAX_DELAY_MS: u64 = 4_000;

/// Maximum labels requested from the vision API.
pub const LABEL_MAX_RESULTS: u32 = 10;

// =============================================================================
// ENTITY EXTRACTION
// =============================================================================

/// Environment variable for the GLiNER sidecar base URL.
pub const ENV_GLINER_BASE_URL: &str = "GLINER_BASE_URL";

/// Minimum confidence for an extracted entity to become a tag.
pub const ENTITY_THRESHOLD: f32 = 0.5;

/// Entity categories merged into the tag set.
///
/// Geo-political entity, organization, person, location, product, event,
/// then the optional groups: nationality/religious/political group,
/// facility, law, work of art, language.
pub const ENTITY_TYPES: &[&str] = &[
    "geo-political entity",
    "organization",
    "person",
    "location",
    "product",
    "event",
    "nationality or religious or political group",
    "facility",
    "law",
    "work of art",
    "language",
];

// =============================================================================
// SEARCH
// =============================================================================

/// Default number of similar images returned.
pub const SEARCH_LIMIT: i64 = 5;

/// Largest accepted search limit; larger requests are clamped.
pub const SEARCH_LIMIT_MAX: i64 = 100;

/// Minimum cosine similarity for a match.
pub const SIMILARITY_THRESHOLD: f64 = 0.7;

// =============================================================================
// DATABASE
// =============================================================================

/// Upper bound on open database connections.
pub const DB_MAX_CONNECTIONS: u32 = 10;

/// Connections kept open while idle.
pub const DB_MIN_CONNECTIONS: u32 = 1;

/// Wait for a free connection before failing (seconds).
pub const DB_ACQUIRE_TIMEOUT_SECS: u64 = 30;

/// Close connections idle for longer than this (seconds).
pub const DB_IDLE_TIMEOUT_SECS: u64 = 600;

/// Recycle connections older than this (seconds).
pub const DB_MAX_LIFETIME_SECS: u64 = 1_800;
