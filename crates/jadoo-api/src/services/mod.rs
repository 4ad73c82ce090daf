//! Request-independent business logic shared by the HTTP handlers.

pub mod chat;
pub mod enrichment;
pub mod search;

pub use chat::ChatService;
pub use enrichment::{EnrichmentOptions, EnrichmentService, IMAGE_URL_NOT_FOUND};
pub use search::{resolve_limit, SearchService};
