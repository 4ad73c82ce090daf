//! # jadoo-core
//!
//! Core types, traits, and abstractions for the jadoo image backend.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the database, inference, and API crates depend on.

pub mod defaults;
pub mod error;
pub mod media;
pub mod models;
pub mod prompt;
pub mod tags;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result, Stage};
pub use media::{detect_image_type, media_type_from_url, ImageMediaType};
pub use models::*;
pub use prompt::{build_question_prompt, DESCRIBE_IMAGE_PROMPT};
pub use tags::{normalize_tag, TagSet, TAG_DELIMITER};
pub use traits::*;
