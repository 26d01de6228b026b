//! # deck-core
//!
//! Core types, traits, and abstractions for promptdeck.
//!
//! This crate provides the foundational data structures and trait definitions
//! that the other promptdeck crates depend on: the card data model, the
//! attachment store and card repository contracts, the upload media policy,
//! and the shared error taxonomy.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod media;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use media::{validate_upload, UploadPolicy};
pub use models::*;
pub use traits::*;
