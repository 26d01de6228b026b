//! # deck-store
//!
//! Attachment store implementation for promptdeck: a filesystem backend
//! with atomic writes, idempotent deletes, and HMAC-signed time-limited
//! read URLs.
//!
//! ## Example
//!
//! ```rust,ignore
//! use deck_store::{FilesystemStore, UrlSigner};
//!
//! let signer = UrlSigner::new(b"secret");
//! let store = FilesystemStore::new("/var/promptdeck/objects", "http://localhost:8098", signer);
//! store.validate().await?;
//!
//! let path = store.put("output/1700000000-ab12cd34ef56.png", &bytes).await?;
//! let url = store.signed_read_url(&path, 3600).await?;
//! ```

pub mod fs;
pub mod signing;

pub use fs::FilesystemStore;
pub use signing::UrlSigner;
