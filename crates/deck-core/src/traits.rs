//! Collaborator contracts for promptdeck.
//!
//! These traits define the seams the lifecycle engine depends on, enabling
//! pluggable backends and testability: a filesystem or object store behind
//! `AttachmentStore`, PostgreSQL or an in-memory double behind
//! `CardRepository`.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Card, CardColumn, CardFilter, CardRecord};

/// Binary storage for card attachments, keyed by path string.
///
/// The lifecycle engine only ever calls this contract; retry policy and
/// timeouts belong to the implementation.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store bytes under the given object key. Returns the stored path.
    async fn put(&self, object_key: &str, data: &[u8]) -> Result<String>;

    /// Delete the object at the given path. Deleting an already-absent
    /// object is success (idempotent).
    async fn delete(&self, path: &str) -> Result<()>;

    /// Issue a time-limited read URL for the object at the given path.
    /// Fails if the object does not exist.
    async fn signed_read_url(&self, path: &str, ttl_secs: u64) -> Result<String>;
}

/// Persistence boundary for card records.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Insert a new card. Assigns the id and `created_at`.
    async fn insert(&self, record: CardRecord) -> Result<Card>;

    /// Fetch a card by id. Fails with `CardNotFound` if absent.
    async fn get(&self, id: Uuid) -> Result<Card>;

    /// Replace the full field set and attachment paths of a card as a
    /// single record write. Fails with `CardNotFound` if absent.
    async fn update(&self, id: Uuid, record: CardRecord) -> Result<Card>;

    /// Delete a card record. Fails with `CardNotFound` if absent.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// List cards matching the filter, sorted per its sort order with ties
    /// broken by `id` ascending.
    async fn list(&self, filter: &CardFilter) -> Result<Vec<Card>>;

    /// Idempotent point update of the favorite flag.
    async fn set_favorite(&self, id: Uuid, value: bool) -> Result<Card>;

    /// Distinct values currently present in the given column, sorted
    /// ascending, no duplicates.
    async fn distinct_values(&self, column: CardColumn) -> Result<Vec<String>>;
}
