//! In-memory doubles for the collaborator contracts.
//!
//! Always compiled (not `#[cfg(test)]`) so integration tests in `tests/`
//! and downstream crates can exercise the lifecycle engine without a
//! database or a filesystem. Both doubles support failure injection for
//! the error paths the lifecycle contract cares about.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use deck_core::{
    AttachmentStore, Card, CardColumn, CardFilter, CardRecord, CardRepository, Error, Result,
    SortOrder,
};

/// In-memory `AttachmentStore` with put counting and failure injection.
#[derive(Default)]
pub struct MemoryAttachmentStore {
    objects: Mutex<HashMap<String, Vec<u8>>>,
    put_calls: AtomicUsize,
    fail_put_prefix: Mutex<Option<String>>,
    fail_deletes: AtomicBool,
}

impl MemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an object directly, bypassing `put` accounting.
    pub async fn seed(&self, path: &str, data: &[u8]) {
        self.objects
            .lock()
            .expect("lock poisoned")
            .insert(path.to_string(), data.to_vec());
    }

    /// Make every `put` under the given key prefix fail with an I/O error.
    pub fn fail_puts_under(&self, prefix: &str) {
        *self.fail_put_prefix.lock().expect("lock poisoned") = Some(prefix.to_string());
    }

    /// Make every `delete` fail with an I/O error.
    pub fn fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Number of `put` calls received, including failed ones.
    pub fn put_calls(&self) -> usize {
        self.put_calls.load(Ordering::SeqCst)
    }

    pub async fn contains(&self, path: &str) -> bool {
        self.objects
            .lock()
            .expect("lock poisoned")
            .contains_key(path)
    }

    pub async fn object_count(&self) -> usize {
        self.objects.lock().expect("lock poisoned").len()
    }
}

#[async_trait]
impl AttachmentStore for MemoryAttachmentStore {
    async fn put(&self, object_key: &str, data: &[u8]) -> Result<String> {
        self.put_calls.fetch_add(1, Ordering::SeqCst);
        let fail = self
            .fail_put_prefix
            .lock()
            .expect("lock poisoned")
            .as_deref()
            .is_some_and(|prefix| object_key.starts_with(prefix));
        if fail {
            return Err(Error::AttachmentIo(format!(
                "injected put failure: {}",
                object_key
            )));
        }
        self.objects
            .lock()
            .expect("lock poisoned")
            .insert(object_key.to_string(), data.to_vec());
        Ok(object_key.to_string())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(Error::AttachmentIo(format!(
                "injected delete failure: {}",
                path
            )));
        }
        // Absent is success: delete is idempotent.
        self.objects.lock().expect("lock poisoned").remove(path);
        Ok(())
    }

    async fn signed_read_url(&self, path: &str, ttl_secs: u64) -> Result<String> {
        if !self.contains(path).await {
            return Err(Error::AttachmentIo(format!("no object at path: {}", path)));
        }
        Ok(format!("memory://{}?ttl={}", path, ttl_secs))
    }
}

/// In-memory `CardRepository` with write-failure injection.
#[derive(Default)]
pub struct MemoryCardRepository {
    cards: Mutex<HashMap<Uuid, Card>>,
    fail_writes: AtomicBool,
}

impl MemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every insert/update/delete fail with a persistence error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn card_count(&self) -> usize {
        self.cards.lock().expect("lock poisoned").len()
    }

    /// Insert with a fixed id and timestamp, for deterministic ordering
    /// tests (tie-breaks).
    pub async fn seed_card(&self, id: Uuid, created_at: DateTime<Utc>, record: CardRecord) -> Card {
        let card = build_card(id, created_at, record);
        self.cards
            .lock()
            .expect("lock poisoned")
            .insert(id, card.clone());
        card
    }

    fn check_writes(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::Persistence("injected write failure".to_string()));
        }
        Ok(())
    }
}

fn build_card(id: Uuid, created_at: DateTime<Utc>, record: CardRecord) -> Card {
    let f = record.fields;
    Card {
        id,
        output_image_path: record.output_image_path,
        reference_image_path: record.reference_image_path,
        prompt: f.prompt,
        metadata: f.metadata,
        client: f.client,
        model: f.model,
        seed: f.seed,
        llm_used: f.llm_used,
        notes: f.notes,
        is_favorited: f.is_favorited,
        created_at,
    }
}

#[async_trait]
impl CardRepository for MemoryCardRepository {
    async fn insert(&self, record: CardRecord) -> Result<Card> {
        self.check_writes()?;
        let card = build_card(Uuid::now_v7(), Utc::now(), record);
        self.cards
            .lock()
            .expect("lock poisoned")
            .insert(card.id, card.clone());
        Ok(card)
    }

    async fn get(&self, id: Uuid) -> Result<Card> {
        self.cards
            .lock()
            .expect("lock poisoned")
            .get(&id)
            .cloned()
            .ok_or(Error::CardNotFound(id))
    }

    async fn update(&self, id: Uuid, record: CardRecord) -> Result<Card> {
        self.check_writes()?;
        let mut cards = self.cards.lock().expect("lock poisoned");
        let existing = cards.get(&id).ok_or(Error::CardNotFound(id))?;
        // id and created_at are immutable across updates
        let card = build_card(id, existing.created_at, record);
        cards.insert(id, card.clone());
        Ok(card)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.check_writes()?;
        self.cards
            .lock()
            .expect("lock poisoned")
            .remove(&id)
            .map(|_| ())
            .ok_or(Error::CardNotFound(id))
    }

    async fn list(&self, filter: &CardFilter) -> Result<Vec<Card>> {
        let cards = self.cards.lock().expect("lock poisoned");
        let mut result: Vec<Card> = cards
            .values()
            .filter(|c| filter.client.as_deref().map_or(true, |v| c.client == v))
            .filter(|c| filter.model.as_deref().map_or(true, |v| c.model == v))
            .filter(|c| !filter.favorites_only || c.is_favorited)
            .cloned()
            .collect();
        result.sort_by(|a, b| {
            let by_time = match filter.sort {
                SortOrder::Newest => b.created_at.cmp(&a.created_at),
                SortOrder::Oldest => a.created_at.cmp(&b.created_at),
            };
            by_time.then(a.id.cmp(&b.id))
        });
        Ok(result)
    }

    async fn set_favorite(&self, id: Uuid, value: bool) -> Result<Card> {
        self.check_writes()?;
        let mut cards = self.cards.lock().expect("lock poisoned");
        let card = cards.get_mut(&id).ok_or(Error::CardNotFound(id))?;
        card.is_favorited = value;
        Ok(card.clone())
    }

    async fn distinct_values(&self, column: CardColumn) -> Result<Vec<String>> {
        let cards = self.cards.lock().expect("lock poisoned");
        let values: BTreeSet<String> = cards
            .values()
            .map(|c| match column {
                CardColumn::Client => c.client.clone(),
                CardColumn::Model => c.model.clone(),
            })
            .collect();
        Ok(values.into_iter().collect())
    }
}
