//! Card lifecycle orchestrator.
//!
//! Composes the attachment reconciler with the card repository to make
//! create/update/delete near-atomic from the caller's point of view:
//! validation first (guaranteed no-op on failure), uploads before the
//! record write, retirement of superseded objects strictly after it.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use deck_core::defaults::SIGNED_URL_TTL_SECS;
use deck_core::{
    AttachmentStore, Card, CardColumn, CardFields, CardFilter, CardRecord, CardRepository, Error,
    FilterOptions, Result, SlotIntent, UploadFile, UploadPolicy,
};

use crate::reconciler::AttachmentReconciler;

/// A card paired with time-limited read URLs for both images, ready for
/// display.
#[derive(Debug, Clone, Serialize)]
pub struct CardView {
    #[serde(flatten)]
    pub card: Card,
    pub output_image_url: String,
    pub reference_image_url: String,
}

/// The lifecycle engine's public surface: the six card operations plus
/// signed-URL views and export-ready listings.
pub struct CardService {
    repo: Arc<dyn CardRepository>,
    store: Arc<dyn AttachmentStore>,
    reconciler: AttachmentReconciler,
    url_ttl_secs: u64,
}

impl CardService {
    pub fn new(
        repo: Arc<dyn CardRepository>,
        store: Arc<dyn AttachmentStore>,
        policy: UploadPolicy,
    ) -> Self {
        let reconciler = AttachmentReconciler::new(store.clone(), policy);
        Self {
            repo,
            store,
            reconciler,
            url_ttl_secs: SIGNED_URL_TTL_SECS,
        }
    }

    pub fn with_url_ttl(mut self, ttl_secs: u64) -> Self {
        self.url_ttl_secs = ttl_secs;
        self
    }

    /// Create a card from its field set and two mandatory image files.
    ///
    /// All validation happens before any store call; if the record insert
    /// fails after upload, both just-uploaded objects are discarded
    /// (best-effort) before the error surfaces.
    pub async fn create_card(
        &self,
        fields: CardFields,
        output: Option<UploadFile>,
        reference: Option<UploadFile>,
    ) -> Result<Card> {
        fields.validate()?;
        let output = output
            .ok_or_else(|| Error::Validation("output image is required".to_string()))?;
        let reference = reference
            .ok_or_else(|| Error::Validation("reference image is required".to_string()))?;

        let (output_path, reference_path) =
            self.reconciler.upload_new_pair(&output, &reference).await?;

        let record = CardRecord {
            output_image_path: output_path.clone(),
            reference_image_path: reference_path.clone(),
            fields,
        };
        match self.repo.insert(record).await {
            Ok(card) => {
                info!(
                    subsystem = "cards",
                    component = "lifecycle",
                    op = "create_card",
                    card_id = %card.id,
                    "card created"
                );
                Ok(card)
            }
            Err(e) => {
                warn!(
                    subsystem = "cards",
                    component = "lifecycle",
                    op = "create_card",
                    error = %e,
                    "record insert failed after upload; discarding uploads"
                );
                self.reconciler.discard(&output_path).await;
                self.reconciler.discard(&reference_path).await;
                Err(e)
            }
        }
    }

    /// Update a card's field set and resolve each slot intent independently.
    ///
    /// Uploads for both slots complete before the single record write;
    /// superseded objects are retired in the background only after the
    /// write commits. On a failed write, the newly uploaded objects are
    /// discarded and the original record is left untouched.
    pub async fn update_card(
        &self,
        id: Uuid,
        fields: CardFields,
        output_intent: SlotIntent,
        reference_intent: SlotIntent,
    ) -> Result<Card> {
        let current = self.repo.get(id).await?;
        fields.validate()?;

        // Intent validation happens inside reconcile, before any store call.
        let outcome = self
            .reconciler
            .reconcile(
                &current.output_image_path,
                &current.reference_image_path,
                output_intent,
                reference_intent,
            )
            .await?;

        let record = CardRecord {
            output_image_path: outcome.output.path.clone(),
            reference_image_path: outcome.reference.path.clone(),
            fields,
        };
        match self.repo.update(id, record).await {
            Ok(card) => {
                info!(
                    subsystem = "cards",
                    component = "lifecycle",
                    op = "update_card",
                    card_id = %id,
                    "card updated"
                );
                spawn_retire(self.store.clone(), outcome.retired_paths());
                Ok(card)
            }
            Err(e) => {
                warn!(
                    subsystem = "cards",
                    component = "lifecycle",
                    op = "update_card",
                    card_id = %id,
                    error = %e,
                    "record update failed; discarding new uploads"
                );
                for path in outcome.uploaded_paths() {
                    self.reconciler.discard(&path).await;
                }
                Err(e)
            }
        }
    }

    /// Delete a card and retire both attachments.
    ///
    /// The record goes first: a missing record is recoverable garbage (the
    /// attachments become collectible orphans), whereas a missing
    /// attachment referenced by a surviving record would be corruption.
    /// Attachment deletion is best-effort and never rolls back the record
    /// removal.
    pub async fn delete_card(&self, id: Uuid) -> Result<()> {
        let card = self.repo.get(id).await?;
        self.repo.delete(id).await?;
        info!(
            subsystem = "cards",
            component = "lifecycle",
            op = "delete_card",
            card_id = %id,
            "card deleted"
        );
        spawn_retire(
            self.store.clone(),
            vec![card.output_image_path, card.reference_image_path],
        );
        Ok(())
    }

    /// Idempotent point update of the favorite flag.
    pub async fn set_favorite(&self, id: Uuid, value: bool) -> Result<Card> {
        self.repo.set_favorite(id, value).await
    }

    /// List cards matching the filter (sentinel `"all"` values impose no
    /// restriction).
    pub async fn list_cards(&self, filter: CardFilter) -> Result<Vec<Card>> {
        let filter = filter.normalized();
        let cards = self.repo.list(&filter).await?;
        debug!(
            subsystem = "cards",
            component = "lifecycle",
            op = "list_cards",
            result_count = cards.len(),
            "cards listed"
        );
        Ok(cards)
    }

    /// Distinct client and model values for filter dropdowns. Pure read.
    pub async fn filter_options(&self) -> Result<FilterOptions> {
        let (clients, models) = tokio::try_join!(
            self.repo.distinct_values(CardColumn::Client),
            self.repo.distinct_values(CardColumn::Model),
        )?;
        Ok(FilterOptions { clients, models })
    }

    /// Attach signed read URLs to a card for display.
    pub async fn card_view(&self, card: Card) -> Result<CardView> {
        let (output_image_url, reference_image_url) = tokio::try_join!(
            self.store
                .signed_read_url(&card.output_image_path, self.url_ttl_secs),
            self.store
                .signed_read_url(&card.reference_image_path, self.url_ttl_secs),
        )?;
        Ok(CardView {
            card,
            output_image_url,
            reference_image_url,
        })
    }

    /// List cards with signed read URLs attached.
    pub async fn list_card_views(&self, filter: CardFilter) -> Result<Vec<CardView>> {
        let cards = self.list_cards(filter).await?;
        let mut views = Vec::with_capacity(cards.len());
        for card in cards {
            views.push(self.card_view(card).await?);
        }
        Ok(views)
    }
}

/// Retire superseded objects after a successful record write.
///
/// Fire-and-forget: deletions run concurrently in a background task and do
/// not block returning the result to the caller. A failed deletion leaves
/// an orphaned object for the out-of-band sweep and is logged, nothing
/// more.
fn spawn_retire(store: Arc<dyn AttachmentStore>, paths: Vec<String>) {
    if paths.is_empty() {
        return;
    }
    tokio::spawn(async move {
        let results = futures::future::join_all(paths.iter().map(|p| store.delete(p))).await;
        for (path, result) in paths.iter().zip(results) {
            match result {
                Ok(()) => debug!(
                    subsystem = "cards",
                    component = "lifecycle",
                    op = "retire",
                    storage_path = %path,
                    "retired superseded object"
                ),
                Err(e) => warn!(
                    subsystem = "cards",
                    component = "lifecycle",
                    op = "retire",
                    storage_path = %path,
                    error = %e,
                    "failed to retire superseded object; orphan left for sweep"
                ),
            }
        }
    });
}
