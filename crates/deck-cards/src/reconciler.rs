//! Attachment reconciler: the state machine behind card image edits.
//!
//! Given a card's current attachment paths and one intent per slot
//! (keep / replace / delete), the reconciler computes and executes the
//! minimal set of store operations and returns the paths to persist plus
//! the superseded objects to retire.
//!
//! Ordering guarantee: uploads for both slots happen before the record
//! write; deletions of superseded objects happen after the record write
//! commits. A crash between steps leaves at worst a transient orphaned
//! object (cheap, collectible) rather than a record pointing at nothing.

use std::sync::Arc;

use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, warn};

use deck_core::defaults::{OBJECT_KEY_FALLBACK_EXT, OBJECT_KEY_TOKEN_LEN};
use deck_core::{
    validate_upload, AttachmentStore, Error, Result, Slot, SlotIntent, UploadFile, UploadPolicy,
};

/// Generate a fresh object key for a slot: `{folder}/{millis}-{token}.{ext}`.
///
/// The key is never reused or derived from the old path, so a replacement
/// can never collide with the object it supersedes.
pub fn generate_object_key(slot: Slot, original_name: &str) -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(OBJECT_KEY_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!(
        "{}/{}-{}.{}",
        slot.folder(),
        millis,
        token,
        extension_of(original_name)
    )
}

fn extension_of(name: &str) -> String {
    name.rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .unwrap_or_else(|| OBJECT_KEY_FALLBACK_EXT.to_string())
}

/// Result of reconciling one slot.
#[derive(Debug, Clone)]
pub struct SlotOutcome {
    /// Path to persist for this slot.
    pub path: String,
    /// Old object superseded by this call, to be deleted only after the
    /// record write commits. `None` when the slot kept its object.
    pub retired: Option<String>,
}

impl SlotOutcome {
    /// The path uploaded by this call, if any. A slot uploaded exactly when
    /// it retired its predecessor.
    pub fn uploaded(&self) -> Option<&str> {
        self.retired.is_some().then_some(self.path.as_str())
    }
}

/// Result of reconciling both slots.
#[derive(Debug, Clone)]
pub struct ReconcileOutcome {
    pub output: SlotOutcome,
    pub reference: SlotOutcome,
}

impl ReconcileOutcome {
    /// Superseded objects to delete after the record write commits.
    pub fn retired_paths(&self) -> Vec<String> {
        [&self.output.retired, &self.reference.retired]
            .into_iter()
            .flatten()
            .cloned()
            .collect()
    }

    /// Objects uploaded by this call, to discard if the record write fails.
    pub fn uploaded_paths(&self) -> Vec<String> {
        [self.output.uploaded(), self.reference.uploaded()]
            .into_iter()
            .flatten()
            .map(str::to_string)
            .collect()
    }
}

/// Computes and executes the minimal store operations for a requested
/// attachment state change.
pub struct AttachmentReconciler {
    store: Arc<dyn AttachmentStore>,
    policy: UploadPolicy,
}

impl AttachmentReconciler {
    pub fn new(store: Arc<dyn AttachmentStore>, policy: UploadPolicy) -> Self {
        Self { store, policy }
    }

    /// Validate both slot intents before any store mutation.
    ///
    /// A bare `Remove` is rejected: both slots are mandatory at the record
    /// level, so "remove old, attach new" must be expressed as `Replace`.
    /// Replacement files are checked against the media policy here so a
    /// failed validation is a guaranteed no-op.
    pub fn validate_intents(&self, output: &SlotIntent, reference: &SlotIntent) -> Result<()> {
        for (slot, intent) in [(Slot::Output, output), (Slot::Reference, reference)] {
            match intent {
                SlotIntent::Unchanged => {}
                SlotIntent::Replace(file) => validate_upload(file, &self.policy)?,
                SlotIntent::Remove => {
                    return Err(Error::InvalidSlotTransition(format!(
                        "{}: cannot remove a mandatory image without a replacement",
                        slot
                    )))
                }
            }
        }
        Ok(())
    }

    /// Resolve both slot intents against the current paths.
    ///
    /// Uploads for the two slots are issued concurrently; both must succeed.
    /// If one fails, the sibling object uploaded by this same call is
    /// deleted (best-effort) and the whole operation aborts with no record
    /// mutation having happened.
    pub async fn reconcile(
        &self,
        current_output: &str,
        current_reference: &str,
        output: SlotIntent,
        reference: SlotIntent,
    ) -> Result<ReconcileOutcome> {
        self.validate_intents(&output, &reference)?;

        let (out_res, ref_res) = tokio::join!(
            self.stage(Slot::Output, current_output, output),
            self.stage(Slot::Reference, current_reference, reference),
        );

        match (out_res, ref_res) {
            (Ok(output), Ok(reference)) => Ok(ReconcileOutcome { output, reference }),
            (Ok(ok_side), Err(e)) | (Err(e), Ok(ok_side)) => {
                if let Some(path) = ok_side.uploaded() {
                    self.discard(path).await;
                }
                Err(e)
            }
            (Err(e), Err(_)) => Err(e),
        }
    }

    /// Upload a brand-new pair of files (create path: no prior state, no
    /// reconciliation needed). Both uploads run concurrently; a partial
    /// upload is discarded on failure of its sibling.
    pub async fn upload_new_pair(
        &self,
        output: &UploadFile,
        reference: &UploadFile,
    ) -> Result<(String, String)> {
        validate_upload(output, &self.policy)?;
        validate_upload(reference, &self.policy)?;

        let output_key = generate_object_key(Slot::Output, &output.filename);
        let reference_key = generate_object_key(Slot::Reference, &reference.filename);

        let (out_res, ref_res) = tokio::join!(
            self.store.put(&output_key, &output.data),
            self.store.put(&reference_key, &reference.data),
        );

        match (out_res, ref_res) {
            (Ok(output_path), Ok(reference_path)) => Ok((output_path, reference_path)),
            (Ok(uploaded), Err(e)) | (Err(e), Ok(uploaded)) => {
                self.discard(&uploaded).await;
                Err(e)
            }
            (Err(e), Err(_)) => Err(e),
        }
    }

    /// Best-effort delete of a partially uploaded object. Failure to clean
    /// up is logged, not fatal: the orphan is collectible out-of-band.
    pub async fn discard(&self, path: &str) {
        if let Err(e) = self.store.delete(path).await {
            warn!(
                subsystem = "cards",
                component = "reconciler",
                op = "discard",
                storage_path = %path,
                error = %e,
                "failed to discard partial upload; object orphaned"
            );
        }
    }

    async fn stage(&self, slot: Slot, current: &str, intent: SlotIntent) -> Result<SlotOutcome> {
        match intent {
            SlotIntent::Unchanged => Ok(SlotOutcome {
                path: current.to_string(),
                retired: None,
            }),
            SlotIntent::Replace(file) => {
                let key = generate_object_key(slot, &file.filename);
                let path = self.store.put(&key, &file.data).await?;
                debug!(
                    subsystem = "cards",
                    component = "reconciler",
                    op = "stage",
                    slot = %slot,
                    storage_path = %path,
                    "uploaded replacement object"
                );
                Ok(SlotOutcome {
                    path,
                    retired: Some(current.to_string()),
                })
            }
            // Checked by validate_intents; kept as a hard stop in case a
            // caller skips validation.
            SlotIntent::Remove => Err(Error::InvalidSlotTransition(format!(
                "{}: cannot remove a mandatory image without a replacement",
                slot
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MemoryAttachmentStore;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn png(name: &str) -> UploadFile {
        UploadFile {
            filename: name.to_string(),
            content_type: "image/png".to_string(),
            data: PNG_HEADER.to_vec(),
        }
    }

    fn reconciler(store: &Arc<MemoryAttachmentStore>) -> AttachmentReconciler {
        AttachmentReconciler::new(store.clone(), UploadPolicy::default())
    }

    #[test]
    fn test_object_key_shape() {
        let key = generate_object_key(Slot::Output, "photo.PNG");
        assert!(key.starts_with("output/"));
        assert!(key.ends_with(".png"));
        let stem = key
            .strip_prefix("output/")
            .unwrap()
            .strip_suffix(".png")
            .unwrap();
        let (millis, token) = stem.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(token.len(), OBJECT_KEY_TOKEN_LEN);
    }

    #[test]
    fn test_object_keys_unique() {
        let a = generate_object_key(Slot::Output, "same.png");
        let b = generate_object_key(Slot::Output, "same.png");
        assert_ne!(a, b);
    }

    #[test]
    fn test_object_key_fallback_extension() {
        assert!(generate_object_key(Slot::Reference, "no-extension").ends_with(".bin"));
        assert!(generate_object_key(Slot::Reference, "weird.!@#$").ends_with(".bin"));
        assert!(generate_object_key(Slot::Reference, "trailing.").ends_with(".bin"));
    }

    #[tokio::test]
    async fn test_unchanged_keeps_paths_without_store_calls() {
        let store = Arc::new(MemoryAttachmentStore::new());
        let r = reconciler(&store);

        let outcome = r
            .reconcile("output/old.png", "reference/old.png", SlotIntent::Unchanged, SlotIntent::Unchanged)
            .await
            .unwrap();

        assert_eq!(outcome.output.path, "output/old.png");
        assert_eq!(outcome.reference.path, "reference/old.png");
        assert!(outcome.retired_paths().is_empty());
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_replace_uploads_and_retires_old() {
        let store = Arc::new(MemoryAttachmentStore::new());
        store.seed("output/old.png", b"old").await;
        let r = reconciler(&store);

        let outcome = r
            .reconcile(
                "output/old.png",
                "reference/keep.png",
                SlotIntent::Replace(png("new.png")),
                SlotIntent::Unchanged,
            )
            .await
            .unwrap();

        assert_ne!(outcome.output.path, "output/old.png");
        assert!(outcome.output.path.starts_with("output/"));
        assert_eq!(outcome.reference.path, "reference/keep.png");
        assert_eq!(outcome.retired_paths(), vec!["output/old.png".to_string()]);
        // The old object is NOT deleted by reconcile; that happens after the
        // record write commits.
        assert!(store.contains("output/old.png").await);
        assert!(store.contains(&outcome.output.path).await);
    }

    #[tokio::test]
    async fn test_bare_remove_is_invalid_without_store_mutation() {
        let store = Arc::new(MemoryAttachmentStore::new());
        let r = reconciler(&store);

        let err = r
            .reconcile(
                "output/old.png",
                "reference/old.png",
                SlotIntent::Remove,
                SlotIntent::Replace(png("new.png")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidSlotTransition(_)));
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_policy_violation_aborts_before_any_upload() {
        let store = Arc::new(MemoryAttachmentStore::new());
        let r = reconciler(&store);

        let bad = UploadFile {
            filename: "fake.png".into(),
            content_type: "image/png".into(),
            data: b"not a png".to_vec(),
        };
        let err = r
            .reconcile(
                "output/old.png",
                "reference/old.png",
                SlotIntent::Replace(png("good.png")),
                SlotIntent::Replace(bad),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(store.put_calls(), 0);
    }

    #[tokio::test]
    async fn test_sibling_upload_discarded_when_one_put_fails() {
        let store = Arc::new(MemoryAttachmentStore::new());
        store.fail_puts_under("reference/");
        let r = reconciler(&store);

        let err = r
            .reconcile(
                "output/old.png",
                "reference/old.png",
                SlotIntent::Replace(png("new-out.png")),
                SlotIntent::Replace(png("new-ref.png")),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AttachmentIo(_)));
        // The output upload that succeeded was cleaned up again.
        assert_eq!(store.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_upload_new_pair_discards_partial_on_failure() {
        let store = Arc::new(MemoryAttachmentStore::new());
        store.fail_puts_under("reference/");
        let r = reconciler(&store);

        let err = r
            .upload_new_pair(&png("out.png"), &png("ref.png"))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AttachmentIo(_)));
        assert_eq!(store.object_count().await, 0);
    }

    #[tokio::test]
    async fn test_upload_new_pair_returns_distinct_folders() {
        let store = Arc::new(MemoryAttachmentStore::new());
        let r = reconciler(&store);

        let (out_path, ref_path) = r
            .upload_new_pair(&png("out.png"), &png("ref.png"))
            .await
            .unwrap();

        assert!(out_path.starts_with("output/"));
        assert!(ref_path.starts_with("reference/"));
        assert!(store.contains(&out_path).await);
        assert!(store.contains(&ref_path).await);
    }
}
