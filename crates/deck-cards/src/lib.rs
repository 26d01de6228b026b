//! # deck-cards
//!
//! The card lifecycle and attachment-consistency engine: the rules
//! governing how a card's two image attachments and its field set move
//! through create/update/delete without producing orphaned files or
//! inconsistent records.
//!
//! The engine only depends on the `AttachmentStore` and `CardRepository`
//! contracts from `deck-core`; storage and persistence backends plug in
//! behind those traits.

pub mod export;
pub mod lifecycle;
pub mod reconciler;
pub mod testing;

pub use export::{export_cards, ExportFormat};
pub use lifecycle::{CardService, CardView};
pub use reconciler::{generate_object_key, AttachmentReconciler, ReconcileOutcome, SlotOutcome};
