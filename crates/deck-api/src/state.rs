//! Shared application state.

use std::sync::Arc;

use deck_cards::CardService;
use deck_store::FilesystemStore;

/// State handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<CardService>,
    /// Concrete store handle for the signed file-serving endpoint, which
    /// needs raw reads and signature verification beyond the
    /// `AttachmentStore` contract.
    pub store: Arc<FilesystemStore>,
}
