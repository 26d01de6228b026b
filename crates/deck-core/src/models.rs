//! Card data model and lifecycle request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// A prompt card: a generated output image, a reference image, and the
/// metadata describing how the output was produced.
///
/// Both attachment paths are mandatory for the lifetime of the card; a
/// persisted card never has an empty slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub output_image_path: String,
    pub reference_image_path: String,
    pub prompt: String,
    pub metadata: String,
    pub client: String,
    pub model: String,
    pub seed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_used: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub is_favorited: bool,
    pub created_at: DateTime<Utc>,
}

/// The mutable field set of a card, as supplied by create and update.
///
/// Update writes the full field set; there is no partial patch at the
/// record level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFields {
    pub prompt: String,
    pub metadata: String,
    pub client: String,
    pub model: String,
    pub seed: String,
    pub llm_used: Option<String>,
    pub notes: Option<String>,
    pub is_favorited: bool,
}

impl CardFields {
    /// Validate that every required text field is non-empty after trimming.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("prompt", &self.prompt),
            ("metadata", &self.metadata),
            ("client", &self.client),
            ("model", &self.model),
            ("seed", &self.seed),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::Validation(format!("{} must not be empty", name)));
            }
        }
        Ok(())
    }
}

/// Full record content for a repository write (insert or update): the field
/// set plus both resolved attachment paths.
#[derive(Debug, Clone)]
pub struct CardRecord {
    pub output_image_path: String,
    pub reference_image_path: String,
    pub fields: CardFields,
}

/// An uploaded file as received from the caller.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// Original filename, used only for its extension.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    pub data: Vec<u8>,
}

/// One of the two mandatory attachment positions on a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Output,
    Reference,
}

impl Slot {
    /// Object-key folder prefix for this slot.
    pub fn folder(self) -> &'static str {
        match self {
            Slot::Output => "output",
            Slot::Reference => "reference",
        }
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.folder())
    }
}

/// Requested state change for one attachment slot.
#[derive(Debug, Clone)]
pub enum SlotIntent {
    /// Keep the existing object.
    Unchanged,
    /// Upload a new object, retire the old one after the record write.
    Replace(UploadFile),
    /// Drop the object without a replacement. Never legal on a mandatory
    /// slot; rejected with `InvalidSlotTransition` before any store call.
    Remove,
}

/// Sort order for card listings: strictly by `created_at`, ties broken by
/// `id` ascending for determinism.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Newest,
    Oldest,
}

/// Filter specification for listing cards.
#[derive(Debug, Clone, Default)]
pub struct CardFilter {
    pub client: Option<String>,
    pub model: Option<String>,
    pub favorites_only: bool,
    pub sort: SortOrder,
}

impl CardFilter {
    /// Normalize sentinel values: a present `client`/`model` equal to
    /// `"all"` (or blank) imposes no restriction.
    pub fn normalized(mut self) -> Self {
        self.client = self.client.filter(|c| !is_sentinel(c));
        self.model = self.model.filter(|m| !is_sentinel(m));
        self
    }
}

fn is_sentinel(value: &str) -> bool {
    let v = value.trim();
    v.is_empty() || v.eq_ignore_ascii_case("all")
}

/// Distinct values available for filter dropdowns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub clients: Vec<String>,
    pub models: Vec<String>,
}

/// Columns exposed for distinct-value queries.
///
/// A closed enum rather than a free column string, so the SQL identifier is
/// never caller-controlled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardColumn {
    Client,
    Model,
}

impl CardColumn {
    pub fn as_sql(self) -> &'static str {
        match self {
            CardColumn::Client => "client",
            CardColumn::Model => "model",
        }
    }
}
