//! Card CRUD, favorites, filter options, and export handlers.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use deck_cards::{export, ExportFormat};
use deck_core::{CardFields, CardFilter, SlotIntent, SortOrder, UploadFile};

use crate::{ApiError, AppState};

/// Query parameters shared by the list and export endpoints.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListCardsQuery {
    pub client: Option<String>,
    pub model: Option<String>,
    /// `"true"` restricts the listing to favorited cards.
    pub favorites: Option<String>,
    pub sort_by: Option<SortOrder>,
}

impl ListCardsQuery {
    fn into_filter(self) -> CardFilter {
        CardFilter {
            client: self.client,
            model: self.model,
            favorites_only: self.favorites.as_deref() == Some("true"),
            sort: self.sort_by.unwrap_or_default(),
        }
    }
}

/// GET /api/cards
pub async fn list_cards(
    State(state): State<AppState>,
    Query(query): Query<ListCardsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let views = state.service.list_card_views(query.into_filter()).await?;
    Ok(Json(views))
}

/// POST /api/cards
///
/// Multipart fields: `outputImage` and `referenceImage` (both required),
/// `prompt`, `metadata`, `client`, `model`, `seed` (required text),
/// `llmUsed`, `notes`, `isFavorited` (optional).
pub async fn create_card(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let form = CardForm::parse(multipart).await?;
    let card = state
        .service
        .create_card(form.fields, form.output_file, form.reference_file)
        .await?;
    let view = state.service.card_view(card).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// PUT /api/cards/{id}
///
/// Same multipart shape as create, plus `deleteOutputImage` /
/// `deleteReferenceImage` flags. A file resolves the slot to Replace, a
/// flag without a file to Remove, neither to Unchanged.
pub async fn update_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut form = CardForm::parse(multipart).await?;
    let fields = std::mem::take(&mut form.fields);
    let (output_intent, reference_intent) = form.slot_intents();
    let card = state
        .service
        .update_card(id, fields, output_intent, reference_intent)
        .await?;
    let view = state.service.card_view(card).await?;
    Ok(Json(view))
}

/// DELETE /api/cards/{id}
pub async fn delete_card(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    state.service.delete_card(id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteBody {
    pub is_favorited: bool,
}

/// PATCH /api/cards/{id}/favorite
pub async fn set_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<FavoriteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let card = state.service.set_favorite(id, body.is_favorited).await?;
    let view = state.service.card_view(card).await?;
    Ok(Json(view))
}

/// GET /api/filter-options
pub async fn filter_options(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let options = state.service.filter_options().await?;
    Ok(Json(options))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportQuery {
    pub format: Option<String>,
    pub client: Option<String>,
    pub model: Option<String>,
    pub favorites: Option<String>,
    pub sort_by: Option<SortOrder>,
}

impl ExportQuery {
    fn into_filter(self) -> CardFilter {
        CardFilter {
            client: self.client,
            model: self.model,
            favorites_only: self.favorites.as_deref() == Some("true"),
            sort: self.sort_by.unwrap_or_default(),
        }
    }
}

/// GET /api/cards/export?format=json|csv
///
/// Accepts the same filter parameters as the listing; the export covers
/// exactly what the equivalent listing would return.
pub async fn export_cards(
    State(state): State<AppState>,
    Query(query): Query<ExportQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let format = ExportFormat::parse(query.format.as_deref().unwrap_or("json"));
    let cards = state.service.list_cards(query.into_filter()).await?;
    let body = export::export_cards(&cards, format)?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(format.content_type()),
    );
    let disposition = format!("attachment; filename=\"{}\"", format.file_name());
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::BadRequest(format!("export header: {}", e)))?,
    );
    Ok((headers, body))
}

/// Parsed multipart card form, shared by create and update.
#[derive(Debug, Default)]
struct CardForm {
    fields: CardFields,
    output_file: Option<UploadFile>,
    reference_file: Option<UploadFile>,
    delete_output: bool,
    delete_reference: bool,
}

impl CardForm {
    async fn parse(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = CardForm::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
        {
            let field_name = field.name().map(|n| n.to_string());
            match field_name.as_deref() {
                Some(name @ ("outputImage" | "referenceImage")) => {
                    let filename = field.file_name().unwrap_or("upload").to_string();
                    let content_type = field
                        .content_type()
                        .unwrap_or("application/octet-stream")
                        .to_string();
                    let data = field
                        .bytes()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("read error: {}", e)))?
                        .to_vec();
                    // Browsers submit an empty part for a cleared file input;
                    // treat that as no file.
                    if data.is_empty() {
                        continue;
                    }
                    let file = UploadFile {
                        filename,
                        content_type,
                        data,
                    };
                    if name == "outputImage" {
                        form.output_file = Some(file);
                    } else {
                        form.reference_file = Some(file);
                    }
                }
                Some(name) => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(format!("read error: {}", e)))?;
                    form.set_text_field(name, value);
                }
                None => {}
            }
        }

        Ok(form)
    }

    fn set_text_field(&mut self, name: &str, value: String) {
        match name {
            "prompt" => self.fields.prompt = value,
            "metadata" => self.fields.metadata = value,
            "client" => self.fields.client = value,
            "model" => self.fields.model = value,
            "seed" => self.fields.seed = value,
            "llmUsed" => self.fields.llm_used = non_empty(value),
            "notes" => self.fields.notes = non_empty(value),
            "isFavorited" => self.fields.is_favorited = value == "true",
            "deleteOutputImage" => self.delete_output = value == "true",
            "deleteReferenceImage" => self.delete_reference = value == "true",
            // Unknown fields are ignored
            _ => {}
        }
    }

    /// Resolve the form's file/flag combinations into per-slot intents.
    fn slot_intents(self) -> (SlotIntent, SlotIntent) {
        let output = slot_intent(self.output_file, self.delete_output);
        let reference = slot_intent(self.reference_file, self.delete_reference);
        (output, reference)
    }
}

fn slot_intent(file: Option<UploadFile>, delete_flag: bool) -> SlotIntent {
    match (file, delete_flag) {
        (Some(f), _) => SlotIntent::Replace(f),
        (None, true) => SlotIntent::Remove,
        (None, false) => SlotIntent::Unchanged,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_into_filter() {
        let query = ListCardsQuery {
            client: Some("acme".into()),
            model: None,
            favorites: Some("true".into()),
            sort_by: Some(SortOrder::Oldest),
        };
        let filter = query.into_filter();
        assert_eq!(filter.client.as_deref(), Some("acme"));
        assert!(filter.favorites_only);
        assert_eq!(filter.sort, SortOrder::Oldest);
    }

    #[test]
    fn test_query_defaults() {
        let filter = ListCardsQuery::default().into_filter();
        assert!(filter.client.is_none());
        assert!(!filter.favorites_only);
        assert_eq!(filter.sort, SortOrder::Newest);
    }

    #[test]
    fn test_slot_intent_resolution() {
        let file = UploadFile {
            filename: "a.png".into(),
            content_type: "image/png".into(),
            data: vec![1],
        };
        assert!(matches!(
            slot_intent(Some(file.clone()), false),
            SlotIntent::Replace(_)
        ));
        // A file wins over a stale delete flag
        assert!(matches!(
            slot_intent(Some(file), true),
            SlotIntent::Replace(_)
        ));
        assert!(matches!(slot_intent(None, true), SlotIntent::Remove));
        assert!(matches!(slot_intent(None, false), SlotIntent::Unchanged));
    }

    #[test]
    fn test_text_fields_fill_card_fields() {
        let mut form = CardForm::default();
        form.set_text_field("prompt", "p".into());
        form.set_text_field("llmUsed", "  ".into());
        form.set_text_field("notes", "n".into());
        form.set_text_field("isFavorited", "true".into());
        assert_eq!(form.fields.prompt, "p");
        assert!(form.fields.llm_used.is_none());
        assert_eq!(form.fields.notes.as_deref(), Some("n"));
        assert!(form.fields.is_favorited);
    }
}
