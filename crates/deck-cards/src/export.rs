//! Catalog export: CSV and pretty-printed JSON renderings of a card
//! listing.
//!
//! Exports are pure functions over an already-filtered card slice; the
//! caller decides which cards to include. CSV carries the spreadsheet
//! subset of fields, JSON the full records.

use deck_core::{Card, Result};

/// Column order for the CSV rendering.
const CSV_HEADERS: [&str; 6] = ["id", "prompt", "client", "model", "seed", "created_at"];

/// Export format selector, parsed from a query string value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    /// Case-insensitive parse; anything unrecognized falls back to JSON.
    pub fn parse(value: &str) -> Self {
        if value.eq_ignore_ascii_case("csv") {
            ExportFormat::Csv
        } else {
            ExportFormat::Json
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Json => "application/json",
            ExportFormat::Csv => "text/csv",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportFormat::Json => "prompt-cards.json",
            ExportFormat::Csv => "prompt-cards.csv",
        }
    }
}

/// Render cards in the requested format.
pub fn export_cards(cards: &[Card], format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => export_json(cards),
        ExportFormat::Csv => Ok(export_csv(cards)),
    }
}

/// Pretty-printed JSON array of full card records.
pub fn export_json(cards: &[Card]) -> Result<String> {
    Ok(serde_json::to_string_pretty(cards)?)
}

/// RFC 4180 CSV with a header row. Timestamps are RFC 3339.
pub fn export_csv(cards: &[Card]) -> String {
    let mut out = String::new();
    out.push_str(&CSV_HEADERS.join(","));
    out.push_str("\r\n");
    for card in cards {
        let row = [
            card.id.to_string(),
            card.prompt.clone(),
            card.client.clone(),
            card.model.clone(),
            card.seed.clone(),
            card.created_at.to_rfc3339(),
        ];
        let escaped: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
        out.push_str(&escaped.join(","));
        out.push_str("\r\n");
    }
    out
}

/// Quote a field when it contains a delimiter, quote, or line break;
/// embedded quotes are doubled.
fn csv_field(value: &str) -> String {
    if value.contains(['"', ',', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn card(prompt: &str) -> Card {
        Card {
            id: Uuid::parse_str("0191e4a0-0000-7000-8000-000000000001").unwrap(),
            output_image_path: "output/a.png".to_string(),
            reference_image_path: "reference/a.png".to_string(),
            prompt: prompt.to_string(),
            metadata: "cfg 7".to_string(),
            client: "studio".to_string(),
            model: "sdxl".to_string(),
            seed: "42".to_string(),
            llm_used: None,
            notes: None,
            is_favorited: false,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn csv_starts_with_header_row() {
        let csv = export_csv(&[]);
        assert_eq!(csv, "id,prompt,client,model,seed,created_at\r\n");
    }

    #[test]
    fn csv_renders_one_row_per_card() {
        let csv = export_csv(&[card("a sunset"), card("a sunrise")]);
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].contains("a sunset"));
        assert!(lines[2].contains("a sunrise"));
    }

    #[test]
    fn csv_quotes_fields_with_commas_and_quotes() {
        let csv = export_csv(&[card("red, \"crimson\" even")]);
        assert!(csv.contains("\"red, \"\"crimson\"\" even\""));
    }

    #[test]
    fn csv_quotes_fields_with_newlines() {
        let csv = export_csv(&[card("line one\nline two")]);
        assert!(csv.contains("\"line one\nline two\""));
    }

    #[test]
    fn csv_timestamps_are_rfc3339() {
        let csv = export_csv(&[card("p")]);
        assert!(csv.contains("2024-05-01T12:00:00+00:00"));
    }

    #[test]
    fn json_is_pretty_printed_array() {
        let json = export_json(&[card("p")]).unwrap();
        assert!(json.starts_with("[\n"));
        assert!(json.contains("\"prompt\": \"p\""));
    }

    #[test]
    fn json_omits_absent_optional_fields() {
        let json = export_json(&[card("p")]).unwrap();
        assert!(!json.contains("llm_used"));
        assert!(!json.contains("notes"));
    }

    #[test]
    fn format_parse_is_case_insensitive_with_json_fallback() {
        assert_eq!(ExportFormat::parse("csv"), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("CSV"), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("json"), ExportFormat::Json);
        assert_eq!(ExportFormat::parse("xml"), ExportFormat::Json);
    }
}
