//! Card repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use deck_core::{
    Card, CardColumn, CardFilter, CardRecord, CardRepository, Error, Result, SortOrder,
};

/// PostgreSQL implementation of `CardRepository`.
pub struct PgCardRepository {
    pool: PgPool,
}

impl PgCardRepository {
    /// Create a new PgCardRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const CARD_COLUMNS: &str = "id, output_image_path, reference_image_path, prompt, metadata, \
     client, model, seed, llm_used, notes, is_favorited, created_at";

/// Build the WHERE clause for a list query. Returns the SQL fragment; the
/// caller binds `client` then `model` in that order when present.
fn build_filter_clause(filter: &CardFilter) -> String {
    let mut clause = String::from("WHERE 1=1 ");
    let mut param_idx = 1;
    if filter.client.is_some() {
        clause.push_str(&format!("AND client = ${} ", param_idx));
        param_idx += 1;
    }
    if filter.model.is_some() {
        clause.push_str(&format!("AND model = ${} ", param_idx));
    }
    if filter.favorites_only {
        clause.push_str("AND is_favorited = TRUE ");
    }
    clause
}

/// Order strictly by creation time, ties broken by id ascending so repeated
/// listings are deterministic.
fn build_order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::Newest => "ORDER BY created_at DESC, id ASC",
        SortOrder::Oldest => "ORDER BY created_at ASC, id ASC",
    }
}

fn card_from_row(row: &PgRow) -> Card {
    Card {
        id: row.get("id"),
        output_image_path: row.get("output_image_path"),
        reference_image_path: row.get("reference_image_path"),
        prompt: row.get("prompt"),
        metadata: row.get("metadata"),
        client: row.get("client"),
        model: row.get("model"),
        seed: row.get("seed"),
        llm_used: row.get("llm_used"),
        notes: row.get("notes"),
        is_favorited: row.get("is_favorited"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl CardRepository for PgCardRepository {
    async fn insert(&self, record: CardRecord) -> Result<Card> {
        let id = Uuid::now_v7();
        let f = record.fields;
        let row = sqlx::query(&format!(
            r#"INSERT INTO prompt_card
               (id, output_image_path, reference_image_path, prompt, metadata,
                client, model, seed, llm_used, notes, is_favorited)
               VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
               RETURNING {}"#,
            CARD_COLUMNS
        ))
        .bind(id)
        .bind(&record.output_image_path)
        .bind(&record.reference_image_path)
        .bind(&f.prompt)
        .bind(&f.metadata)
        .bind(&f.client)
        .bind(&f.model)
        .bind(&f.seed)
        .bind(&f.llm_used)
        .bind(&f.notes)
        .bind(f.is_favorited)
        .fetch_one(&self.pool)
        .await?;

        debug!(subsystem = "db", op = "insert", card_id = %id, "card inserted");
        Ok(card_from_row(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Card> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM prompt_card WHERE id = $1",
            CARD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::CardNotFound(id))?;

        Ok(card_from_row(&row))
    }

    async fn update(&self, id: Uuid, record: CardRecord) -> Result<Card> {
        let f = record.fields;
        let row = sqlx::query(&format!(
            r#"UPDATE prompt_card
               SET output_image_path = $2, reference_image_path = $3, prompt = $4,
                   metadata = $5, client = $6, model = $7, seed = $8,
                   llm_used = $9, notes = $10, is_favorited = $11
               WHERE id = $1
               RETURNING {}"#,
            CARD_COLUMNS
        ))
        .bind(id)
        .bind(&record.output_image_path)
        .bind(&record.reference_image_path)
        .bind(&f.prompt)
        .bind(&f.metadata)
        .bind(&f.client)
        .bind(&f.model)
        .bind(&f.seed)
        .bind(&f.llm_used)
        .bind(&f.notes)
        .bind(f.is_favorited)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::CardNotFound(id))?;

        debug!(subsystem = "db", op = "update", card_id = %id, "card updated");
        Ok(card_from_row(&row))
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM prompt_card WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(Error::CardNotFound(id));
        }
        debug!(subsystem = "db", op = "delete", card_id = %id, "card deleted");
        Ok(())
    }

    async fn list(&self, filter: &CardFilter) -> Result<Vec<Card>> {
        let sql = format!(
            "SELECT {} FROM prompt_card {}{}",
            CARD_COLUMNS,
            build_filter_clause(filter),
            build_order_clause(filter.sort)
        );

        let mut query = sqlx::query(&sql);
        if let Some(client) = &filter.client {
            query = query.bind(client);
        }
        if let Some(model) = &filter.model {
            query = query.bind(model);
        }

        let rows = query.fetch_all(&self.pool).await?;
        debug!(
            subsystem = "db",
            op = "list",
            result_count = rows.len(),
            "cards listed"
        );
        Ok(rows.iter().map(card_from_row).collect())
    }

    async fn set_favorite(&self, id: Uuid, value: bool) -> Result<Card> {
        let row = sqlx::query(&format!(
            "UPDATE prompt_card SET is_favorited = $2 WHERE id = $1 RETURNING {}",
            CARD_COLUMNS
        ))
        .bind(id)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(Error::CardNotFound(id))?;

        Ok(card_from_row(&row))
    }

    async fn distinct_values(&self, column: CardColumn) -> Result<Vec<String>> {
        // Identifier comes from a closed enum, never from the caller.
        let col = column.as_sql();
        let values = sqlx::query_scalar::<_, String>(&format!(
            "SELECT DISTINCT {col} FROM prompt_card ORDER BY {col} ASC"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_clause_unfiltered() {
        let clause = build_filter_clause(&CardFilter::default());
        assert_eq!(clause, "WHERE 1=1 ");
    }

    #[test]
    fn test_filter_clause_client_only() {
        let filter = CardFilter {
            client: Some("Acme".into()),
            ..Default::default()
        };
        assert_eq!(build_filter_clause(&filter), "WHERE 1=1 AND client = $1 ");
    }

    #[test]
    fn test_filter_clause_client_and_model() {
        let filter = CardFilter {
            client: Some("Acme".into()),
            model: Some("flux-dev".into()),
            ..Default::default()
        };
        assert_eq!(
            build_filter_clause(&filter),
            "WHERE 1=1 AND client = $1 AND model = $2 "
        );
    }

    #[test]
    fn test_filter_clause_model_binds_first_param() {
        // With no client filter, model takes $1
        let filter = CardFilter {
            model: Some("flux-dev".into()),
            ..Default::default()
        };
        assert_eq!(build_filter_clause(&filter), "WHERE 1=1 AND model = $1 ");
    }

    #[test]
    fn test_filter_clause_favorites() {
        let filter = CardFilter {
            favorites_only: true,
            ..Default::default()
        };
        assert_eq!(
            build_filter_clause(&filter),
            "WHERE 1=1 AND is_favorited = TRUE "
        );
    }

    #[test]
    fn test_order_clause_newest_descends_with_id_tiebreak() {
        assert_eq!(
            build_order_clause(SortOrder::Newest),
            "ORDER BY created_at DESC, id ASC"
        );
    }

    #[test]
    fn test_order_clause_oldest_ascends() {
        assert_eq!(
            build_order_clause(SortOrder::Oldest),
            "ORDER BY created_at ASC, id ASC"
        );
    }
}
