//! # deck-db
//!
//! PostgreSQL persistence layer for promptdeck.
//!
//! This crate provides:
//! - Connection pool management
//! - The `prompt_card` repository implementation
//! - Embedded schema migrations (behind the `migrations` feature)
//!
//! ## Example
//!
//! ```rust,ignore
//! use deck_db::{create_pool, PgCardRepository};
//! use deck_core::CardRepository;
//!
//! let pool = create_pool("postgres://localhost/promptdeck").await?;
//! let cards = PgCardRepository::new(pool);
//! let listed = cards.list(&Default::default()).await?;
//! println!("{} cards", listed.len());
//! ```

pub mod cards;
pub mod pool;

pub use cards::PgCardRepository;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};

// Re-export core types
pub use deck_core::*;

/// Run embedded schema migrations against the pool.
#[cfg(feature = "migrations")]
pub async fn run_migrations(pool: &sqlx::PgPool) -> Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| Error::Persistence(format!("migration: {}", e)))
}
