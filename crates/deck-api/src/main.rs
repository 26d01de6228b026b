//! deck-api - HTTP API server for promptdeck

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use deck_api::{build_router, ApiConfig, AppState};
use deck_cards::CardService;
use deck_core::UploadPolicy;
use deck_db::{create_pool, run_migrations, PgCardRepository};
use deck_store::{FilesystemStore, UrlSigner};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing with configurable output
    //
    // Environment variables:
    //   LOG_FORMAT - "json" or "text" (default: "text")
    //   RUST_LOG   - standard env filter (default: "deck_api=debug,tower_http=debug")
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "deck_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(env_filter);
    if log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    let config = ApiConfig::from_env()?;

    // Connect to database
    info!("Connecting to database...");
    let pool = create_pool(&config.database_url).await?;
    info!("Database connected");

    // Run pending database migrations on startup
    info!("Running database migrations...");
    run_migrations(&pool).await?;
    info!("Database migrations complete");

    // Initialize attachment storage and verify a full write/read/delete
    // round-trip before accepting traffic
    let signer = UrlSigner::new(config.signing_secret.as_bytes());
    let store = Arc::new(FilesystemStore::new(
        &config.storage_path,
        &config.public_url,
        signer,
    ));
    store
        .validate()
        .await
        .map_err(|e| anyhow::anyhow!("attachment store validation failed: {}", e))?;
    info!("Attachment storage initialized at {}", config.storage_path);

    let repo = Arc::new(PgCardRepository::new(pool.clone()));
    let policy = UploadPolicy {
        max_bytes: config.max_upload_bytes,
        ..UploadPolicy::default()
    };
    let service = Arc::new(CardService::new(repo, store.clone(), policy));

    let state = AppState { service, store };
    let app = build_router(state, config.max_upload_bytes);

    // Start server
    let addr: SocketAddr = config.bind_addr.parse()?;
    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
