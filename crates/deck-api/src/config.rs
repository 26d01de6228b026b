//! Environment-driven server configuration.

use deck_core::defaults::MAX_UPLOAD_SIZE_BYTES;
use deck_core::{Error, Result};

/// Server configuration, read once at startup.
///
/// Environment variables:
///   DATABASE_URL           - PostgreSQL connection string
///   DECK_STORAGE_PATH      - filesystem root for stored objects
///   DECK_PUBLIC_URL        - externally reachable base URL for signed links
///   DECK_SIGNING_SECRET    - HMAC key for read-URL signatures (required)
///   DECK_BIND_ADDR         - listen address (default: 0.0.0.0:3000)
///   DECK_MAX_UPLOAD_BYTES  - per-file upload ceiling (default: 50 MiB)
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub database_url: String,
    pub storage_path: String,
    pub public_url: String,
    pub signing_secret: String,
    pub bind_addr: String,
    pub max_upload_bytes: usize,
}

impl ApiConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr =
            std::env::var("DECK_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/promptdeck".to_string());
        let storage_path = std::env::var("DECK_STORAGE_PATH")
            .unwrap_or_else(|_| "/var/lib/promptdeck/files".to_string());
        let public_url =
            std::env::var("DECK_PUBLIC_URL").unwrap_or_else(|_| format!("http://{}", bind_addr));
        let signing_secret = std::env::var("DECK_SIGNING_SECRET")
            .map_err(|_| Error::Config("DECK_SIGNING_SECRET must be set".to_string()))?;
        if signing_secret.trim().is_empty() {
            return Err(Error::Config(
                "DECK_SIGNING_SECRET must not be empty".to_string(),
            ));
        }
        let max_upload_bytes = std::env::var("DECK_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(MAX_UPLOAD_SIZE_BYTES);

        Ok(Self {
            database_url,
            storage_path,
            public_url,
            signing_secret,
            bind_addr,
            max_upload_bytes,
        })
    }
}
