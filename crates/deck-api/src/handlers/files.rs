//! Signed serving of stored objects.

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::warn;

use crate::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct SignedFileQuery {
    pub exp: i64,
    pub sig: String,
}

/// GET /files/{*path}
///
/// Serves an object only when the query carries a valid, unexpired
/// signature over the exact path. A bad or expired signature is a 403
/// without revealing whether the object exists.
pub async fn serve_file(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<SignedFileQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let now = chrono::Utc::now().timestamp();
    if !state.store.signer().verify(&path, query.exp, &query.sig, now) {
        warn!(
            subsystem = "api",
            component = "files",
            op = "serve_file",
            storage_path = %path,
            "rejected file request with invalid or expired signature"
        );
        return Err(ApiError::Forbidden("invalid or expired link".to_string()));
    }

    let exists = state.store.exists(&path).await?;
    if !exists {
        return Err(ApiError::NotFound(format!("no object at path: {}", path)));
    }
    let data = state.store.read(&path).await?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&path)),
    );
    // Signed links are per-viewer; keep caches private and bounded by the
    // signature lifetime.
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("private, max-age=3600"),
    );
    Ok((StatusCode::OK, headers, data))
}

/// Content type from the object-key extension. Upload validation restricts
/// stored objects to the image allow-list, so this covers everything that
/// can actually be on disk.
fn content_type_for(path: &str) -> &'static str {
    match path.rsplit_once('.').map(|(_, ext)| ext) {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}
