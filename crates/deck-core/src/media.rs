//! Upload media policy for card images.
//!
//! Three checks, applied before any store or repository call:
//! 1. Size ceiling
//! 2. Declared MIME type against the allow-list
//! 3. Magic byte detection: the bytes must actually be the raster format
//!    they claim to be

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::defaults::{ALLOWED_IMAGE_TYPES, MAX_UPLOAD_SIZE_BYTES};
use crate::error::{Error, Result};
use crate::models::UploadFile;

static DEFAULT_ALLOWED: Lazy<HashSet<String>> = Lazy::new(|| {
    ALLOWED_IMAGE_TYPES
        .iter()
        .map(|t| t.to_string())
        .collect()
});

/// Accepted upload media policy: a small raster-image allow-list and a
/// fixed byte ceiling. Treated as configuration.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    pub allowed_types: HashSet<String>,
    pub max_bytes: usize,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            allowed_types: DEFAULT_ALLOWED.clone(),
            max_bytes: MAX_UPLOAD_SIZE_BYTES,
        }
    }
}

impl UploadPolicy {
    pub fn new(allowed_types: impl IntoIterator<Item = String>, max_bytes: usize) -> Self {
        Self {
            allowed_types: allowed_types.into_iter().collect(),
            max_bytes,
        }
    }
}

/// Validate an uploaded file against the policy.
///
/// `image/jpg` is accepted as an alias for `image/jpeg` since browsers and
/// older clients still emit it.
pub fn validate_upload(file: &UploadFile, policy: &UploadPolicy) -> Result<()> {
    if file.data.is_empty() {
        return Err(Error::Validation(format!(
            "{}: uploaded file is empty",
            file.filename
        )));
    }

    if file.data.len() > policy.max_bytes {
        return Err(Error::Validation(format!(
            "{}: file exceeds maximum size of {} bytes",
            file.filename, policy.max_bytes
        )));
    }

    let declared = normalize_mime(&file.content_type);
    if !policy.allowed_types.contains(&declared) {
        return Err(Error::Validation(format!(
            "{}: media type {} is not allowed",
            file.filename, file.content_type
        )));
    }

    // Magic bytes are authoritative: a .png rename of arbitrary bytes must
    // not pass as an image.
    match infer::get(&file.data) {
        Some(kind) if policy.allowed_types.contains(kind.mime_type()) => Ok(()),
        Some(kind) => Err(Error::Validation(format!(
            "{}: content is {} which is not allowed",
            file.filename,
            kind.mime_type()
        ))),
        None => Err(Error::Validation(format!(
            "{}: content does not match any allowed image format",
            file.filename
        ))),
    }
}

fn normalize_mime(mime: &str) -> String {
    let lowered = mime.trim().to_ascii_lowercase();
    if lowered == "image/jpg" {
        "image/jpeg".to_string()
    } else {
        lowered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const JPEG_HEADER: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];
    const GIF_HEADER: &[u8] = b"GIF89a\x00\x00";

    fn upload(name: &str, mime: &str, data: &[u8]) -> UploadFile {
        UploadFile {
            filename: name.to_string(),
            content_type: mime.to_string(),
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_accepts_png() {
        let file = upload("out.png", "image/png", PNG_HEADER);
        assert!(validate_upload(&file, &UploadPolicy::default()).is_ok());
    }

    #[test]
    fn test_accepts_jpeg() {
        let file = upload("out.jpg", "image/jpeg", JPEG_HEADER);
        assert!(validate_upload(&file, &UploadPolicy::default()).is_ok());
    }

    #[test]
    fn test_accepts_gif() {
        let file = upload("anim.gif", "image/gif", GIF_HEADER);
        assert!(validate_upload(&file, &UploadPolicy::default()).is_ok());
    }

    #[test]
    fn test_accepts_jpg_alias() {
        let file = upload("out.jpg", "image/jpg", JPEG_HEADER);
        assert!(validate_upload(&file, &UploadPolicy::default()).is_ok());
    }

    #[test]
    fn test_rejects_disallowed_declared_type() {
        let file = upload("doc.pdf", "application/pdf", b"%PDF-1.4");
        let err = validate_upload(&file, &UploadPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("not allowed"));
    }

    #[test]
    fn test_rejects_garbage_claiming_png() {
        let file = upload("fake.png", "image/png", b"definitely not a png");
        let err = validate_upload(&file, &UploadPolicy::default()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_rejects_pdf_claiming_png() {
        // Valid magic bytes of a disallowed format behind an allowed claim
        let file = upload("fake.png", "image/png", b"%PDF-1.4 fake content");
        let err = validate_upload(&file, &UploadPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn test_rejects_oversize() {
        let policy = UploadPolicy::new(
            ALLOWED_IMAGE_TYPES.iter().map(|t| t.to_string()),
            16,
        );
        let mut data = PNG_HEADER.to_vec();
        data.extend_from_slice(&[0u8; 32]);
        let file = upload("big.png", "image/png", &data);
        let err = validate_upload(&file, &policy).unwrap_err();
        assert!(err.to_string().contains("maximum size"));
    }

    #[test]
    fn test_size_boundary_at_limit() {
        let mut data = PNG_HEADER.to_vec();
        data.resize(64, 0);
        let policy = UploadPolicy::new(
            ALLOWED_IMAGE_TYPES.iter().map(|t| t.to_string()),
            64,
        );
        let file = upload("exact.png", "image/png", &data);
        assert!(validate_upload(&file, &policy).is_ok());
    }

    #[test]
    fn test_rejects_empty_file() {
        let file = upload("empty.png", "image/png", &[]);
        let err = validate_upload(&file, &UploadPolicy::default()).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
