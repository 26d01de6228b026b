//! Centralized default constants for promptdeck.
//!
//! Single source of truth for shared default values; all crates reference
//! these constants instead of defining their own magic numbers.

// =============================================================================
// UPLOAD POLICY
// =============================================================================

/// Maximum accepted upload size in bytes (50 MiB, matching the UI policy).
pub const MAX_UPLOAD_SIZE_BYTES: usize = 50 * 1024 * 1024;

/// MIME types accepted for card images.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif"];

// =============================================================================
// SIGNED URLS
// =============================================================================

/// Default time-to-live for signed read URLs, in seconds (1 hour).
pub const SIGNED_URL_TTL_SECS: u64 = 3600;

// =============================================================================
// OBJECT KEYS
// =============================================================================

/// Length of the random token embedded in generated object keys.
pub const OBJECT_KEY_TOKEN_LEN: usize = 12;

/// Extension used when an uploaded filename carries none.
pub const OBJECT_KEY_FALLBACK_EXT: &str = "bin";
