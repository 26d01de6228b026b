//! Error types for promptdeck.

use thiserror::Error;

/// Result type alias using promptdeck's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for promptdeck operations.
///
/// The taxonomy mirrors the lifecycle contract: validation failures never
/// touch storage or the repository, `CardNotFound` surfaces verbatim,
/// attachment I/O aborts before any record mutation, and persistence
/// failures leave the prior record as the last known-good state.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing/empty required field, disallowed media type, or oversize file.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Requested attachment slot transition is not legal (e.g. a bare
    /// remove on a mandatory slot).
    #[error("Invalid slot transition: {0}")]
    InvalidSlotTransition(String),

    /// Card not found
    #[error("Card not found: {0}")]
    CardNotFound(uuid::Uuid),

    /// Attachment store put/delete/url failure
    #[error("Attachment I/O error: {0}")]
    AttachmentIo(String),

    /// Repository read/write failure
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for Error {
    fn from(e: sqlx::Error) -> Self {
        Error::Persistence(e.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::AttachmentIo(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Persistence(format!("serialization: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("prompt must not be empty".to_string());
        assert_eq!(err.to_string(), "Validation error: prompt must not be empty");
    }

    #[test]
    fn test_error_display_invalid_slot_transition() {
        let err = Error::InvalidSlotTransition("output: remove without replacement".to_string());
        assert_eq!(
            err.to_string(),
            "Invalid slot transition: output: remove without replacement"
        );
    }

    #[test]
    fn test_error_display_card_not_found() {
        let id = Uuid::nil();
        let err = Error::CardNotFound(id);
        assert_eq!(err.to_string(), format!("Card not found: {}", id));
    }

    #[test]
    fn test_error_display_attachment_io() {
        let err = Error::AttachmentIo("upload failed".to_string());
        assert_eq!(err.to_string(), "Attachment I/O error: upload failed");
    }

    #[test]
    fn test_error_display_persistence() {
        let err = Error::Persistence("connection reset".to_string());
        assert_eq!(err.to_string(), "Persistence error: connection reset");
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        match err {
            Error::AttachmentIo(msg) => assert!(msg.contains("file not found")),
            _ => panic!("Expected AttachmentIo error"),
        }
    }

    #[test]
    fn test_from_sqlx_error() {
        let err: Error = sqlx::Error::RowNotFound.into();
        match err {
            Error::Persistence(_) => {}
            _ => panic!("Expected Persistence error"),
        }
    }

    #[test]
    fn test_card_not_found_with_random_uuid() {
        let id = Uuid::new_v4();
        let err = Error::CardNotFound(id);
        assert!(err.to_string().contains(&id.to_string()));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }

    #[test]
    fn test_result_type_ok() {
        fn get_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(get_result().unwrap(), 42);
    }
}
