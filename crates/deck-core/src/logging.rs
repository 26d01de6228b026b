//! Structured logging schema and field name constants for promptdeck.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (best-effort cleanup failure, orphaned object) |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

/// Subsystem originating the log event.
/// Values: "api", "cards", "db", "store"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "reconciler", "lifecycle", "pool", "fs_store"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "create_card", "update_card", "retire", "put"
pub const OPERATION: &str = "op";

/// Card UUID being operated on.
pub const CARD_ID: &str = "card_id";

/// Attachment store path involved in the operation.
pub const STORAGE_PATH: &str = "storage_path";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of results returned by a query.
pub const RESULT_COUNT: &str = "result_count";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
