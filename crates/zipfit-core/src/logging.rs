//! Structured logging field name constants for zipfit.
//!
//! All crates use these constants for consistent structured logging fields
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |

/// Subsystem originating the log event.
/// Values: "core", "db", "inference", "jobs"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "pipeline", "cache", "gemini", "vision", "worker"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "analyze", "generate", "recognize", "collect"
pub const OPERATION: &str = "op";

/// Document UUID being operated on.
pub const DOCUMENT_ID: &str = "document_id";

/// Offer UUID being operated on.
pub const OFFER_ID: &str = "offer_id";

/// User UUID owning the current upload.
pub const USER_ID: &str = "user_id";

/// Content fingerprint (cache key).
pub const FINGERPRINT: &str = "fingerprint";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt or response.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Model name used for inference.
pub const MODEL: &str = "model";

/// External service guarded by a circuit breaker.
pub const SERVICE: &str = "service";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
