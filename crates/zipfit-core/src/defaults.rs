//! Centralized default constants for the zipfit system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers. When adding new constants, place them in the appropriate
//! section and document the rationale for the chosen value.

// =============================================================================
// UPLOAD
// =============================================================================

/// Maximum accepted upload size in bytes (10 MB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

// =============================================================================
// ANALYSIS PIPELINE
// =============================================================================

/// Maximum characters of raw extracted text stored on an outcome.
pub const EXTRACTED_TEXT_MAX_CHARS: usize = 10_000;

/// Maximum characters of a failure reason stored on a document.
pub const FAILURE_REASON_MAX_CHARS: usize = 500;

/// Default number of concurrently running analyses.
pub const ANALYSIS_MAX_CONCURRENT: usize = 16;

/// Capacity of the analysis submission queue.
pub const ANALYSIS_QUEUE_CAPACITY: usize = 256;

/// Capacity of the worker event broadcast channel.
pub const EVENT_BUS_CAPACITY: usize = 1024;

// =============================================================================
// CACHE
// =============================================================================

/// Result cache TTL in seconds (30 days).
pub const CACHE_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Redis key prefix for analysis results.
pub const CACHE_KEY_PREFIX: &str = "zipfit:analysis:";

/// Default Redis URL.
pub const REDIS_URL: &str = "redis://localhost:6379";

// =============================================================================
// INFERENCE
// =============================================================================

/// Default generation model identifier.
pub const GEN_MODEL: &str = "gemini-1.5-pro";

/// Sampling temperature for criteria extraction. Low for determinism.
pub const EXTRACTION_TEMPERATURE: f64 = 0.2;

/// Output token budget for criteria extraction.
pub const EXTRACTION_MAX_TOKENS: u32 = 2000;

/// Timeout for generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 30;

/// Timeout for OCR requests (seconds).
pub const OCR_TIMEOUT_SECS: u64 = 60;

/// Timeout for local pdftotext extraction (seconds).
pub const PDFTOTEXT_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// RESILIENCE
// =============================================================================

/// Consecutive failures before a circuit breaker opens.
pub const BREAKER_FAILURE_THRESHOLD: u32 = 5;

/// Cooldown before an open breaker admits a probe call (seconds).
pub const BREAKER_COOLDOWN_SECS: u64 = 30;

/// Retries after the first failed attempt.
pub const RETRY_MAX_RETRIES: u32 = 2;

/// Base delay for exponential retry backoff (milliseconds).
pub const RETRY_BASE_DELAY_MS: u64 = 200;

// =============================================================================
// REGISTRY COLLECTOR
// =============================================================================

/// Interval between registry feed collection runs (seconds).
pub const COLLECTOR_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Interval between expiry sweep runs (seconds).
pub const SWEEP_INTERVAL_SECS: u64 = 24 * 60 * 60;

/// Default application window length when the period text is unparseable
/// (days from today).
pub const DEFAULT_APPLICATION_WINDOW_DAYS: i64 = 30;

// =============================================================================
// OCR QUALITY
// =============================================================================

/// Below this many characters the extraction is graded LOW outright.
pub const QUALITY_MIN_CHARS: usize = 100;

/// Hangul ratio below which text is suspect (combined with the ASCII gate).
pub const QUALITY_MIN_HANGUL_RATIO: f64 = 0.1;

/// Digits + ASCII letters below this count, together with a low hangul
/// ratio, grade LOW.
pub const QUALITY_MIN_ASCII_CONTENT: usize = 50;

/// Fewer digits than this grades MEDIUM (criteria are mostly numbers).
pub const QUALITY_MIN_DIGITS: usize = 5;

/// Above this length with a high hangul ratio grades HIGH.
pub const QUALITY_HIGH_CHARS: usize = 500;

/// Hangul ratio above which long text grades HIGH.
pub const QUALITY_HIGH_HANGUL_RATIO: f64 = 0.3;
