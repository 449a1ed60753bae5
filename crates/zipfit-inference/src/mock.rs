//! Scripted mock backends for tests.
//!
//! Always compiled (not gated behind `cfg(test)`) so downstream crates'
//! integration tests can drive the pipeline without live services.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use zipfit_core::{Error, GenerationBackend, OcrBackend, Result, TextExtractor};

/// Scripted generation backend returning one fixed reply or failure.
pub struct MockGenerationBackend {
    response: std::result::Result<String, String>,
    calls: AtomicU32,
}

impl MockGenerationBackend {
    /// Always reply with `response`.
    pub fn with_response(response: impl Into<String>) -> Self {
        Self {
            response: Ok(response.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Always fail with an inference error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            response: Err(message.into()),
            calls: AtomicU32::new(0),
        }
    }

    /// Number of generate calls served so far.
    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate(&self, _prompt: &str, _temperature: f64, _max_tokens: u32) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.response {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(Error::Inference(message.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "mock-gen"
    }
}

/// Scripted OCR backend with independently configurable probe and
/// recognition behavior.
pub struct MockOcrBackend {
    detect: std::result::Result<bool, String>,
    recognize: std::result::Result<String, String>,
    detect_calls: AtomicU32,
    recognize_calls: AtomicU32,
}

impl MockOcrBackend {
    /// Probe says `needs_ocr`; recognition returns `text`.
    pub fn with_text(needs_ocr: bool, text: impl Into<String>) -> Self {
        Self {
            detect: Ok(needs_ocr),
            recognize: Ok(text.into()),
            detect_calls: AtomicU32::new(0),
            recognize_calls: AtomicU32::new(0),
        }
    }

    /// Both operations fail with an OCR error.
    pub fn failing(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            detect: Err(message.clone()),
            recognize: Err(message),
            detect_calls: AtomicU32::new(0),
            recognize_calls: AtomicU32::new(0),
        }
    }

    /// Probe fails but recognition works (exercises the fail-open path).
    pub fn with_failing_detect(text: impl Into<String>) -> Self {
        Self {
            detect: Err("detection unavailable".to_string()),
            recognize: Ok(text.into()),
            detect_calls: AtomicU32::new(0),
            recognize_calls: AtomicU32::new(0),
        }
    }

    pub fn detect_calls(&self) -> u32 {
        self.detect_calls.load(Ordering::SeqCst)
    }

    pub fn recognize_calls(&self) -> u32 {
        self.recognize_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrBackend for MockOcrBackend {
    async fn detect_text(&self, _data: &[u8], _mime_type: &str) -> Result<bool> {
        self.detect_calls.fetch_add(1, Ordering::SeqCst);
        match &self.detect {
            Ok(has_text) => Ok(*has_text),
            Err(message) => Err(Error::Ocr(message.clone())),
        }
    }

    async fn recognize(&self, _data: &[u8], _mime_type: &str) -> Result<String> {
        self.recognize_calls.fetch_add(1, Ordering::SeqCst);
        match &self.recognize {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(Error::Ocr(message.clone())),
        }
    }
}

/// Scripted direct text extractor.
pub struct MockTextExtractor {
    result: std::result::Result<String, String>,
}

impl MockTextExtractor {
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            result: Ok(text.into()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            result: Err(message.into()),
        }
    }
}

#[async_trait]
impl TextExtractor for MockTextExtractor {
    async fn extract(&self, _data: &[u8], _mime_type: &str) -> Result<String> {
        match &self.result {
            Ok(text) => Ok(text.clone()),
            Err(message) => Err(Error::Internal(message.clone())),
        }
    }
}
