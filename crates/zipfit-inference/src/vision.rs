//! Vision OCR backend implementation.

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use zipfit_core::{defaults, Error, OcrBackend, Result};

/// Default Vision API endpoint.
pub const DEFAULT_VISION_URL: &str = "https://vision.googleapis.com";

/// Google-Vision-style OCR backend using document text detection.
pub struct VisionOcrBackend {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl VisionOcrBackend {
    /// Create a new Vision backend with custom configuration.
    pub fn with_config(base_url: String, api_key: String) -> Self {
        let timeout_secs = std::env::var("ZIPFIT_OCR_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::OCR_TIMEOUT_SECS);

        info!(
            subsystem = "inference",
            component = "vision",
            "Initializing Vision OCR backend"
        );

        Self {
            client: Client::new(),
            base_url,
            api_key,
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `VISION_API_KEY` | — (required) | API key |
    /// | `VISION_BASE_URL` | Google endpoint | Override for testing |
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("VISION_API_KEY")
            .map_err(|_| Error::Config("VISION_API_KEY is not set".to_string()))?;
        let base_url =
            std::env::var("VISION_BASE_URL").unwrap_or_else(|_| DEFAULT_VISION_URL.to_string());
        Ok(Self::with_config(base_url, api_key))
    }

    /// Annotate the file and return the recognized text (may be empty).
    async fn annotate(&self, data: &[u8]) -> Result<String> {
        let content = base64::engine::general_purpose::STANDARD.encode(data);

        let request = AnnotateBatchRequest {
            requests: vec![AnnotateRequest {
                image: ImageContent { content },
                features: vec![Feature {
                    feature_type: "DOCUMENT_TEXT_DETECTION".to_string(),
                }],
            }],
        };

        let url = format!("{}/v1/images:annotate?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Ocr(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Ocr(format!("Vision returned {}: {}", status, body)));
        }

        let result: AnnotateBatchResponse = response
            .json()
            .await
            .map_err(|e| Error::Ocr(format!("Failed to parse response: {}", e)))?;

        let Some(annotation) = result.responses.into_iter().next() else {
            return Err(Error::Ocr("Vision returned an empty response".to_string()));
        };

        if let Some(api_error) = annotation.error {
            return Err(Error::Ocr(format!(
                "Vision annotation failed: {}",
                api_error.message
            )));
        }

        // No annotation block means no recognizable text, which is a valid
        // result distinct from the failures above.
        Ok(annotation
            .full_text_annotation
            .map(|a| a.text)
            .unwrap_or_default())
    }
}

#[derive(Serialize)]
struct AnnotateBatchRequest {
    requests: Vec<AnnotateRequest>,
}

#[derive(Serialize)]
struct AnnotateRequest {
    image: ImageContent,
    features: Vec<Feature>,
}

#[derive(Serialize)]
struct ImageContent {
    content: String,
}

#[derive(Serialize)]
struct Feature {
    #[serde(rename = "type")]
    feature_type: String,
}

#[derive(Deserialize)]
struct AnnotateBatchResponse {
    #[serde(default)]
    responses: Vec<AnnotateResponse>,
}

#[derive(Deserialize)]
struct AnnotateResponse {
    #[serde(rename = "fullTextAnnotation")]
    full_text_annotation: Option<TextAnnotation>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct TextAnnotation {
    text: String,
}

#[derive(Deserialize)]
struct ApiError {
    message: String,
}

#[async_trait]
impl OcrBackend for VisionOcrBackend {
    async fn detect_text(&self, data: &[u8], mime_type: &str) -> Result<bool> {
        debug!(
            subsystem = "inference",
            component = "vision",
            op = "detect_text",
            mime_type,
            "Probing for text content"
        );
        let text = self.annotate(data).await?;
        Ok(!text.trim().is_empty())
    }

    async fn recognize(&self, data: &[u8], mime_type: &str) -> Result<String> {
        debug!(
            subsystem = "inference",
            component = "vision",
            op = "recognize",
            mime_type,
            "Running OCR"
        );
        let text = self.annotate(data).await?;
        debug!(
            subsystem = "inference",
            component = "vision",
            op = "recognize",
            response_len = text.len(),
            "OCR complete"
        );
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn backend_for(server: &MockServer) -> VisionOcrBackend {
        VisionOcrBackend::with_config(server.uri(), "test-key".to_string())
    }

    #[tokio::test]
    async fn test_recognize_returns_annotation_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/images:annotate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{"fullTextAnnotation": {"text": "청약 공고문 2026"}}]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let text = backend.recognize(b"bytes", "image/png").await.unwrap();
        assert_eq!(text, "청약 공고문 2026");
    }

    #[tokio::test]
    async fn test_no_annotation_is_empty_text_not_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"responses": [{}]})),
            )
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let text = backend.recognize(b"bytes", "image/png").await.unwrap();
        assert!(text.is_empty());

        let has_text = backend.detect_text(b"bytes", "image/png").await.unwrap();
        assert!(!has_text);
    }

    #[tokio::test]
    async fn test_annotation_error_is_ocr_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{"error": {"message": "image too large"}}]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        let err = backend.recognize(b"bytes", "image/png").await.unwrap_err();
        match err {
            Error::Ocr(msg) => assert!(msg.contains("image too large")),
            other => panic!("Expected Ocr error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_http_failure_is_error_not_empty() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert!(backend.recognize(b"bytes", "image/png").await.is_err());
        assert!(backend.detect_text(b"bytes", "image/png").await.is_err());
    }

    #[tokio::test]
    async fn test_detect_text_true_on_content() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "responses": [{"fullTextAnnotation": {"text": "내용"}}]
            })))
            .mount(&server)
            .await;

        let backend = backend_for(&server);
        assert!(backend.detect_text(b"bytes", "application/pdf").await.unwrap());
    }
}
