//! Gemini generation backend implementation.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use zipfit_core::{defaults, Error, GenerationBackend, Result};

/// Default Gemini API endpoint.
pub const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini generation backend.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    timeout_secs: u64,
}

impl GeminiBackend {
    /// Create a new Gemini backend with custom configuration.
    pub fn with_config(base_url: String, api_key: String, model: String) -> Self {
        let timeout_secs = std::env::var("ZIPFIT_GEN_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(defaults::GEN_TIMEOUT_SECS);

        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        info!(
            subsystem = "inference",
            component = "gemini",
            model = %model,
            "Initializing Gemini backend"
        );

        Self {
            client,
            base_url,
            api_key,
            model,
            timeout_secs,
        }
    }

    /// Create from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GEMINI_API_KEY` | — (required) | API key |
    /// | `GEMINI_MODEL` | `gemini-1.5-pro` | Model identifier |
    /// | `GEMINI_BASE_URL` | Google endpoint | Override for testing |
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| Error::Config("GEMINI_API_KEY is not set".to_string()))?;
        let model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| defaults::GEN_MODEL.to_string());
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_GEMINI_URL.to_string());

        Ok(Self::with_config(base_url, api_key, model))
    }
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Content,
}

#[async_trait]
impl GenerationBackend for GeminiBackend {
    async fn generate(&self, prompt: &str, temperature: f64, max_tokens: u32) -> Result<String> {
        let start = Instant::now();

        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate",
            model = %self.model,
            prompt_len = prompt.len(),
            "Starting generation"
        );

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature,
                max_output_tokens: max_tokens,
            },
        };

        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Inference(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Inference(format!(
                "Gemini returned {}: {}",
                status, body
            )));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Inference(format!("Failed to parse response: {}", e)))?;

        let content = result
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .ok_or_else(|| Error::Inference("Gemini returned no candidates".to_string()))?;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(
            subsystem = "inference",
            component = "gemini",
            op = "generate",
            response_len = content.len(),
            duration_ms = elapsed,
            "Generation complete"
        );
        if elapsed > 20_000 {
            warn!(
                subsystem = "inference",
                component = "gemini",
                duration_ms = elapsed,
                prompt_len = prompt.len(),
                "Slow generation operation"
            );
        }
        Ok(content)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
