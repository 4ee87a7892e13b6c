//! Ollama runtime implementation.
//!
//! Talks to the native `/api/generate` endpoint of an Ollama server (or any
//! server exposing the same wire format) with streaming disabled, so each
//! call yields exactly one complete response.

use async_trait::async_trait;
use baton_config::GenerationConfig;
use baton_core::error::GenerationError;
use baton_core::runtime::{GenerateRequest, GenerateResponse, GenerationRuntime};
use serde::Serialize;
use tracing::{debug, warn};

/// Default address of a local Ollama server.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// A generation runtime backed by an Ollama server.
pub struct OllamaRuntime {
    base_url: String,
    client: reqwest::Client,
}

/// Sampling options in the runtime's wire format.
#[derive(Debug, Serialize)]
struct ApiOptions {
    num_predict: u32,
    temperature: f32,
    top_p: f32,
    top_k: u32,
}

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: ApiOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

impl OllamaRuntime {
    /// Create a runtime talking to `base_url` (e.g. `http://localhost:11434`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Create a runtime from the `[generation]` config section.
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(&config.url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build the JSON body for `/api/generate`.
    fn request_body(request: &GenerateRequest) -> ApiRequest<'_> {
        let params = &request.params;
        ApiRequest {
            model: &params.model,
            prompt: &request.prompt,
            stream: false,
            options: ApiOptions {
                num_predict: params.num_predict,
                temperature: params.temperature,
                top_p: params.top_p,
                top_k: params.top_k,
            },
            format: params.format.as_deref(),
        }
    }

    /// Decode a successful response body.
    fn parse_response(body: &str) -> std::result::Result<GenerateResponse, GenerationError> {
        serde_json::from_str(body)
            .map_err(|e| GenerationError::InvalidResponse(format!("Failed to parse response: {e}")))
    }
}

impl Default for OllamaRuntime {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl GenerationRuntime for OllamaRuntime {
    fn name(&self) -> &str {
        "ollama"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let body = Self::request_body(&request);

        debug!(
            model = %request.params.model,
            num_predict = request.params.num_predict,
            json = request.params.format.is_some(),
            "Sending generate request"
        );

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 404 {
            return Err(GenerationError::ModelNotFound(request.params.model));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Runtime returned error");
            return Err(GenerationError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Self::parse_response(&text)
    }

    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        Ok(response.status().is_success())
    }
}
