//! Generation runtime trait: the abstraction over text-completion backends.
//!
//! A runtime takes one fully-rendered prompt plus resolved parameters and
//! returns the raw completion. It knows nothing about instructions, tools
//! or retrieval.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::options::GenerationParams;

/// A single text-completion request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// The rendered prompt text
    pub prompt: String,

    /// Resolved generation parameters (model, token limit, sampling)
    pub params: GenerationParams,
}

/// The raw response of a text-completion call.
///
/// Field names follow the runtime's wire format; durations are nanoseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub response: String,
    pub model: String,
    /// ISO-8601 creation timestamp
    pub created_at: String,
    #[serde(default)]
    pub total_duration: u64,
    #[serde(default)]
    pub eval_duration: u64,
    #[serde(default)]
    pub load_duration: u64,
    #[serde(default)]
    pub prompt_eval_duration: u64,
}

/// The core GenerationRuntime trait.
///
/// Implementations issue exactly one call per `generate` and never retry;
/// retry policy belongs to the caller.
#[async_trait]
pub trait GenerationRuntime: Send + Sync {
    /// A human-readable name for this runtime (e.g., "ollama").
    fn name(&self) -> &str;

    /// Run one completion.
    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> std::result::Result<GenerateResponse, GenerationError>;

    /// Health check: can we reach the runtime?
    async fn health_check(&self) -> std::result::Result<bool, GenerationError> {
        Ok(true)
    }
}
