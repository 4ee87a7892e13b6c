//! Generation options and their resolution against defaults.

use serde::{Deserialize, Serialize};

/// Process-wide generation defaults.
///
/// Passed explicitly into the generator rather than read from global state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationDefaults {
    /// Model used when a request does not override it.
    pub model: String,
    /// Maximum number of tokens to generate.
    pub tokens: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            model: "gemma".into(),
            tokens: 64,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.9,
        }
    }
}

/// Per-call generation options. Unset fields defer to [`GenerationDefaults`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Options {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Ask the runtime to constrain output to JSON.
    #[serde(default)]
    pub json_output: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_override: Option<String>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(mut self, tokens: u32) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model_override = Some(model.into());
        self
    }

    /// Merge these options over `defaults`, producing a complete parameter set.
    pub fn resolve(&self, defaults: &GenerationDefaults) -> GenerationParams {
        GenerationParams {
            model: self
                .model_override
                .clone()
                .unwrap_or_else(|| defaults.model.clone()),
            num_predict: self.tokens.unwrap_or(defaults.tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            top_k: defaults.top_k,
            top_p: defaults.top_p,
            format: self.json_output.then(|| "json".to_string()),
        }
    }
}

/// The fully-resolved parameters handed to the generation runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub model: String,
    pub num_predict: u32,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}
