//! Prompt templates.
//!
//! A [`Prompt`] wraps a Jinja-style template string. Rendering is a pure
//! function of the template and the supplied parameters; a parameter the
//! template references but the caller did not supply is an error.

use minijinja::{Environment, UndefinedBehavior};
use serde::{Deserialize, Serialize};

use crate::error::TemplateError;

/// Named render parameters.
pub type Params = serde_json::Map<String, serde_json::Value>;

/// Build [`Params`] from a JSON object literal.
///
/// Non-object values produce an empty parameter set.
pub fn params(value: serde_json::Value) -> Params {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Params::new(),
    }
}

/// The template environment shared by prompts and instruction templates.
///
/// Undefined variables are errors and the first newline after a block tag
/// is dropped, so `{% if %}` sections leave no blank lines behind.
pub(crate) fn environment() -> Environment<'static> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_trim_blocks(true);
    env
}

/// A parameterized template string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub template: String,
}

impl Prompt {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Render the template with the given parameters.
    pub fn render(&self, params: &Params) -> Result<String, TemplateError> {
        environment()
            .render_str(&self.template, params)
            .map_err(TemplateError::from)
    }
}

impl From<&str> for Prompt {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for Prompt {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}
