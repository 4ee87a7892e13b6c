//! Error types for the Baton domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error type.

use thiserror::Error;

/// The top-level error type for all Baton operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Template errors ---
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    // --- Generation runtime errors ---
    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    // --- Tool protocol errors ---
    #[error("Tool call error: {0}")]
    ToolCall(#[from] ToolCallError),

    #[error("Tool execution error: {0}")]
    ToolExecution(#[from] ToolExecutionError),

    // --- Document store errors ---
    #[error("Document store error: {0}")]
    Store(#[from] StoreError),

    // --- Declared response parsers ---
    #[error("Parser '{parser}' failed: {reason}")]
    Parse { parser: String, reason: String },

    // --- Malformed requests ---
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// A template could not be rendered.
#[derive(Debug, Clone, Error)]
pub enum TemplateError {
    #[error("invalid template syntax: {0}")]
    Syntax(String),

    #[error("undefined variable: {0}")]
    UndefinedVariable(String),

    #[error("render failed: {0}")]
    Render(String),
}

impl From<minijinja::Error> for TemplateError {
    fn from(err: minijinja::Error) -> Self {
        use minijinja::ErrorKind;
        match err.kind() {
            ErrorKind::SyntaxError | ErrorKind::UnknownFilter | ErrorKind::UnknownTest => {
                TemplateError::Syntax(err.to_string())
            }
            ErrorKind::UndefinedError => TemplateError::UndefinedVariable(err.to_string()),
            _ => TemplateError::Render(err.to_string()),
        }
    }
}

/// The generation runtime call failed.
#[derive(Debug, Clone, Error)]
pub enum GenerationError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response from runtime: {0}")]
    InvalidResponse(String),
}

/// A reply carried a tool-call sentinel but its payload was unusable.
#[derive(Debug, Clone, Error)]
pub enum ToolCallError {
    #[error("malformed JSON in call to '{tool}': {reason}")]
    MalformedJson { tool: String, reason: String },

    #[error("arguments for '{tool}' must be a JSON object")]
    NotAnObject { tool: String },

    #[error("unknown argument '{argument}' for tool '{tool}'")]
    UnknownArgument { tool: String, argument: String },
}

/// A tool's own action failed.
#[derive(Debug, Clone, Error)]
#[error("{tool_name} failed: {reason}")]
pub struct ToolExecutionError {
    pub tool_name: String,
    pub reason: String,
}

impl ToolExecutionError {
    pub fn new(tool_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            tool_name: tool_name.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
