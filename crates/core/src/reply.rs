//! Replies: the structured result of one generation call.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GenerationError;
use crate::runtime::GenerateResponse;

/// A tool call that a parser recognized and executed for a reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolInvocation {
    /// Name of the invoked tool
    pub name: String,

    /// The arguments parsed from the reply
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

/// The result of one generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    /// Raw generated text
    pub content: String,

    /// Interpreted data. Equals `content` unless a parser matched.
    pub data: serde_json::Value,

    /// Which model actually responded
    pub model_name: String,

    pub created_at: DateTime<Utc>,

    pub total_duration: Duration,
    pub eval_duration: Duration,
    pub load_duration: Duration,
    pub prompt_duration: Duration,

    /// The tool invoked on behalf of this reply, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool: Option<ToolInvocation>,

    /// Name of the parser that interpreted this reply, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parser: Option<String>,
}

impl Reply {
    /// Map a raw runtime response into a reply.
    pub fn from_response(resp: GenerateResponse) -> Result<Self, GenerationError> {
        let created_at = DateTime::parse_from_rfc3339(&resp.created_at)
            .map_err(|e| {
                GenerationError::InvalidResponse(format!(
                    "bad created_at '{}': {e}",
                    resp.created_at
                ))
            })?
            .with_timezone(&Utc);

        Ok(Self {
            data: serde_json::Value::String(resp.response.clone()),
            content: resp.response,
            model_name: resp.model,
            created_at,
            total_duration: Duration::from_nanos(resp.total_duration),
            eval_duration: Duration::from_nanos(resp.eval_duration),
            load_duration: Duration::from_nanos(resp.load_duration),
            prompt_duration: Duration::from_nanos(resp.prompt_eval_duration),
            tool: None,
            parser: None,
        })
    }

    /// Whether a parser has interpreted this reply.
    pub fn is_parsed(&self) -> bool {
        self.parser.is_some()
    }
}
