//! Response parsers: interpreting a reply after generation.
//!
//! A parser first decides whether a reply is its business (`matches`) and
//! then extracts data from it (`parse`). Parsers are tried in order and the
//! first match wins; at most one parser ever fires for a reply.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::reply::{Reply, ToolInvocation};
use crate::tool::{self, Tool};

/// What a parser extracted from a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct Parsed {
    /// Becomes `Reply::data`
    pub data: Value,

    /// Set when parsing executed a tool
    pub tool: Option<ToolInvocation>,
}

impl From<Value> for Parsed {
    fn from(data: Value) -> Self {
        Self { data, tool: None }
    }
}

/// The core ResponseParser trait.
#[async_trait]
pub trait ResponseParser: Send + Sync {
    /// A name recorded on replies this parser interprets.
    fn name(&self) -> &str;

    /// Whether this parser recognizes the reply.
    fn matches(&self, reply: &Reply) -> bool;

    /// Extract data from a reply that `matches`.
    async fn parse(&self, reply: &Reply) -> Result<Parsed>;
}

/// Recognizes calls to one tool and executes it.
pub struct ToolParser {
    tool: Arc<dyn Tool>,
    name: String,
}

impl ToolParser {
    pub fn new(tool: Arc<dyn Tool>) -> Self {
        let name = format!("tool:{}", tool.name());
        Self { tool, name }
    }

    pub fn tool(&self) -> &Arc<dyn Tool> {
        &self.tool
    }
}

#[async_trait]
impl ResponseParser for ToolParser {
    fn name(&self) -> &str {
        &self.name
    }

    fn matches(&self, reply: &Reply) -> bool {
        tool::is_call_to(self.tool.name(), &reply.content)
    }

    async fn parse(&self, reply: &Reply) -> Result<Parsed> {
        let arguments = tool::parse_call(self.tool.as_ref(), &reply.content)?;
        debug!(tool = %self.tool.name(), ?arguments, "Executing tool call");
        let data = self.tool.execute(arguments.clone()).await?;
        Ok(Parsed {
            data,
            tool: Some(ToolInvocation {
                name: self.tool.name().to_string(),
                arguments,
            }),
        })
    }
}

/// Parses replies that are a JSON document, optionally inside a code fence.
#[derive(Debug, Clone, Default)]
pub struct JsonParser;

impl JsonParser {
    fn document(content: &str) -> Option<Value> {
        let body = strip_code_fences(content);
        if !(body.starts_with('{') || body.starts_with('[')) {
            return None;
        }
        serde_json::from_str(body).ok()
    }
}

#[async_trait]
impl ResponseParser for JsonParser {
    fn name(&self) -> &str {
        "json"
    }

    fn matches(&self, reply: &Reply) -> bool {
        Self::document(&reply.content).is_some()
    }

    async fn parse(&self, reply: &Reply) -> Result<Parsed> {
        Self::document(&reply.content)
            .map(Parsed::from)
            .ok_or_else(|| Error::Parse {
                parser: self.name().to_string(),
                reason: "reply is not a JSON document".into(),
            })
    }
}

/// Strip markdown code fences from a string.
fn strip_code_fences(s: &str) -> &str {
    let trimmed = s.trim();

    if let Some(rest) = trimmed.strip_prefix("```json") {
        if let Some(json) = rest.strip_suffix("```") {
            return json.trim();
        }
    }
    if let Some(rest) = trimmed.strip_prefix("```") {
        if let Some(json) = rest.strip_suffix("```") {
            return json.trim();
        }
    }

    trimmed
}

/// Run `parsers` over `reply` in order, applying the first match.
///
/// Returns the reply untouched when nothing matches. A matching parser's
/// error is returned as-is.
pub async fn apply(mut reply: Reply, parsers: &[Arc<dyn ResponseParser>]) -> Result<Reply> {
    for parser in parsers {
        if !parser.matches(&reply) {
            continue;
        }
        debug!(parser = %parser.name(), "Parser matched reply");
        let parsed = parser.parse(&reply).await?;
        reply.data = parsed.data;
        reply.tool = parsed.tool;
        reply.parser = Some(parser.name().to_string());
        break;
    }
    Ok(reply)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ToolExecutionError;
    use crate::runtime::GenerateResponse;
    use crate::tool::{Arguments, FnTool};
    use serde_json::json;

    fn reply(content: &str) -> Reply {
        Reply::from_response(GenerateResponse {
            response: content.into(),
            model: "mock-model".into(),
            created_at: "2024-05-23T08:34:32Z".into(),
            total_duration: 0,
            eval_duration: 0,
            load_duration: 0,
            prompt_eval_duration: 0,
        })
        .unwrap()
    }

    fn greet_tool() -> Arc<dyn Tool> {
        let mut schema = Arguments::new();
        schema.insert("name".into(), json!("string"));
        Arc::new(FnTool::new("mytool", "greets someone", schema, |args| {
            Ok(json!(format!("hello {}", args["name"].as_str().unwrap_or(""))))
        }))
    }

    /// Matches everything and records that it ran.
    struct CatchAll;

    #[async_trait]
    impl ResponseParser for CatchAll {
        fn name(&self) -> &str {
            "catch_all"
        }
        fn matches(&self, _reply: &Reply) -> bool {
            true
        }
        async fn parse(&self, _reply: &Reply) -> Result<Parsed> {
            Ok(json!("caught").into())
        }
    }

    #[tokio::test]
    async fn tool_parser_executes_tool() {
        let parser = ToolParser::new(greet_tool());
        let r = reply(r#":T:mytool:{"name":"x"}"#);
        assert!(parser.matches(&r));
        let parsed = parser.parse(&r).await.unwrap();
        assert_eq!(parsed.data, json!("hello x"));
        let call = parsed.tool.unwrap();
        assert_eq!(call.name, "mytool");
        assert_eq!(Value::Object(call.arguments), json!({"name": "x"}));
    }

    #[test]
    fn tool_parser_ignores_other_tools() {
        let parser = ToolParser::new(greet_tool());
        assert!(!parser.matches(&reply(r#":T:othertool:{"name":"x"}"#)));
    }

    #[tokio::test]
    async fn tool_parser_surfaces_malformed_payload() {
        let parser = ToolParser::new(greet_tool());
        let err = parser.parse(&reply(":T:mytool:not json")).await.unwrap_err();
        assert!(matches!(err, Error::ToolCall(_)));
    }

    #[tokio::test]
    async fn tool_failure_is_execution_error() {
        let failing: Arc<dyn Tool> = Arc::new(FnTool::new(
            "broken",
            "always fails",
            Arguments::new(),
            |_| Err(ToolExecutionError::new("broken", "boom")),
        ));
        let parser = ToolParser::new(failing);
        let err = parser.parse(&reply(":T:broken:{}")).await.unwrap_err();
        assert!(matches!(err, Error::ToolExecution(_)));
    }

    #[tokio::test]
    async fn json_parser_handles_fenced_json() {
        let r = reply("```json\n{\"answer\": 42}\n```");
        assert!(JsonParser.matches(&r));
        let parsed = JsonParser.parse(&r).await.unwrap();
        assert_eq!(parsed.data, json!({"answer": 42}));
    }

    #[test]
    fn json_parser_rejects_prose() {
        assert!(!JsonParser.matches(&reply("The answer is 42.")));
        assert!(!JsonParser.matches(&reply("42")));
    }

    #[tokio::test]
    async fn apply_uses_first_match_only() {
        let parsers: Vec<Arc<dyn ResponseParser>> =
            vec![Arc::new(ToolParser::new(greet_tool())), Arc::new(CatchAll)];
        let out = apply(reply(r#":T:mytool:{"name":"x"}"#), &parsers)
            .await
            .unwrap();
        assert_eq!(out.data, json!("hello x"));
        assert_eq!(out.parser.as_deref(), Some("tool:mytool"));
        assert_eq!(out.tool.unwrap().name, "mytool");
    }

    #[tokio::test]
    async fn apply_without_match_keeps_content() {
        let parsers: Vec<Arc<dyn ResponseParser>> = vec![Arc::new(JsonParser)];
        let out = apply(reply("plain text"), &parsers).await.unwrap();
        assert_eq!(out.data, json!("plain text"));
        assert!(out.parser.is_none());
        assert!(out.tool.is_none());
    }
}
