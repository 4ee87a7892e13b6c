//! Tool trait and the textual tool-call protocol.
//!
//! Models invoke tools by replying with a sentinel followed by JSON:
//!
//! ```text
//! :T:<tool-name>:{"name": "x"}
//! :T:<tool-name>:{"arguments": {"name": "x"}}
//! ```
//!
//! Both payload forms are accepted. When the payload holds an `arguments`
//! object, that object is taken as the arguments.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{ToolCallError, ToolExecutionError};

/// Prefix that opens every tool-call sentinel.
pub const SENTINEL_PREFIX: &str = ":T:";

/// Named tool arguments.
pub type Arguments = Map<String, Value>;

/// The sentinel a reply must start with to call `name`.
pub fn sentinel(name: &str) -> String {
    format!("{SENTINEL_PREFIX}{name}:")
}

/// The core Tool trait.
///
/// A tool is described to the model by name, description and an argument
/// schema mapping each argument name to a type hint (e.g. `"string"`).
#[async_trait]
pub trait Tool: Send + Sync {
    /// The unique name of this tool within an instruction.
    fn name(&self) -> &str;

    /// A description of what this tool does (sent to the model).
    fn description(&self) -> &str;

    /// Argument name → type hint.
    fn arguments(&self) -> Arguments;

    /// Run the tool. The result becomes the reply's data verbatim.
    async fn execute(&self, arguments: Arguments) -> Result<Value, ToolExecutionError>;

    /// The deterministic description of this tool rendered into prompts.
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description(), self.arguments())
    }
}

/// A tool as presented to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub arguments: Value,
    /// Pretty-printed JSON of name/description/arguments, keys sorted
    pub definition: String,
    /// Canonical usage example, e.g. `:T:exec:{"command":"string"}`
    pub usage: String,
}

impl ToolDescriptor {
    pub fn new(name: &str, description: &str, arguments: Arguments) -> Self {
        let arguments = canonical(&Value::Object(arguments));

        let mut definition = Map::new();
        definition.insert("arguments".into(), arguments.clone());
        definition.insert("description".into(), Value::String(description.into()));
        definition.insert("name".into(), Value::String(name.into()));
        let definition = serde_json::to_string_pretty(&Value::Object(definition))
            .unwrap_or_default();

        let usage = format!("{}{}", sentinel(name), arguments);

        Self {
            name: name.into(),
            description: description.into(),
            arguments,
            definition,
            usage,
        }
    }
}

/// Rebuild every object with its keys in sorted order.
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                sorted.insert(key.clone(), canonical(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}

/// Whether `content` opens with the call sentinel for `name`.
pub fn is_call_to(name: &str, content: &str) -> bool {
    content
        .strip_prefix(SENTINEL_PREFIX)
        .and_then(|rest| rest.strip_prefix(name))
        .is_some_and(|rest| rest.starts_with(':'))
}

/// Parse the arguments of a call to `tool` out of a reply's content.
///
/// Keys not declared in the tool's argument schema are rejected.
pub fn parse_call(tool: &dyn Tool, content: &str) -> Result<Arguments, ToolCallError> {
    let name = tool.name();
    let payload = content
        .strip_prefix(sentinel(name).as_str())
        .ok_or_else(|| ToolCallError::MalformedJson {
            tool: name.into(),
            reason: format!("reply does not start with '{}'", sentinel(name)),
        })?;

    let document: Value =
        serde_json::from_str(payload).map_err(|e| ToolCallError::MalformedJson {
            tool: name.into(),
            reason: e.to_string(),
        })?;

    let mut object = match document {
        Value::Object(object) => object,
        _ => return Err(ToolCallError::NotAnObject { tool: name.into() }),
    };

    let arguments = match object.remove("arguments") {
        Some(Value::Object(wrapped)) => {
            // The wrapper may echo the descriptor's own fields, nothing else.
            if let Some(sibling) = object
                .keys()
                .find(|k| !matches!(k.as_str(), "name" | "description"))
            {
                return Err(ToolCallError::UnknownArgument {
                    tool: name.into(),
                    argument: sibling.clone(),
                });
            }
            wrapped
        }
        Some(other) => {
            object.insert("arguments".into(), other);
            object
        }
        None => object,
    };

    let schema = tool.arguments();
    if let Some(unknown) = arguments.keys().find(|k| !schema.contains_key(*k)) {
        return Err(ToolCallError::UnknownArgument {
            tool: name.into(),
            argument: unknown.clone(),
        });
    }

    Ok(arguments)
}

/// A tool backed by a closure.
pub struct FnTool<F> {
    name: String,
    description: String,
    arguments: Arguments,
    action: F,
}

impl<F> FnTool<F>
where
    F: Fn(Arguments) -> Result<Value, ToolExecutionError> + Send + Sync,
{
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        arguments: Arguments,
        action: F,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            arguments,
            action,
        }
    }
}

#[async_trait]
impl<F> Tool for FnTool<F>
where
    F: Fn(Arguments) -> Result<Value, ToolExecutionError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn arguments(&self) -> Arguments {
        self.arguments.clone()
    }

    async fn execute(&self, arguments: Arguments) -> Result<Value, ToolExecutionError> {
        (self.action)(arguments)
    }
}
