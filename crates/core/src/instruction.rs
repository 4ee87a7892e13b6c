//! Instructions: structured generation requests rendered into one prompt.
//!
//! An instruction composes a role, tone, level of detail, optional context,
//! optional tools and a query into a single prompt via an outer template.
//! Facets that are not set leave no trace in the rendered prompt.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result, TemplateError};
use crate::parser::{ResponseParser, ToolParser};
use crate::prompt::{Params, Prompt};
use crate::tool::{Tool, ToolDescriptor};

/// The outer template used when an instruction does not override it.
pub const DEFAULT_INSTRUCTION_TEMPLATE: &str = r#"{% if role %}
You should behave as {{ role }}.
{% endif %}
{% if tone %}
You should adopt a tone that is {{ tone }}.
{% endif %}
{% if detail %}
You should answer {{ detail }}.
{% endif %}
{% if context %}
Using only the following context, answer the question below:

Context: {{ context }}

{% endif %}
{% if tools %}
You have the following tools available. If, and only if, you need to use one of them, format your answer as :T:toolname:arguments where the arguments are strict JSON. For example, for a tool with "name": "mytool" and "arguments": {"name": "string"}, reply with

:T:mytool:{"name":"string"}

The format is very important because a computer will parse it strictly. If no tool is the most appropriate way to reply, answer without one, using any other knowledge you have.

{% for tool in tools %}
{{ tool.definition }}
Usage: {{ tool.usage }}

{% endfor %}
{% endif %}
{{ query }}
"#;

/// Directs the engine to fill the context from a document store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Injection {
    /// Number of documents to retrieve
    pub result_count: usize,
}

impl Default for Injection {
    fn default() -> Self {
        Self { result_count: 10 }
    }
}

/// Everything the outer template gets to see.
#[derive(Serialize)]
struct Sections<'a> {
    role: Option<&'a str>,
    tone: Option<&'a str>,
    detail: Option<&'a str>,
    context: Option<&'a str>,
    tools: Vec<ToolDescriptor>,
    query: String,
}

/// A structured description of one generation request.
#[derive(Clone)]
pub struct Instruction {
    /// Query template. Takes precedence over `query` when set.
    pub prompt: Option<Prompt>,

    /// Literal query text, used verbatim when no `prompt` is set
    pub query: String,

    pub inject: Option<Injection>,

    pub role: Option<String>,
    pub tone: Option<String>,
    pub detail: Option<String>,

    /// Literal context. Overwritten by retrieval when `inject` is set.
    pub context: Option<String>,

    pub tools: Vec<Arc<dyn Tool>>,
    pub parsers: Vec<Arc<dyn ResponseParser>>,

    /// Outer template assembling all of the above
    pub template: Prompt,
}

impl Default for Instruction {
    fn default() -> Self {
        Self {
            prompt: None,
            query: String::new(),
            inject: None,
            role: None,
            tone: None,
            detail: None,
            context: None,
            tools: Vec::new(),
            parsers: Vec::new(),
            template: Prompt::new(DEFAULT_INSTRUCTION_TEMPLATE),
        }
    }
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Instruction")
            .field("prompt", &self.prompt)
            .field("query", &self.query)
            .field("inject", &self.inject)
            .field("role", &self.role)
            .field("tone", &self.tone)
            .field("detail", &self.detail)
            .field("context", &self.context)
            .field(
                "tools",
                &self.tools.iter().map(|t| t.name()).collect::<Vec<_>>(),
            )
            .field(
                "parsers",
                &self.parsers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Instruction {
    /// An instruction with a literal query.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Self::default()
        }
    }

    /// An instruction whose query is a template.
    pub fn from_prompt(prompt: impl Into<Prompt>) -> Self {
        Self {
            prompt: Some(prompt.into()),
            ..Self::default()
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<Prompt>) -> Self {
        self.prompt = Some(prompt.into());
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn with_tone(mut self, tone: impl Into<String>) -> Self {
        self.tone = Some(tone.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_injection(mut self, inject: Injection) -> Self {
        self.inject = Some(inject);
        self
    }

    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn with_parser(mut self, parser: Arc<dyn ResponseParser>) -> Self {
        self.parsers.push(parser);
        self
    }

    pub fn with_template(mut self, template: impl Into<Prompt>) -> Self {
        self.template = template.into();
        self
    }

    /// Render the query portion: `prompt` if set, otherwise `query` verbatim.
    pub fn render_query(&self, params: &Params) -> std::result::Result<String, TemplateError> {
        match &self.prompt {
            Some(prompt) => prompt.render(params),
            None => Ok(self.query.clone()),
        }
    }

    /// Render the complete prompt through the outer template.
    pub fn render(&self, params: &Params) -> std::result::Result<String, TemplateError> {
        let sections = Sections {
            role: self.role.as_deref(),
            tone: self.tone.as_deref(),
            detail: self.detail.as_deref(),
            context: self.context.as_deref(),
            tools: self.tools.iter().map(|t| t.descriptor()).collect(),
            query: self.render_query(params)?,
        };
        crate::prompt::environment()
            .render_str(&self.template.template, &sections)
            .map_err(TemplateError::from)
    }

    /// A copy of this instruction with `context` replaced by retrieved text.
    pub fn with_retrieved_context(&self, context: String) -> Self {
        if self.context.is_some() {
            warn!("Instruction sets both context and inject; retrieved context wins");
        }
        let mut resolved = self.clone();
        resolved.context = Some(context);
        resolved
    }

    /// Tool parsers in tool order, followed by the declared parsers.
    pub fn effective_parsers(&self) -> Vec<Arc<dyn ResponseParser>> {
        self.tools
            .iter()
            .map(|t| Arc::new(ToolParser::new(Arc::clone(t))) as Arc<dyn ResponseParser>)
            .chain(self.parsers.iter().cloned())
            .collect()
    }

    /// Reject configurations that cannot be dispatched unambiguously.
    pub fn validate(&self) -> Result<()> {
        if self.prompt.is_some() && !self.query.is_empty() {
            warn!("Instruction sets both prompt and query; prompt wins");
        }
        let mut seen = HashSet::new();
        for tool in &self.tools {
            if !seen.insert(tool.name()) {
                return Err(Error::InvalidRequest(format!(
                    "duplicate tool name '{}'",
                    tool.name()
                )));
            }
        }
        Ok(())
    }
}
