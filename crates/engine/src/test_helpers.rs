//! Shared test helpers for engine tests.

use std::sync::{Arc, Mutex};

use baton_core::error::{GenerationError, ToolExecutionError};
use baton_core::runtime::{GenerateRequest, GenerateResponse, GenerationRuntime};
use baton_core::tool::{Arguments, FnTool, Tool};
use serde_json::json;

/// A runtime that returns a sequence of scripted responses and records
/// every request it receives.
///
/// Panics if more calls are made than responses provided.
pub struct ScriptedRuntime {
    responses: Mutex<Vec<Result<String, GenerationError>>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl ScriptedRuntime {
    pub fn new(responses: Vec<Result<String, GenerationError>>) -> Self {
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A runtime answering each call with the next text.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok(t.to_string())).collect())
    }

    pub fn single_text(text: &str) -> Self {
        Self::texts(&[text])
    }

    pub fn failing(error: GenerationError) -> Self {
        Self::new(vec![Err(error)])
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The prompts sent so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

#[async_trait::async_trait]
impl GenerationRuntime for ScriptedRuntime {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        request: GenerateRequest,
    ) -> Result<GenerateResponse, GenerationError> {
        let mut requests = self.requests.lock().unwrap();
        let responses = self.responses.lock().unwrap();
        let call = requests.len();
        if call >= responses.len() {
            panic!(
                "ScriptedRuntime: no more responses (call #{}, have {})",
                call,
                responses.len()
            );
        }
        let model = request.params.model.clone();
        requests.push(request);
        responses[call].clone().map(|text| make_response(&text, &model))
    }
}

/// A raw response as the runtime would return it.
pub fn make_response(text: &str, model: &str) -> GenerateResponse {
    GenerateResponse {
        response: text.into(),
        model: model.into(),
        created_at: "2024-05-23T08:34:32.980570344Z".into(),
        total_duration: 5_043_500_667,
        eval_duration: 4_709_213_000,
        load_duration: 5_025_959,
        prompt_eval_duration: 325_953_000,
    }
}

pub fn runtime(scripted: &Arc<ScriptedRuntime>) -> Arc<dyn GenerationRuntime> {
    Arc::clone(scripted) as Arc<dyn GenerationRuntime>
}

/// `mytool` with schema `{name: string}`; returns a greeting.
pub fn greet_tool(tool_name: &str) -> Arc<dyn Tool> {
    let mut schema = Arguments::new();
    schema.insert("name".into(), json!("string"));
    Arc::new(FnTool::new(tool_name, "Greets someone by name", schema, |args| {
        let name = args.get("name").and_then(|v| v.as_str()).unwrap_or("nobody");
        Ok(json!(format!("hello {name}")))
    }))
}

/// A tool whose action always fails.
pub fn broken_tool() -> Arc<dyn Tool> {
    Arc::new(FnTool::new("broken", "Always fails", Arguments::new(), |_| {
        Err(ToolExecutionError::new("broken", "disk on fire"))
    }))
}
