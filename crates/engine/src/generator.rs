//! The Generator: renders requests and calls the generation runtime.

use std::sync::Arc;

use baton_core::chain::{Chain, step_params};
use baton_core::error::{Error, Result};
use baton_core::instruction::Instruction;
use baton_core::options::{GenerationDefaults, Options};
use baton_core::parser;
use baton_core::prompt::{Params, Prompt};
use baton_core::reply::Reply;
use baton_core::runtime::{GenerateRequest, GenerationRuntime};
use tracing::{debug, info, warn};

/// Turns text, prompts, instructions and chains into replies.
///
/// Defaults are handed in at construction; the generator reads no global
/// state.
pub struct Generator {
    runtime: Arc<dyn GenerationRuntime>,
    defaults: GenerationDefaults,
}

impl Generator {
    pub fn new(runtime: Arc<dyn GenerationRuntime>, defaults: GenerationDefaults) -> Self {
        Self { runtime, defaults }
    }

    pub fn defaults(&self) -> &GenerationDefaults {
        &self.defaults
    }

    pub fn runtime(&self) -> &Arc<dyn GenerationRuntime> {
        &self.runtime
    }

    /// Whether the runtime is reachable.
    pub async fn health_check(&self) -> Result<bool> {
        Ok(self.runtime.health_check().await?)
    }

    /// One runtime call with `text` as the prompt. No retry.
    pub async fn generate_from_text(&self, text: &str, options: Option<&Options>) -> Result<Reply> {
        let params = match options {
            Some(options) => options.resolve(&self.defaults),
            None => Options::default().resolve(&self.defaults),
        };

        debug!(
            runtime = %self.runtime.name(),
            model = %params.model,
            num_predict = params.num_predict,
            prompt = %text,
            "Generating"
        );

        let response = self
            .runtime
            .generate(GenerateRequest {
                prompt: text.to_string(),
                params,
            })
            .await?;
        let reply = Reply::from_response(response)?;

        debug!(model = %reply.model_name, reply = %reply.content, "Generated");
        Ok(reply)
    }

    pub async fn generate_from_prompt(
        &self,
        prompt: &Prompt,
        options: Option<&Options>,
        params: &Params,
    ) -> Result<Reply> {
        let text = prompt.render(params)?;
        self.generate_from_text(&text, options).await
    }

    /// Render the instruction, generate, then let its tools and parsers
    /// interpret the reply.
    ///
    /// Context injection is not resolved here; see
    /// [`Conductor`](crate::Conductor).
    pub async fn generate_from_instruction(
        &self,
        instruction: &Instruction,
        options: Option<&Options>,
        params: &Params,
    ) -> Result<Reply> {
        instruction.validate()?;
        let text = instruction.render(params)?;
        let reply = self.generate_from_text(&text, options).await?;

        if instruction.tools.is_empty() && instruction.parsers.is_empty() {
            return Ok(reply);
        }
        parser::apply(reply, &instruction.effective_parsers()).await
    }

    /// Run the chain's instructions in order, each seeing the previous
    /// reply as `reply`. Returns the last reply; the first error aborts.
    pub async fn generate_from_chain(
        &self,
        chain: &Chain,
        options: Option<&Options>,
        params: &Params,
    ) -> Result<Reply> {
        run_chain(chain, params, async |instruction: &Instruction, step_params: &Params| {
            self.generate_from_instruction(instruction, options, step_params)
                .await
        })
        .await
    }
}

/// Drive a chain, handing each instruction and its step parameters to
/// `generate_step`.
pub(crate) async fn run_chain(
    chain: &Chain,
    params: &Params,
    generate_step: impl AsyncFn(&Instruction, &Params) -> Result<Reply>,
) -> Result<Reply> {
    if chain.is_empty() {
        return Err(Error::InvalidRequest("chain has no instructions".into()));
    }
    info!(steps = chain.len(), "Running chain");

    let mut last: Option<Reply> = None;
    for (step, instruction) in chain.instructions.iter().enumerate() {
        let step_params = step_params(params, last.as_ref())?;
        let reply = generate_step(instruction, &step_params)
            .await
            .inspect_err(|e| warn!(step, error = %e, "Chain step failed"))?;
        last = Some(reply);
    }
    last.ok_or_else(|| {
        Error::InvalidRequest(format!("chain of {} steps produced no reply", chain.len()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use baton_core::error::GenerationError;
    use baton_core::parser::JsonParser;
    use baton_core::prompt::params;
    use serde_json::json;

    fn generator(scripted: &Arc<ScriptedRuntime>) -> Generator {
        Generator::new(runtime(scripted), GenerationDefaults::default())
    }

    #[tokio::test]
    async fn text_reply_data_equals_content() {
        let rt = Arc::new(ScriptedRuntime::single_text("The sky is blue."));
        let reply = generator(&rt)
            .generate_from_text("why is the sky blue?", None)
            .await
            .unwrap();
        assert_eq!(reply.content, "The sky is blue.");
        assert_eq!(reply.data, json!("The sky is blue."));
        assert_eq!(reply.model_name, "gemma");
        assert!(!reply.is_parsed());
        assert_eq!(rt.prompts(), vec!["why is the sky blue?"]);
    }

    #[tokio::test]
    async fn options_override_defaults() {
        let rt = Arc::new(ScriptedRuntime::texts(&["a", "b"]));
        let g = generator(&rt);
        g.generate_from_text("q", Some(&Options::new().with_tokens(4)))
            .await
            .unwrap();
        g.generate_from_text("q", None).await.unwrap();

        let requests = rt.requests();
        assert_eq!(requests[0].params.num_predict, 4);
        assert_eq!(requests[1].params.num_predict, 64);
    }

    #[tokio::test]
    async fn json_output_requests_json_format() {
        let rt = Arc::new(ScriptedRuntime::single_text("{}"));
        generator(&rt)
            .generate_from_text("q", Some(&Options::new().with_json_output(true)))
            .await
            .unwrap();
        assert_eq!(rt.requests()[0].params.format.as_deref(), Some("json"));
    }

    #[tokio::test]
    async fn runtime_error_is_not_retried() {
        let rt = Arc::new(ScriptedRuntime::failing(GenerationError::Network(
            "connection refused".into(),
        )));
        let err = generator(&rt).generate_from_text("q", None).await.unwrap_err();
        assert!(matches!(err, Error::Generation(GenerationError::Network(_))));
        assert_eq!(rt.call_count(), 1);
    }

    #[tokio::test]
    async fn prompt_is_rendered() {
        let rt = Arc::new(ScriptedRuntime::single_text("Rayleigh"));
        generator(&rt)
            .generate_from_prompt(
                &Prompt::new("why is the sky {{ colour }}?"),
                None,
                &params(json!({"colour": "blue"})),
            )
            .await
            .unwrap();
        assert_eq!(rt.prompts(), vec!["why is the sky blue?"]);
    }

    #[tokio::test]
    async fn missing_parameter_never_reaches_runtime() {
        let rt = Arc::new(ScriptedRuntime::texts(&[]));
        let err = generator(&rt)
            .generate_from_prompt(&Prompt::new("{{ missing }}"), None, &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert_eq!(rt.call_count(), 0);
    }

    #[tokio::test]
    async fn instruction_without_tools_keeps_content() {
        let rt = Arc::new(ScriptedRuntime::single_text(r#"{"looks": "like json"}"#));
        let reply = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("why is the sky blue?").with_role("a poet"),
                None,
                &Params::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.data, json!(r#"{"looks": "like json"}"#));
        assert_eq!(
            rt.prompts(),
            vec!["You should behave as a poet.\nwhy is the sky blue?"]
        );
    }

    #[tokio::test]
    async fn tool_call_executes_tool() {
        let rt = Arc::new(ScriptedRuntime::single_text(r#":T:mytool:{"name":"x"}"#));
        let reply = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("greet x").with_tool(greet_tool("mytool")),
                None,
                &Params::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.data, json!("hello x"));
        assert_eq!(reply.parser.as_deref(), Some("tool:mytool"));
        let tool = reply.tool.unwrap();
        assert_eq!(tool.name, "mytool");
        assert_eq!(tool.arguments["name"], json!("x"));
        assert!(rt.prompts()[0].contains(r#"Usage: :T:mytool:{"name":"string"}"#));
    }

    #[tokio::test]
    async fn wrapped_tool_call_parses_identically() {
        let rt = Arc::new(ScriptedRuntime::single_text(
            r#":T:mytool:{"arguments":{"name":"x"}}"#,
        ));
        let reply = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("greet x").with_tool(greet_tool("mytool")),
                None,
                &Params::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.data, json!("hello x"));
    }

    #[tokio::test]
    async fn call_to_other_tool_does_not_match() {
        let content = r#":T:othertool:{"name":"x"}"#;
        let rt = Arc::new(ScriptedRuntime::single_text(content));
        let reply = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("q").with_tool(greet_tool("mytool")),
                None,
                &Params::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.data, json!(content));
        assert!(reply.tool.is_none());
    }

    #[tokio::test]
    async fn tool_parser_beats_declared_parser() {
        struct Everything;

        #[async_trait::async_trait]
        impl baton_core::ResponseParser for Everything {
            fn name(&self) -> &str {
                "everything"
            }
            fn matches(&self, _reply: &Reply) -> bool {
                true
            }
            async fn parse(&self, _reply: &Reply) -> Result<baton_core::Parsed> {
                Ok(json!("declared").into())
            }
        }

        let rt = Arc::new(ScriptedRuntime::single_text(r#":T:mytool:{"name":"x"}"#));
        let reply = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("q")
                    .with_parser(Arc::new(Everything))
                    .with_tool(greet_tool("mytool")),
                None,
                &Params::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.parser.as_deref(), Some("tool:mytool"));
        assert_eq!(reply.data, json!("hello x"));
    }

    #[tokio::test]
    async fn declared_parser_applies_when_no_tool_matches() {
        let rt = Arc::new(ScriptedRuntime::single_text("```json\n{\"word\": \"yard\"}\n```"));
        let reply = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("q")
                    .with_tool(greet_tool("mytool"))
                    .with_parser(Arc::new(JsonParser)),
                None,
                &Params::new(),
            )
            .await
            .unwrap();
        assert_eq!(reply.parser.as_deref(), Some("json"));
        assert_eq!(reply.data, json!({"word": "yard"}));
    }

    #[tokio::test]
    async fn malformed_tool_call_surfaces() {
        let rt = Arc::new(ScriptedRuntime::single_text(r#":T:mytool:{"name": "#));
        let err = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("q").with_tool(greet_tool("mytool")),
                None,
                &Params::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolCall(_)));
    }

    #[tokio::test]
    async fn unknown_argument_surfaces() {
        let rt = Arc::new(ScriptedRuntime::single_text(r#":T:mytool:{"nmae":"x"}"#));
        let err = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("q").with_tool(greet_tool("mytool")),
                None,
                &Params::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolCall(_)));
    }

    #[tokio::test]
    async fn tool_failure_surfaces() {
        let rt = Arc::new(ScriptedRuntime::single_text(":T:broken:{}"));
        let err = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("q").with_tool(broken_tool()),
                None,
                &Params::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ToolExecution(_)));
    }

    #[tokio::test]
    async fn duplicate_tools_rejected_before_generation() {
        let rt = Arc::new(ScriptedRuntime::texts(&[]));
        let err = generator(&rt)
            .generate_from_instruction(
                &Instruction::new("q")
                    .with_tool(greet_tool("mytool"))
                    .with_tool(greet_tool("mytool")),
                None,
                &Params::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
        assert_eq!(rt.call_count(), 0);
    }

    #[tokio::test]
    async fn chain_threads_previous_reply() {
        let rt = Arc::new(ScriptedRuntime::texts(&["Yard", "A yard is a unit of length."]));
        let chain = Chain::default()
            .then(Instruction::from_prompt("pick a 4-letter word about {{ topic }}"))
            .then(Instruction::from_prompt("describe this word: {{ reply.data }}"));

        let reply = generator(&rt)
            .generate_from_chain(&chain, None, &params(json!({"topic": "gardens"})))
            .await
            .unwrap();

        assert_eq!(reply.content, "A yard is a unit of length.");
        assert_eq!(
            rt.prompts(),
            vec![
                "pick a 4-letter word about gardens",
                "describe this word: Yard"
            ]
        );
    }

    #[tokio::test]
    async fn chain_reply_carries_tool_result() {
        let rt = Arc::new(ScriptedRuntime::texts(&[r#":T:mytool:{"name":"ada"}"#, "ok"]));
        let chain = Chain::new(vec![
            Instruction::new("greet ada").with_tool(greet_tool("mytool")),
            Instruction::from_prompt("repeat: {{ reply.data }}"),
        ]);
        generator(&rt)
            .generate_from_chain(&chain, None, &Params::new())
            .await
            .unwrap();
        assert_eq!(rt.prompts()[1], "repeat: hello ada");
    }

    #[tokio::test]
    async fn chain_aborts_on_first_error() {
        let rt = Arc::new(ScriptedRuntime::texts(&["first"]));
        let chain = Chain::new(vec![
            Instruction::new("one"),
            Instruction::from_prompt("{{ undefined_thing }}"),
            Instruction::new("three"),
        ]);
        let err = generator(&rt)
            .generate_from_chain(&chain, None, &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Template(_)));
        assert_eq!(rt.call_count(), 1);
    }

    #[tokio::test]
    async fn empty_chain_is_invalid() {
        let rt = Arc::new(ScriptedRuntime::texts(&[]));
        let err = generator(&rt)
            .generate_from_chain(&Chain::default(), None, &Params::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
