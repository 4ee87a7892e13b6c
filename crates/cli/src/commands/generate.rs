//! `baton generate`: one reply from text, a template, or an instruction.

use std::sync::Arc;

use baton_config::BatonConfig;
use baton_core::{Injection, Instruction};
use baton_engine::GenerationRequest;
use baton_tools::ShellTool;
use tracing::info;

use crate::GenerationArgs;

/// Instruction facets given on the command line.
#[derive(Debug, Default)]
pub struct Facets {
    pub role: Option<String>,
    pub tone: Option<String>,
    pub detail: Option<String>,
    pub context: Option<String>,
    pub inject: Option<usize>,
    pub shell: bool,
}

impl Facets {
    fn is_empty(&self) -> bool {
        self.role.is_none()
            && self.tone.is_none()
            && self.detail.is_none()
            && self.context.is_none()
            && self.inject.is_none()
            && !self.shell
    }
}

/// Pick the simplest request that expresses the command line.
///
/// Plain text without parameters or facets, a prompt template when only
/// parameters are given, otherwise an instruction.
pub fn build_request(
    config: &BatonConfig,
    query: String,
    facets: Facets,
    templated: bool,
) -> GenerationRequest {
    if facets.is_empty() {
        return if templated {
            GenerationRequest::Prompt(query.into())
        } else {
            GenerationRequest::Text(query)
        };
    }

    let mut instruction = if templated {
        Instruction::from_prompt(query)
    } else {
        Instruction::new(query)
    };
    instruction.role = facets.role;
    instruction.tone = facets.tone;
    instruction.detail = facets.detail;
    instruction.context = facets.context;
    instruction.inject = facets.inject.map(|result_count| Injection { result_count });
    if facets.shell {
        instruction = instruction.with_tool(Arc::new(ShellTool::new(
            config.tools.shell_allowlist.clone(),
        )));
    }
    GenerationRequest::Instruction(instruction)
}

pub async fn run(
    config: &BatonConfig,
    query: String,
    facets: Facets,
    args: GenerationArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let conductor = super::build_conductor(config);
    let request = build_request(config, query, facets, args.has_params());

    info!(
        model = %args.model.as_deref().unwrap_or(&config.generation.model),
        "Generating"
    );
    let reply = conductor
        .generate(request, Some(&args.options()), &args.params())
        .await?;

    if let Some(tool) = &reply.tool {
        info!(tool = %tool.name, "Reply invoked a tool");
    }
    args.print(&reply)
}
