//! `baton chain`: run step templates in order.

use baton_config::BatonConfig;
use baton_core::{Chain, Instruction};

use crate::GenerationArgs;

pub fn build_chain(steps: Vec<String>) -> Chain {
    steps.into_iter().map(Instruction::from_prompt).collect::<Vec<_>>().into()
}

pub async fn run(
    config: &BatonConfig,
    steps: Vec<String>,
    args: GenerationArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let conductor = super::build_conductor(config);
    let reply = conductor
        .generate(build_chain(steps), Some(&args.options()), &args.params())
        .await?;
    args.print(&reply)
}
