//! Chains: instructions run one after another.
//!
//! Every step after the first sees the previous step's reply as the render
//! parameter `reply`, so templates can refer to `{{ reply.data }}`.

use crate::error::Result;
use crate::instruction::Instruction;
use crate::prompt::Params;
use crate::reply::Reply;

/// Name of the render parameter carrying the previous step's reply.
pub const REPLY_PARAM: &str = "reply";

/// An ordered sequence of instructions.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    pub instructions: Vec<Instruction>,
}

impl Chain {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn then(mut self, instruction: Instruction) -> Self {
        self.instructions.push(instruction);
        self
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl From<Vec<Instruction>> for Chain {
    fn from(instructions: Vec<Instruction>) -> Self {
        Self::new(instructions)
    }
}

/// Render parameters for a step: the caller's parameters plus the previous
/// reply, if there is one.
pub fn step_params(base: &Params, previous: Option<&Reply>) -> Result<Params> {
    let mut params = base.clone();
    if let Some(reply) = previous {
        params.insert(REPLY_PARAM.to_string(), serde_json::to_value(reply)?);
    }
    Ok(params)
}
