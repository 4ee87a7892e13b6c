//! Generation orchestration for Baton.
//!
//! The [`Generator`] turns text, prompts, instructions and chains into
//! replies through one [`GenerationRuntime`](baton_core::GenerationRuntime).
//! The [`Conductor`] sits on top: it accepts any [`GenerationRequest`],
//! resolves retrieval injection against a document store, and delegates.
//!
//! Every call is awaited to completion before the next one starts. Chain
//! steps run strictly in order because later steps read earlier replies.

pub mod conductor;
pub mod generator;

#[cfg(test)]
mod test_helpers;

pub use conductor::{Conductor, GenerationRequest};
pub use generator::Generator;
