//! # Baton Core
//!
//! Domain types, traits, and error definitions for the Baton generation
//! orchestrator. This crate has **no I/O of its own**: it defines the
//! model that the runtime, store and engine crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is a trait here (`GenerationRuntime`,
//! `DocumentStore`, `Tool`, `ResponseParser`). Implementations live in
//! their respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with scripted runtimes and in-memory stores
//! - Clean dependency graph (all crates depend inward on core)

pub mod chain;
pub mod document;
pub mod error;
pub mod instruction;
pub mod options;
pub mod parser;
pub mod prompt;
pub mod reply;
pub mod runtime;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use chain::Chain;
pub use document::{Document, DocumentQuery, DocumentStore};
pub use error::{Error, Result};
pub use instruction::{Injection, Instruction};
pub use options::{GenerationDefaults, GenerationParams, Options};
pub use parser::{JsonParser, Parsed, ResponseParser, ToolParser};
pub use prompt::{Params, Prompt, params};
pub use reply::{Reply, ToolInvocation};
pub use runtime::{GenerateRequest, GenerateResponse, GenerationRuntime};
pub use tool::{Arguments, FnTool, Tool, ToolDescriptor};
