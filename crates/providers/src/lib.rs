//! Generation runtime implementations for Baton.
//!
//! All runtimes implement the `baton_core::GenerationRuntime` trait.

pub mod ollama;

pub use ollama::OllamaRuntime;
