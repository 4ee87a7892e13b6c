//! Built-in tool implementations for Baton.
//!
//! Tools are offered to the model inside an instruction and invoked when a
//! reply opens with the tool's `:T:<name>:` sentinel.

pub mod shell;

pub use shell::ShellTool;
