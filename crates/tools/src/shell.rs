//! Shell tool: execute a system command requested by the model.
//!
//! Called as `:T:exec:{"command": "fortune"}`. The command's trimmed stdout
//! becomes the reply's data.

use async_trait::async_trait;
use baton_core::error::ToolExecutionError;
use baton_core::tool::{Arguments, Tool};
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, warn};

const NAME: &str = "exec";

/// Execute shell commands, optionally restricted to an allowlist.
pub struct ShellTool {
    /// If non-empty, only these base commands are allowed.
    allowed_commands: Vec<String>,
}

impl ShellTool {
    pub fn new(allowed_commands: Vec<String>) -> Self {
        Self { allowed_commands }
    }

    fn base_command(command: &str) -> &str {
        command.split_whitespace().next().unwrap_or("")
    }

    fn is_command_allowed(&self, command: &str) -> bool {
        if self.allowed_commands.is_empty() {
            return true;
        }
        let base = Self::base_command(command);
        self.allowed_commands.iter().any(|a| a == base)
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str { NAME }

    fn description(&self) -> &str {
        "execute a shell command"
    }

    fn arguments(&self) -> Arguments {
        let mut schema = Arguments::new();
        schema.insert("command".into(), Value::String("string".into()));
        schema
    }

    async fn execute(&self, arguments: Arguments) -> Result<Value, ToolExecutionError> {
        let command = arguments
            .get("command")
            .and_then(Value::as_str)
            .ok_or_else(|| ToolExecutionError::new(NAME, "missing string argument 'command'"))?;

        if !self.is_command_allowed(command) {
            return Err(ToolExecutionError::new(
                NAME,
                format!("command '{}' not in allowlist", Self::base_command(command)),
            ));
        }

        debug!(command = %command, "Executing shell command");

        let output = if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", command]).output().await
        } else {
            Command::new("sh").args(["-c", command]).output().await
        };
        let output = output.map_err(|e| ToolExecutionError::new(NAME, e.to_string()))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(command = %command, exit_code = code, "Command failed");
            return Err(ToolExecutionError::new(
                NAME,
                format!("exit code {code}: {}", stderr.trim()),
            ));
        }

        Ok(Value::String(stdout.trim().to_string()))
    }
}
