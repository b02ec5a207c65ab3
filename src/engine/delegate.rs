// FILE: src/engine/delegate.rs
//! Process Delegate: runs the native servicing tool and classifies the outcome.
//!
//! Output is captured, never streamed. One attempt per call, no timeout.

use std::io::ErrorKind;
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Exactly three outcomes. `ToolError` is authoritative; `ToolUnavailable`
/// is the only trigger for simulation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    Ok(ToolOutput),
    ToolError { stderr: String, exit_code: Option<i32> },
    ToolUnavailable,
}

pub trait ToolRunner {
    fn invoke(&self, args: &[String]) -> ToolOutcome;
}

/// Spawns the configured executable.
#[derive(Debug, Clone)]
pub struct NativeTool {
    program: String,
}

impl NativeTool {
    pub fn new(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }
}

impl ToolRunner for NativeTool {
    fn invoke(&self, args: &[String]) -> ToolOutcome {
        tracing::debug!("[Delegate] {} {}", self.program, args.join(" "));

        match Command::new(&self.program).args(args).output() {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).to_string();
                let stderr = String::from_utf8_lossy(&output.stderr).to_string();
                let exit_code = output.status.code();

                if output.status.success() {
                    ToolOutcome::Ok(ToolOutput { stdout, stderr, exit_code })
                } else {
                    // Some tools report failures on stdout only.
                    let stderr = if stderr.trim().is_empty() { stdout } else { stderr };
                    ToolOutcome::ToolError { stderr, exit_code }
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!("{} not available on this system", self.program);
                ToolOutcome::ToolUnavailable
            }
            Err(e) => {
                // The executable exists but could not be started.
                tracing::error!("Failed to start {}: {}", self.program, e);
                ToolOutcome::ToolError { stderr: e.to_string(), exit_code: None }
            }
        }
    }
}
