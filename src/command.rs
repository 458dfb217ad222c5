//! External tool invocation with a testable seam.
//!
//! Speech synthesis (`espeak-ng`) and PDF text extraction (`pdftotext`) are
//! delegated to command-line tools. The `CommandExecutor` trait lets tests
//! replace them without touching the system.

use crate::error::{RehearseError, Result};
use std::process::Command;

/// Trait for executing system commands.
///
/// Object-safe, Send + Sync so one executor can be shared by the document
/// loader and the standard voice.
pub trait CommandExecutor: Send + Sync {
    /// Execute a command with arguments.
    ///
    /// Returns the raw stdout of the command on success.
    /// Returns an error if the command fails or is not found.
    fn execute(&self, command: &str, args: &[&str]) -> Result<Vec<u8>>;
}

/// Production command executor using std::process::Command.
#[derive(Debug, Clone, Default)]
pub struct SystemCommandExecutor;

impl SystemCommandExecutor {
    pub fn new() -> Self {
        Self
    }
}

impl CommandExecutor for SystemCommandExecutor {
    fn execute(&self, command: &str, args: &[&str]) -> Result<Vec<u8>> {
        let output = Command::new(command).args(args).output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                RehearseError::ToolNotFound {
                    tool: command.to_string(),
                }
            } else {
                RehearseError::ToolFailed {
                    tool: command.to_string(),
                    message: format!("failed to execute: {}", e),
                }
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RehearseError::ToolFailed {
                tool: command.to_string(),
                message: format!("exited with {:?}: {}", output.status.code(), stderr.trim()),
            });
        }

        Ok(output.stdout)
    }
}
