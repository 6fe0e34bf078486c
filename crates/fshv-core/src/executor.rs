//! External validator process execution
//!
//! The executor is a trait so the pipeline can be tested against canned
//! transcripts without spawning Java. The real implementation runs the
//! command by argument vector (never through a shell), blocks on the child
//! and hands back its full standard output.

use async_trait::async_trait;
use std::process::Stdio;
use thiserror::Error;
use tracing::{debug, info};

use crate::invoke::ValidatorCommand;

/// The validator process could not be run to completion. Reported as one
/// synthetic Failure status for the whole invocation; the run continues
/// with the next group.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("could not start validator process: {0}")]
    Spawn(String),

    #[error("validator produced no readable output: {0}")]
    Output(String),
}

/// Seam between the pipeline and the external validator
#[async_trait]
pub trait ValidatorExecutor: Send + Sync {
    /// Run one invocation and return its combined standard output
    async fn execute(&self, command: &ValidatorCommand) -> Result<String, ExecutionError>;
}

/// Runs the HL7 Java validator as a child process
pub struct JavaValidatorExecutor;

#[async_trait]
impl ValidatorExecutor for JavaValidatorExecutor {
    async fn execute(&self, command: &ValidatorCommand) -> Result<String, ExecutionError> {
        info!("running validator: {command}");

        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .output()
            .await
            .map_err(|e| ExecutionError::Spawn(e.to_string()))?;

        // The validator signals per-instance failures through its output,
        // not its exit code; a non-zero status alone is not an error here.
        debug!(status = %output.status, "validator finished");

        String::from_utf8(output.stdout).map_err(|e| ExecutionError::Output(e.to_string()))
    }
}
