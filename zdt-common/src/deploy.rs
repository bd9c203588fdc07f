//! Upgrade-step execution.
//!
//! One upgrade step is an external command that re-deploys the system under
//! test at a given revision and blocks until rollout completes.

use crate::errors::UpgradeError;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Placeholder substituted with the target revision in the command line.
const REVISION_PLACEHOLDER: &str = "{revision}";

/// Executes one upgrade step of the system under test.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Run one upgrade to `revision`, blocking until rollout completes.
    /// Returns captured stdout on success.
    async fn execute_step(&self, revision: &str) -> Result<String, UpgradeError>;
}

/// [`Deployer`] that shells out to a configured command line.
pub struct CommandDeployer {
    command_line: String,
}

impl CommandDeployer {
    pub fn new(command_line: impl Into<String>) -> Self {
        Self {
            command_line: command_line.into(),
        }
    }

    fn render(&self, revision: &str) -> Vec<String> {
        self.command_line
            .replace(REVISION_PLACEHOLDER, revision)
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl Deployer for CommandDeployer {
    async fn execute_step(&self, revision: &str) -> Result<String, UpgradeError> {
        let argv = self.render(revision);
        let (program, args) = argv.split_first().ok_or(UpgradeError::EmptyCommand)?;

        debug!(command = %argv.join(" "), "running upgrade step");
        let output = Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|source| UpgradeError::Spawn {
                command: argv.join(" "),
                source,
            })?;

        if !output.status.success() {
            return Err(UpgradeError::CommandFailed {
                status: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_revision() {
        let deployer = CommandDeployer::new("helm upgrade platform --version {revision} --wait");
        let argv = deployer.render("1.4.0");
        assert_eq!(argv[0], "helm");
        assert!(argv.contains(&"1.4.0".to_string()));
        assert!(!argv.iter().any(|a| a.contains("{revision}")));
    }

    #[tokio::test]
    async fn execute_step_captures_stdout() {
        let deployer = CommandDeployer::new("echo deploying {revision}");
        let out = deployer.execute_step("1.2.3").await.unwrap();
        assert!(out.contains("deploying 1.2.3"));
    }

    #[tokio::test]
    async fn execute_step_reports_nonzero_exit() {
        let deployer = CommandDeployer::new("false");
        let err = deployer.execute_step("1.2.3").await.unwrap_err();
        assert!(matches!(err, UpgradeError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let deployer = CommandDeployer::new("   ");
        let err = deployer.execute_step("1.2.3").await.unwrap_err();
        assert!(matches!(err, UpgradeError::EmptyCommand));
    }
}
