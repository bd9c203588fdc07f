//! Suite configuration.
//!
//! All timing knobs for the harness in one place. The binary builds this
//! from CLI flags / `ZDT_*` environment variables; tests build it directly
//! with struct update syntax.

use std::time::Duration;

/// Default interval between health-probe rounds.
const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_secs(5);

/// Default interval between workflow-verification rounds.
const DEFAULT_SEQUENCES_INTERVAL: Duration = Duration::from_secs(15);

/// Default client-side timeout for a single probe request.
const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default bounded wait for a workflow to reach terminal state.
const DEFAULT_WORKFLOW_WAIT: Duration = Duration::from_secs(60);

/// Default poll interval while waiting for terminal state.
const DEFAULT_WORKFLOW_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default number of upgrade iterations.
const DEFAULT_UPGRADE_ITERATIONS: u32 = 2;

/// Configuration for one zero-downtime suite run.
#[derive(Debug, Clone)]
pub struct SuiteConfig {
    /// Base URL of the platform API (no trailing slash).
    pub api_base_url: String,
    /// Token sent in the `x-token` header; empty disables auth.
    pub api_token: String,
    /// Upgrade command line; `{revision}` is substituted per step.
    pub upgrade_command: String,
    /// Revision the system under test was installed with.
    pub install_revision: String,
    /// Revision each upgrade step moves to (alternating with install).
    pub upgrade_revision: String,
    /// Number of sequential upgrade iterations.
    pub upgrade_iterations: u32,
    /// Interval between probe rounds.
    pub api_probe_interval: Duration,
    /// Interval between workflow-verification rounds.
    pub sequences_interval: Duration,
    /// Client-side timeout for one probe request.
    pub probe_timeout: Duration,
    /// Bounded wait for a launched workflow to finish.
    pub workflow_wait: Duration,
    /// Poll interval while waiting for terminal state.
    pub workflow_poll_interval: Duration,
    /// Fail the process if any failure counter is non-zero.
    pub strict: bool,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080/api".to_string(),
            api_token: String::new(),
            upgrade_command: "./upgrade.sh {revision}".to_string(),
            install_revision: "0.1.0".to_string(),
            upgrade_revision: "0.2.0".to_string(),
            upgrade_iterations: DEFAULT_UPGRADE_ITERATIONS,
            api_probe_interval: DEFAULT_PROBE_INTERVAL,
            sequences_interval: DEFAULT_SEQUENCES_INTERVAL,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            workflow_wait: DEFAULT_WORKFLOW_WAIT,
            workflow_poll_interval: DEFAULT_WORKFLOW_POLL_INTERVAL,
            strict: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = SuiteConfig::default();
        assert_eq!(config.upgrade_iterations, 2);
        assert_eq!(config.api_probe_interval, Duration::from_secs(5));
        assert!(config.workflow_wait > config.workflow_poll_interval);
        assert!(!config.strict);
    }
}
