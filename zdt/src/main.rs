//! Zero Downtime Tester - harness binary.
//!
//! Parses configuration, wires the HTTP platform client and the upgrade
//! command executor, runs the suite, and prints the final summary.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
use zdt::suite;
use zdt_common::{ApiClient, CommandDeployer, SuiteConfig};

#[derive(Parser)]
#[command(name = "zdt")]
#[command(author, version, about = "Zero Downtime Tester - probes a live deployment while upgrading it in place")]
struct Cli {
    /// Base URL of the platform API
    #[arg(long, env = "ZDT_API_URL", default_value = "http://localhost:8080/api")]
    api_url: String,

    /// Token sent in the x-token header (empty disables auth)
    #[arg(long, env = "ZDT_API_TOKEN", default_value = "", hide_env_values = true)]
    api_token: String,

    /// Upgrade command line; {revision} is substituted per step
    #[arg(long, env = "ZDT_UPGRADE_COMMAND")]
    upgrade_command: String,

    /// Revision the system under test was installed with
    #[arg(long, env = "ZDT_INSTALL_REVISION")]
    install_revision: String,

    /// Revision upgrade steps alternate to
    #[arg(long, env = "ZDT_UPGRADE_REVISION")]
    upgrade_revision: String,

    /// Number of sequential upgrade iterations
    #[arg(long, env = "ZDT_UPGRADE_ITERATIONS", default_value = "2")]
    upgrade_iterations: u32,

    /// Interval between probe rounds
    #[arg(long, env = "ZDT_PROBE_INTERVAL", default_value = "5s", value_parser = humantime::parse_duration)]
    probe_interval: Duration,

    /// Interval between workflow-verification rounds
    #[arg(long, env = "ZDT_SEQUENCES_INTERVAL", default_value = "15s", value_parser = humantime::parse_duration)]
    sequences_interval: Duration,

    /// Client-side timeout for one probe request
    #[arg(long, env = "ZDT_PROBE_TIMEOUT", default_value = "5s", value_parser = humantime::parse_duration)]
    probe_timeout: Duration,

    /// Bounded wait for a launched workflow to finish
    #[arg(long, env = "ZDT_WORKFLOW_WAIT", default_value = "1m", value_parser = humantime::parse_duration)]
    workflow_wait: Duration,

    /// Poll interval while waiting for terminal state
    #[arg(long, env = "ZDT_WORKFLOW_POLL_INTERVAL", default_value = "5s", value_parser = humantime::parse_duration)]
    workflow_poll_interval: Duration,

    /// Exit non-zero if any failure counter is non-zero
    #[arg(long, env = "ZDT_STRICT")]
    strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_config(self) -> SuiteConfig {
        SuiteConfig {
            api_base_url: self.api_url,
            api_token: self.api_token,
            upgrade_command: self.upgrade_command,
            install_revision: self.install_revision,
            upgrade_revision: self.upgrade_revision,
            upgrade_iterations: self.upgrade_iterations,
            api_probe_interval: self.probe_interval,
            sequences_interval: self.sequences_interval,
            probe_timeout: self.probe_timeout,
            workflow_wait: self.workflow_wait,
            workflow_poll_interval: self.workflow_poll_interval,
            strict: self.strict,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let config = cli.into_config();
    info!("Starting zero-downtime suite against {}", config.api_base_url);

    let api = ApiClient::new(&config.api_base_url, &config.api_token, config.probe_timeout)
        .context("failed to build platform API client")?;
    let deployer = CommandDeployer::new(&config.upgrade_command);

    let strict = config.strict;
    let report = suite::run_suite(Arc::new(api), Arc::new(deployer), config).await?;
    println!("{report}");

    if strict && report.has_failures() {
        error!("failures recorded and strict mode is enabled");
        std::process::exit(1);
    }

    Ok(())
}
