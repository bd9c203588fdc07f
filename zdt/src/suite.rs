//! Run coordinator and reporter.
//!
//! Provisions the baseline target, starts the three activity streams as
//! independent tasks, waits for all of them to drain, and renders the
//! final summary. Individual probe/workflow failures are summarized, not
//! surfaced as the run's failure; only setup errors abort.

use crate::context::{RunContext, generate_run_tag};
use crate::counters::CounterSnapshot;
use crate::probes::run_probes;
use crate::sequences::{DEFAULT_COMPONENT, DELIVERY_STAGE, DELIVERY_WORKFLOW, TARGET_BLUEPRINT, run_workflow_checks};
use crate::upgrade::run_upgrade;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};
use zdt_common::{Deployer, PlatformApi, SetupError, SuiteConfig, WorkflowDescriptor};

/// Final aggregated result of one suite run.
#[derive(Debug, Clone, Copy)]
pub struct SuiteReport {
    counters: CounterSnapshot,
    elapsed: Duration,
}

impl SuiteReport {
    pub fn counters(&self) -> CounterSnapshot {
        self.counters
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Whether any failure counter is non-zero (feeds strict mode).
    pub fn has_failures(&self) -> bool {
        self.counters.has_failures()
    }
}

impl std::fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rounded = Duration::from_secs(self.elapsed.as_secs());
        writeln!(
            f,
            "zero-downtime suite finished in {}",
            humantime::format_duration(rounded)
        )?;
        writeln!(f, "  {}", self.counters.probe_summary())?;
        write!(f, "  {}", self.counters.workflow_summary())
    }
}

/// Run the whole zero-downtime suite to completion.
pub async fn run_suite(
    api: Arc<dyn PlatformApi>,
    deployer: Arc<dyn Deployer>,
    cfg: SuiteConfig,
) -> Result<SuiteReport, SetupError> {
    let started = Instant::now();
    let run_tag = generate_run_tag();

    // Baseline setup is the only fatal path: without a target there is
    // nothing meaningful to measure.
    let baseline_name = format!("zdt-{run_tag}-baseline");
    info!(run = %run_tag, target = %baseline_name, "provisioning baseline target");
    let target = api
        .create_target(&baseline_name, TARGET_BLUEPRINT)
        .await
        .map_err(|source| SetupError::BaselineTarget {
            name: baseline_name.clone(),
            source,
        })?;
    api.create_component(&target, DEFAULT_COMPONENT)
        .await
        .map_err(|source| SetupError::BaselineComponent {
            target: target.to_string(),
            component: DEFAULT_COMPONENT.to_string(),
            source,
        })?;
    let baseline =
        WorkflowDescriptor::new(target, DEFAULT_COMPONENT, DELIVERY_STAGE, DELIVERY_WORKFLOW);

    let ctx = Arc::new(RunContext::new(run_tag, baseline));
    info!(
        iterations = cfg.upgrade_iterations,
        probe_interval = ?cfg.api_probe_interval,
        sequences_interval = ?cfg.sequences_interval,
        "starting activity streams"
    );

    let upgrade = tokio::spawn(run_upgrade(ctx.clone(), deployer, cfg.clone()));
    let probes = tokio::spawn(run_probes(ctx.clone(), api.clone(), cfg.clone()));
    let workflows = tokio::spawn(run_workflow_checks(ctx.clone(), api, cfg));

    let (upgrade_res, probes_res, workflows_res) = tokio::join!(upgrade, probes, workflows);
    for (stream, result) in [
        ("upgrade", upgrade_res),
        ("probes", probes_res),
        ("workflows", workflows_res),
    ] {
        if let Err(err) = result {
            warn!(stream, "stream task aborted: {err}");
        }
    }

    let report = SuiteReport {
        counters: ctx.counters.snapshot(),
        elapsed: started.elapsed(),
    };
    info!("suite complete");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use zdt_common::mock::{MockDeployer, MockPlatform};

    #[tokio::test]
    async fn setup_failure_aborts_the_run() {
        let api: Arc<dyn PlatformApi> = Arc::new(MockPlatform::failing_target_creation());
        let deployer: Arc<dyn Deployer> = Arc::new(MockDeployer::new());

        let err = run_suite(api, deployer, SuiteConfig::default())
            .await
            .expect_err("baseline provisioning failure must abort");
        assert!(matches!(err, SetupError::BaselineTarget { .. }));
    }

    #[tokio::test]
    async fn report_renders_both_summaries() {
        let report = SuiteReport {
            counters: CounterSnapshot {
                total_probes: 12,
                passed_probes: 11,
                failed_probes: 1,
                fired_workflows: 3,
                passed_workflows: 2,
                failed_workflows: 1,
            },
            elapsed: Duration::from_secs(75),
        };
        let text = report.to_string();
        assert!(text.contains("API probes: 12 total, 11 passed, 1 failed"));
        assert!(text.contains("workflows: 3 fired, 2 passed, 1 failed"));
        assert!(report.has_failures());
    }
}
