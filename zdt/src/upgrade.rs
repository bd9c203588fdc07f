//! Upgrade driver.
//!
//! Runs a fixed number of upgrade iterations sequentially, alternating
//! between two revisions, then raises the run's cancellation signal. A
//! failed step is logged and skipped; the point is to keep probing the
//! system under adverse conditions.

use crate::context::RunContext;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use zdt_common::{Deployer, SuiteConfig};

/// Run all upgrade iterations, then raise cancellation exactly once.
pub async fn run_upgrade(ctx: Arc<RunContext>, deployer: Arc<dyn Deployer>, cfg: SuiteConfig) {
    for iteration in 0..cfg.upgrade_iterations {
        // Even iterations move to the upgrade revision, odd ones back to
        // the install revision, so every step changes the deployment.
        let revision = if iteration % 2 == 0 {
            &cfg.upgrade_revision
        } else {
            &cfg.install_revision
        };

        info!(
            iteration = iteration + 1,
            total = cfg.upgrade_iterations,
            revision = %revision,
            "upgrade step starting"
        );
        let started = Instant::now();
        match deployer.execute_step(revision).await {
            Ok(output) => {
                info!(
                    iteration = iteration + 1,
                    elapsed = ?started.elapsed(),
                    "upgrade step complete"
                );
                let trimmed = output.trim();
                if !trimmed.is_empty() {
                    debug!("upgrade output: {trimmed}");
                }
            }
            Err(err) => {
                warn!(iteration = iteration + 1, revision = %revision, "upgrade step failed: {err}");
            }
        }
    }

    info!("all upgrade iterations finished, stopping schedulers");
    ctx.raise_cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use zdt_common::mock::MockDeployer;
    use zdt_common::{TargetId, WorkflowDescriptor};

    fn test_context() -> Arc<RunContext> {
        Arc::new(RunContext::new(
            "test",
            WorkflowDescriptor::new(TargetId::new("baseline"), "app", "hardening", "delivery"),
        ))
    }

    fn config(iterations: u32) -> SuiteConfig {
        SuiteConfig {
            upgrade_iterations: iterations,
            install_revision: "1.0.0".to_string(),
            upgrade_revision: "2.0.0".to_string(),
            ..SuiteConfig::default()
        }
    }

    #[tokio::test]
    async fn revisions_alternate_starting_with_upgrade() {
        let ctx = test_context();
        let deployer = Arc::new(MockDeployer::new());

        run_upgrade(ctx.clone(), deployer.clone(), config(4)).await;

        assert_eq!(deployer.revisions(), vec!["2.0.0", "1.0.0", "2.0.0", "1.0.0"]);
        assert!(ctx.cancelled());
    }

    #[tokio::test]
    async fn failed_step_does_not_stop_iteration() {
        let ctx = test_context();
        let deployer = Arc::new(MockDeployer::failing_step(0));

        run_upgrade(ctx.clone(), deployer.clone(), config(3)).await;

        assert_eq!(deployer.revisions().len(), 3);
        assert!(ctx.cancelled());
    }

    #[tokio::test]
    async fn cancel_is_raised_only_after_last_iteration() {
        let ctx = test_context();
        let deployer = Arc::new(MockDeployer::with_delay(std::time::Duration::from_millis(30)));

        let driver = tokio::spawn(run_upgrade(ctx.clone(), deployer, config(2)));
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        assert!(!ctx.cancelled(), "cancel must not fire mid-iteration");
        driver.await.unwrap();
        assert!(ctx.cancelled());
    }
}
