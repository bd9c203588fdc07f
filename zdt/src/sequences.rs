//! Workflow-lifecycle verifier.
//!
//! Each round launches one asynchronous workflow instance and confirms it
//! reaches (or, for the expected-failure cases, fails to reach) a terminal
//! state within a bounded wait. Cases rotate round-robin.

use crate::context::RunContext;
use serde_json::json;
use std::sync::Arc;
use tokio::time::{Instant, MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use zdt_common::{ApiError, PlatformApi, SuiteConfig, WorkflowDescriptor};

/// Blueprint every target is provisioned from. One stage, one workflow,
/// with an intermediate evaluation step between deploy and release.
pub const TARGET_BLUEPRINT: &str = r#"apiVersion: pipeline/v1
kind: Blueprint
stages:
  - name: hardening
    workflows:
      - name: delivery
        tasks:
          - name: deploy
          - name: evaluate
          - name: release
"#;

/// Component provisioned inside every target.
pub const DEFAULT_COMPONENT: &str = "app";

/// Stage declared in [`TARGET_BLUEPRINT`].
pub const DELIVERY_STAGE: &str = "hardening";

/// Workflow declared in [`TARGET_BLUEPRINT`].
pub const DELIVERY_WORKFLOW: &str = "delivery";

/// Workflow name absent from [`TARGET_BLUEPRINT`]; launching it exercises
/// the platform's failure path.
const MISSING_WORKFLOW: &str = "certify";

/// Verification cases, rotated across rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VerificationCase {
    /// Fresh target, valid workflow, expected to finish end-to-end.
    FreshDelivery,
    /// Fresh target, workflow name not in the blueprint.
    FreshMissingWorkflow,
    /// Pre-existing baseline target, workflow name not in the blueprint.
    BaselineMissingWorkflow,
}

impl VerificationCase {
    pub(crate) fn for_round(round: u64) -> Self {
        match round % 3 {
            0 => Self::FreshDelivery,
            1 => Self::FreshMissingWorkflow,
            _ => Self::BaselineMissingWorkflow,
        }
    }
}

impl std::fmt::Display for VerificationCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FreshDelivery => write!(f, "fresh-delivery"),
            Self::FreshMissingWorkflow => write!(f, "fresh-missing-workflow"),
            Self::BaselineMissingWorkflow => write!(f, "baseline-missing-workflow"),
        }
    }
}

/// Run the verification stream until cancellation, then drain in-flight
/// rounds.
pub async fn run_workflow_checks(
    ctx: Arc<RunContext>,
    api: Arc<dyn PlatformApi>,
    cfg: SuiteConfig,
) {
    let cfg = Arc::new(cfg);
    let mut cancel = ctx.cancel_watch();
    let mut ticker = interval(cfg.sequences_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(interval = ?cfg.sequences_interval, "workflow verifier started");

    let mut rounds = Vec::new();
    let mut round: u64 = 0;
    loop {
        if ctx.cancelled() {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            _ = ticker.tick() => {
                let case = VerificationCase::for_round(round);
                round += 1;
                debug!(round, case = %case, "starting verification round");
                rounds.push(tokio::spawn(workflow_round(
                    ctx.clone(),
                    api.clone(),
                    cfg.clone(),
                    case,
                )));
            }
        }
    }

    debug!(in_flight = rounds.len(), "workflow verifier draining");
    for handle in rounds {
        let _ = handle.await;
    }
    info!("workflow verifier stopped");
}

/// One verification round. Fires exactly one workflow attempt and records
/// exactly one pass or failure, after the round has fully completed.
async fn workflow_round(
    ctx: Arc<RunContext>,
    api: Arc<dyn PlatformApi>,
    cfg: Arc<SuiteConfig>,
    case: VerificationCase,
) {
    ctx.counters.workflow_fired();

    let passed = match run_case(&ctx, api.as_ref(), &cfg, case).await {
        Ok(passed) => passed,
        Err(err) => {
            warn!(case = %case, "verification round failed: {err}");
            false
        }
    };

    if passed {
        ctx.counters.workflow_passed();
    } else {
        ctx.counters.workflow_failed();
    }
}

async fn run_case(
    ctx: &RunContext,
    api: &dyn PlatformApi,
    cfg: &SuiteConfig,
    case: VerificationCase,
) -> Result<bool, ApiError> {
    match case {
        VerificationCase::FreshDelivery => {
            let desc = provision_fresh_target(ctx, api).await?;
            let receipt = api.launch_workflow(&desc, delivery_payload()).await?;
            info!(case = %case, context = %receipt.context_id, target = %desc.target, "workflow launched");
            Ok(wait_for_finish(api, cfg, &receipt, &desc).await)
        }
        VerificationCase::FreshMissingWorkflow => {
            let desc = provision_fresh_target(ctx, api)
                .await?
                .with_workflow(MISSING_WORKFLOW);
            Ok(expect_failure(api, cfg, case, &desc).await)
        }
        VerificationCase::BaselineMissingWorkflow => {
            let desc = ctx.baseline.with_workflow(MISSING_WORKFLOW);
            Ok(expect_failure(api, cfg, case, &desc).await)
        }
    }
}

/// Create a brand-new target plus component and return the delivery
/// workflow's coordinates in it.
async fn provision_fresh_target(
    ctx: &RunContext,
    api: &dyn PlatformApi,
) -> Result<WorkflowDescriptor, ApiError> {
    let name = ctx.unique_name("zdt-target");
    let target = api.create_target(&name, TARGET_BLUEPRINT).await?;
    api.create_component(&target, DEFAULT_COMPONENT).await?;
    Ok(WorkflowDescriptor::new(
        target,
        DEFAULT_COMPONENT,
        DELIVERY_STAGE,
        DELIVERY_WORKFLOW,
    ))
}

/// Launch a workflow that references a name missing from the blueprint.
///
/// The expected outcome is a failure (rejected launch or no terminal
/// event); that failure is recorded in the counters by the caller. A
/// workflow that finishes anyway is recorded as a pass and flagged in the
/// logs, since it means the platform's failure path did not engage.
async fn expect_failure(
    api: &dyn PlatformApi,
    cfg: &SuiteConfig,
    case: VerificationCase,
    desc: &WorkflowDescriptor,
) -> bool {
    match api.launch_workflow(desc, delivery_payload()).await {
        Err(err) => {
            info!(case = %case, "launch rejected as expected: {err}");
            false
        }
        Ok(receipt) => {
            let finished = wait_for_finish(api, cfg, &receipt, desc).await;
            if finished {
                warn!(case = %case, context = %receipt.context_id, "workflow finished although its name is not in the blueprint");
            } else {
                info!(case = %case, "workflow did not finish, as expected");
            }
            finished
        }
    }
}

/// Poll for the terminal event until it appears or the bounded wait
/// elapses. Poll errors are logged and retried; absence after the bound is
/// a plain `false`, never an abort.
async fn wait_for_finish(
    api: &dyn PlatformApi,
    cfg: &SuiteConfig,
    receipt: &zdt_common::LaunchReceipt,
    desc: &WorkflowDescriptor,
) -> bool {
    let event_type = desc.finished_event_type();
    let deadline = Instant::now() + cfg.workflow_wait;

    loop {
        match api.latest_event(receipt, desc, &event_type).await {
            Ok(Some(event)) if event.has_payload() => {
                debug!(context = %receipt.context_id, "terminal event observed");
                return true;
            }
            Ok(Some(_)) => {
                warn!(context = %receipt.context_id, "terminal event observed with empty payload");
                return false;
            }
            Ok(None) => {}
            Err(err) => {
                warn!(context = %receipt.context_id, "event poll failed: {err}");
            }
        }

        if Instant::now() + cfg.workflow_poll_interval > deadline {
            debug!(
                context = %receipt.context_id,
                waited = ?cfg.workflow_wait,
                "no terminal event within the bounded wait"
            );
            return false;
        }
        tokio::time::sleep(cfg.workflow_poll_interval).await;
    }
}

fn delivery_payload() -> serde_json::Value {
    json!({
        "artifact": {
            "image": "registry.example.com/demo/cart",
            "tag": "0.13.1",
        }
    })
}
