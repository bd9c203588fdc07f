//! Mock collaborators for harness tests.
//!
//! No sockets, no processes: scripted responses plus atomic call counters,
//! so scheduler behavior can be asserted deterministically.

use crate::api::{HttpCheck, PlatformApi};
use crate::deploy::Deployer;
use crate::errors::{ApiError, UpgradeError};
use crate::types::{LaunchReceipt, TargetId, WorkflowDescriptor, WorkflowEvent};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted [`PlatformApi`] implementation.
#[derive(Default)]
pub struct MockPlatform {
    failing_checks: Vec<&'static str>,
    valid_workflows: Option<Vec<String>>,
    finish_after_polls: u32,
    never_finishes: bool,
    finish_with_empty_payload: bool,
    fail_target_creation: bool,

    probes_served: AtomicUsize,
    targets_created: AtomicUsize,
    components_created: AtomicUsize,
    launched: AtomicUsize,
    created_names: Mutex<Vec<String>>,
    poll_counts: Mutex<HashMap<String, u32>>,
}

impl MockPlatform {
    /// Everything passes; workflows finish on the first poll.
    pub fn healthy() -> Self {
        Self::default()
    }

    /// Probe checks with the given names fail; everything else passes.
    pub fn with_failing_checks(names: &[&'static str]) -> Self {
        Self {
            failing_checks: names.to_vec(),
            ..Self::default()
        }
    }

    /// Launches succeed but no terminal event is ever observed.
    pub fn never_finishing() -> Self {
        Self {
            never_finishes: true,
            ..Self::default()
        }
    }

    /// Launches referencing a workflow outside `valid` are rejected.
    pub fn rejecting_unknown_workflows(valid: &[&str]) -> Self {
        Self {
            valid_workflows: Some(valid.iter().map(|s| s.to_string()).collect()),
            ..Self::default()
        }
    }

    /// Target provisioning fails outright.
    pub fn failing_target_creation() -> Self {
        Self {
            fail_target_creation: true,
            ..Self::default()
        }
    }

    /// Require `polls` unsuccessful polls before the finished event appears.
    pub fn finish_after(mut self, polls: u32) -> Self {
        self.finish_after_polls = polls;
        self
    }

    /// Terminal events arrive with an empty payload.
    pub fn finishing_with_empty_payload(mut self) -> Self {
        self.finish_with_empty_payload = true;
        self
    }

    pub fn probes_served(&self) -> usize {
        self.probes_served.load(Ordering::Relaxed)
    }

    pub fn targets_created(&self) -> usize {
        self.targets_created.load(Ordering::Relaxed)
    }

    pub fn components_created(&self) -> usize {
        self.components_created.load(Ordering::Relaxed)
    }

    pub fn launched(&self) -> usize {
        self.launched.load(Ordering::Relaxed)
    }

    /// Names of all targets created, in creation order.
    pub fn created_names(&self) -> Vec<String> {
        self.created_names.lock().unwrap().clone()
    }
}

#[async_trait]
impl PlatformApi for MockPlatform {
    async fn probe(&self, check: &HttpCheck) -> Result<(), ApiError> {
        self.probes_served.fetch_add(1, Ordering::Relaxed);
        if self.failing_checks.contains(&check.name) {
            return Err(ApiError::UnexpectedStatus {
                path: check.path.clone(),
                got: 503,
                expected: check.expected_status,
            });
        }
        Ok(())
    }

    async fn create_target(&self, name: &str, _blueprint: &str) -> Result<TargetId, ApiError> {
        if self.fail_target_creation {
            return Err(ApiError::Rejected {
                path: "/controlPlane/v1/targets".to_string(),
                detail: "simulated provisioning failure".to_string(),
            });
        }
        self.targets_created.fetch_add(1, Ordering::Relaxed);
        self.created_names.lock().unwrap().push(name.to_string());
        Ok(TargetId::new(name))
    }

    async fn create_component(&self, _target: &TargetId, _name: &str) -> Result<(), ApiError> {
        if self.fail_target_creation {
            return Err(ApiError::Rejected {
                path: "/controlPlane/v1/targets".to_string(),
                detail: "simulated provisioning failure".to_string(),
            });
        }
        self.components_created.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn launch_workflow(
        &self,
        desc: &WorkflowDescriptor,
        _payload: serde_json::Value,
    ) -> Result<LaunchReceipt, ApiError> {
        if let Some(valid) = &self.valid_workflows {
            if !valid.contains(&desc.workflow) {
                return Err(ApiError::Rejected {
                    path: "/v1/events".to_string(),
                    detail: format!("unknown workflow '{}'", desc.workflow),
                });
            }
        }
        let n = self.launched.fetch_add(1, Ordering::Relaxed);
        Ok(LaunchReceipt {
            context_id: format!("ctx-{n}"),
        })
    }

    async fn latest_event(
        &self,
        receipt: &LaunchReceipt,
        _desc: &WorkflowDescriptor,
        event_type: &str,
    ) -> Result<Option<WorkflowEvent>, ApiError> {
        if self.never_finishes {
            return Ok(None);
        }
        let ready = {
            let mut counts = self.poll_counts.lock().unwrap();
            let seen = counts.entry(receipt.context_id.clone()).or_insert(0);
            let ready = *seen >= self.finish_after_polls;
            *seen += 1;
            ready
        };
        if !ready {
            return Ok(None);
        }
        let payload = if self.finish_with_empty_payload {
            serde_json::Value::Null
        } else {
            json!({ "result": "pass", "score": 100 })
        };
        Ok(Some(WorkflowEvent {
            event_type: event_type.to_string(),
            context_id: receipt.context_id.clone(),
            time: Utc::now(),
            payload,
        }))
    }
}

/// Scripted [`Deployer`] implementation recording each step.
#[derive(Default)]
pub struct MockDeployer {
    step_delay: Duration,
    fail_on: Option<usize>,
    steps: AtomicUsize,
    revisions: Mutex<Vec<String>>,
}

impl MockDeployer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Each step sleeps for `delay` before completing.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            step_delay: delay,
            ..Self::default()
        }
    }

    /// The step at `index` (0-based) fails; others succeed.
    pub fn failing_step(index: usize) -> Self {
        Self {
            fail_on: Some(index),
            ..Self::default()
        }
    }

    /// Revisions passed to `execute_step`, in order.
    pub fn revisions(&self) -> Vec<String> {
        self.revisions.lock().unwrap().clone()
    }
}

#[async_trait]
impl Deployer for MockDeployer {
    async fn execute_step(&self, revision: &str) -> Result<String, UpgradeError> {
        if !self.step_delay.is_zero() {
            tokio::time::sleep(self.step_delay).await;
        }
        let index = self.steps.fetch_add(1, Ordering::Relaxed);
        self.revisions.lock().unwrap().push(revision.to_string());
        if self.fail_on == Some(index) {
            return Err(UpgradeError::CommandFailed {
                status: 1,
                stderr: "simulated rollout failure".to_string(),
            });
        }
        Ok(format!("deployed {revision}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_platform_fails_named_checks() {
        let platform = MockPlatform::with_failing_checks(&["datastore"]);
        let good = HttpCheck::get("auth", "/v1/auth", 200);
        let bad = HttpCheck::get("datastore", "/datastore/v1/events", 200);
        assert!(platform.probe(&good).await.is_ok());
        assert!(platform.probe(&bad).await.is_err());
        assert_eq!(platform.probes_served(), 2);
    }

    #[tokio::test]
    async fn mock_platform_finishes_after_polls() {
        let platform = MockPlatform::healthy().finish_after(2);
        let desc = WorkflowDescriptor::new(TargetId::new("t"), "app", "hardening", "delivery");
        let receipt = platform.launch_workflow(&desc, json!({})).await.unwrap();

        let finished = desc.finished_event_type();
        assert!(platform.latest_event(&receipt, &desc, &finished).await.unwrap().is_none());
        assert!(platform.latest_event(&receipt, &desc, &finished).await.unwrap().is_none());
        let event = platform
            .latest_event(&receipt, &desc, &finished)
            .await
            .unwrap()
            .expect("event after two empty polls");
        assert!(event.has_payload());
    }

    #[tokio::test]
    async fn mock_deployer_records_revisions_and_failures() {
        let deployer = MockDeployer::failing_step(1);
        assert!(deployer.execute_step("a").await.is_ok());
        assert!(deployer.execute_step("b").await.is_err());
        assert!(deployer.execute_step("a").await.is_ok());
        assert_eq!(deployer.revisions(), vec!["a", "b", "a"]);
    }
}
