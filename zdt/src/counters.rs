//! Lock-free result aggregation.
//!
//! Counters are incremented with atomic adds from any number of concurrent
//! rounds and never decremented; a round's outcome is classified exactly
//! once, after the round completes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Aggregated pass/fail counters for one suite run.
#[derive(Debug, Default)]
pub struct SuiteCounters {
    total_probes: AtomicU64,
    passed_probes: AtomicU64,
    failed_probes: AtomicU64,
    fired_workflows: AtomicU64,
    passed_workflows: AtomicU64,
    failed_workflows: AtomicU64,
}

impl SuiteCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one passing probe check.
    pub fn probe_pass(&self) {
        self.total_probes.fetch_add(1, Ordering::Relaxed);
        self.passed_probes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one failing probe check.
    pub fn probe_fail(&self) {
        self.total_probes.fetch_add(1, Ordering::Relaxed);
        self.failed_probes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record that a verification round committed to one workflow.
    pub fn workflow_fired(&self) {
        self.fired_workflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a workflow round's terminal pass.
    pub fn workflow_passed(&self) {
        self.passed_workflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a workflow round's terminal failure.
    pub fn workflow_failed(&self) {
        self.failed_workflows.fetch_add(1, Ordering::Relaxed);
    }

    /// Consistent-enough copy of all counters.
    ///
    /// Only meaningful as a final report after all rounds have drained;
    /// mid-round the per-counter invariants do not hold.
    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            total_probes: self.total_probes.load(Ordering::Relaxed),
            passed_probes: self.passed_probes.load(Ordering::Relaxed),
            failed_probes: self.failed_probes.load(Ordering::Relaxed),
            fired_workflows: self.fired_workflows.load(Ordering::Relaxed),
            passed_workflows: self.passed_workflows.load(Ordering::Relaxed),
            failed_workflows: self.failed_workflows.load(Ordering::Relaxed),
        }
    }
}

/// Plain-value copy of [`SuiteCounters`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total_probes: u64,
    pub passed_probes: u64,
    pub failed_probes: u64,
    pub fired_workflows: u64,
    pub passed_workflows: u64,
    pub failed_workflows: u64,
}

impl CounterSnapshot {
    pub fn probe_summary(&self) -> String {
        format!(
            "API probes: {} total, {} passed, {} failed",
            self.total_probes, self.passed_probes, self.failed_probes
        )
    }

    pub fn workflow_summary(&self) -> String {
        format!(
            "workflows: {} fired, {} passed, {} failed",
            self.fired_workflows, self.passed_workflows, self.failed_workflows
        )
    }

    pub fn has_failures(&self) -> bool {
        self.failed_probes > 0 || self.failed_workflows > 0
    }
}
