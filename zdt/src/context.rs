//! Shared per-run state.
//!
//! One [`RunContext`] is created at suite start, passed as an `Arc` into
//! every stream, and dropped when the run returns. There is no static
//! mutable state anywhere in the harness.

use crate::counters::SuiteCounters;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use uuid::Uuid;
use zdt_common::WorkflowDescriptor;

/// Shared state for one harness run.
pub struct RunContext {
    /// Aggregated pass/fail counters.
    pub counters: SuiteCounters,
    /// Baseline workflow coordinates, provisioned once at setup and shared
    /// by every round that needs a pre-existing target.
    pub baseline: WorkflowDescriptor,
    cancel: watch::Sender<bool>,
    ids: AtomicU64,
    run_tag: String,
}

impl RunContext {
    pub fn new(run_tag: impl Into<String>, baseline: WorkflowDescriptor) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            counters: SuiteCounters::new(),
            baseline,
            cancel,
            ids: AtomicU64::new(0),
            run_tag: run_tag.into(),
        }
    }

    /// Raise the one-shot cancellation signal. Idempotent; never reset.
    pub fn raise_cancel(&self) {
        self.cancel.send_replace(true);
    }

    /// Current cancellation state.
    pub fn cancelled(&self) -> bool {
        *self.cancel.borrow()
    }

    /// Receiver for selecting on cancellation alongside timer ticks.
    pub fn cancel_watch(&self) -> watch::Receiver<bool> {
        self.cancel.subscribe()
    }

    /// Next value from the monotonic id source. Unique across concurrent
    /// callers for the lifetime of the run.
    pub fn next_id(&self) -> u64 {
        self.ids.fetch_add(1, Ordering::Relaxed)
    }

    pub fn run_tag(&self) -> &str {
        &self.run_tag
    }

    /// Derive a name that is unique within this run and unlikely to collide
    /// with leftovers of earlier runs.
    pub fn unique_name(&self, prefix: &str) -> String {
        format!("{prefix}-{}-{}", self.run_tag, self.next_id())
    }
}

/// Short random tag identifying one harness run.
pub fn generate_run_tag() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..8].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use zdt_common::TargetId;

    fn test_baseline() -> WorkflowDescriptor {
        WorkflowDescriptor::new(TargetId::new("baseline"), "app", "hardening", "delivery")
    }

    #[test]
    fn cancel_is_idempotent_and_sticky() {
        let ctx = RunContext::new("t", test_baseline());
        assert!(!ctx.cancelled());
        ctx.raise_cancel();
        ctx.raise_cancel();
        assert!(ctx.cancelled());
    }

    #[tokio::test]
    async fn existing_watchers_observe_cancel() {
        let ctx = RunContext::new("t", test_baseline());
        let mut watcher = ctx.cancel_watch();
        ctx.raise_cancel();
        watcher.changed().await.unwrap();
        assert!(*watcher.borrow());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn ids_are_unique_under_concurrency() {
        let ctx = Arc::new(RunContext::new("t", test_baseline()));
        let mut tasks = Vec::new();
        for _ in 0..100 {
            let ctx = ctx.clone();
            tasks.push(tokio::spawn(async move { ctx.next_id() }));
        }

        let mut seen = HashSet::new();
        for task in tasks {
            assert!(seen.insert(task.await.unwrap()), "duplicate id handed out");
        }
        assert_eq!(seen.len(), 100);
    }

    #[test]
    fn unique_names_embed_tag_and_id() {
        let ctx = RunContext::new("ab12cd34", test_baseline());
        let first = ctx.unique_name("zdt-target");
        let second = ctx.unique_name("zdt-target");
        assert_ne!(first, second);
        assert!(first.starts_with("zdt-target-ab12cd34-"));
    }

    #[test]
    fn run_tags_are_short_and_distinct() {
        let a = generate_run_tag();
        let b = generate_run_tag();
        assert_eq!(a.len(), 8);
        assert_ne!(a, b);
    }
}
