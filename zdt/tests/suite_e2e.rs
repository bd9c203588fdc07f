//! End-to-end suite runs over scripted collaborators.
//!
//! Timing is compressed so a whole run (two upgrade steps plus overlapping
//! probe and verification rounds) fits in a few hundred milliseconds.

use std::sync::Arc;
use std::time::Duration;
use zdt::suite::run_suite;
use zdt_common::mock::{MockDeployer, MockPlatform};
use zdt_common::SuiteConfig;

fn fast_config() -> SuiteConfig {
    SuiteConfig {
        upgrade_iterations: 2,
        install_revision: "1.0.0".to_string(),
        upgrade_revision: "2.0.0".to_string(),
        api_probe_interval: Duration::from_millis(20),
        sequences_interval: Duration::from_millis(30),
        workflow_wait: Duration::from_millis(40),
        workflow_poll_interval: Duration::from_millis(10),
        ..SuiteConfig::default()
    }
}

#[tokio::test]
async fn suite_runs_to_completion_with_consistent_totals() {
    let platform = Arc::new(MockPlatform::healthy());
    let deployer = Arc::new(MockDeployer::with_delay(Duration::from_millis(60)));

    let report = run_suite(platform.clone(), deployer.clone(), fast_config())
        .await
        .expect("suite should run to completion");

    let counters = report.counters();
    assert_eq!(counters.total_probes, counters.passed_probes + counters.failed_probes);
    assert_eq!(
        counters.fired_workflows,
        counters.passed_workflows + counters.failed_workflows
    );
    assert!(counters.total_probes > 0, "probe rounds should have fired");
    assert_eq!(counters.failed_probes, 0);

    // Two upgrade steps, alternating revisions.
    assert_eq!(deployer.revisions(), vec!["2.0.0", "1.0.0"]);

    // Baseline target provisioned exactly once, before the streams start.
    let created = platform.created_names();
    assert!(!created.is_empty());
    assert!(created[0].contains("baseline"));
    assert_eq!(
        created.iter().filter(|name| name.contains("baseline")).count(),
        1
    );
}

#[tokio::test]
async fn expected_failure_cases_are_summarized_not_fatal() {
    // Only "delivery" exists, so the missing-workflow cases are rejected
    // at launch and land in the failure counter while the run completes.
    let platform = Arc::new(MockPlatform::rejecting_unknown_workflows(&["delivery"]));
    let deployer = Arc::new(MockDeployer::with_delay(Duration::from_millis(60)));

    let report = run_suite(platform, deployer, fast_config())
        .await
        .expect("individual workflow failures must not fail the run");

    let counters = report.counters();
    assert_eq!(
        counters.fired_workflows,
        counters.passed_workflows + counters.failed_workflows
    );
    if counters.fired_workflows >= 2 {
        assert!(counters.failed_workflows > 0);
        assert!(report.has_failures());
    }
}

#[tokio::test]
async fn probe_failures_show_up_in_the_report() {
    let platform = Arc::new(MockPlatform::with_failing_checks(&["datastore"]));
    let deployer = Arc::new(MockDeployer::with_delay(Duration::from_millis(50)));

    let report = run_suite(platform, deployer, fast_config())
        .await
        .expect("probe failures must not fail the run");

    let counters = report.counters();
    assert!(counters.failed_probes > 0);
    assert_eq!(counters.total_probes, counters.passed_probes + counters.failed_probes);
    assert!(report.has_failures());
}
