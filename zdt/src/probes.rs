//! Health-probe scheduler.
//!
//! Starts one detached probe round per timer tick until cancellation, then
//! drains in-flight rounds. Rounds deliberately overlap when a round takes
//! longer than the interval.

use crate::context::RunContext;
use futures::future::join_all;
use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info, warn};
use zdt_common::{HttpCheck, PlatformApi, SuiteConfig};

/// Target name queried in the datastore check; never provisioned, so the
/// event listing must come back empty.
const ABSENT_TARGET: &str = "zdt-absent-target";

/// Fixed past hour with no recorded traffic, so the statistics endpoint
/// answers "not found".
const UNUSED_STATS_RANGE: &str = "from=1609459200&to=1609462800";

/// The fixed battery of checks one probe round executes.
///
/// Explicit ordered list; each entry covers one externally reachable
/// subsystem of the platform.
pub fn check_battery() -> Vec<HttpCheck> {
    vec![
        HttpCheck::post("auth", "/v1/auth", 200),
        HttpCheck::get("metadata", "/v1/metadata", 200),
        HttpCheck::get(
            "statistics",
            format!("/statistics/v1/statistics?{UNUSED_STATS_RANGE}"),
            404,
        )
        .expect_fragment("no statistics found"),
        HttpCheck::get("configuration", "/configuration/v1/scopes", 200),
        HttpCheck::get("control-plane", "/controlPlane/v1/registrations?name=webhook", 200),
        HttpCheck::get(
            "datastore",
            format!("/datastore/v1/events?target={ABSENT_TARGET}&limit=20"),
            200,
        )
        .expect_fragment("\"events\":[]"),
    ]
}

/// Run the probe stream until cancellation, then drain in-flight rounds.
pub async fn run_probes(ctx: Arc<RunContext>, api: Arc<dyn PlatformApi>, cfg: SuiteConfig) {
    let battery = Arc::new(check_battery());
    let mut cancel = ctx.cancel_watch();
    let mut ticker = interval(cfg.api_probe_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        interval = ?cfg.api_probe_interval,
        checks = battery.len(),
        "probe scheduler started"
    );

    let mut rounds = Vec::new();
    loop {
        if ctx.cancelled() {
            break;
        }
        tokio::select! {
            biased;
            _ = cancel.changed() => break,
            _ = ticker.tick() => {
                debug!(round = rounds.len() + 1, "starting probe round");
                rounds.push(tokio::spawn(probe_round(
                    ctx.clone(),
                    api.clone(),
                    battery.clone(),
                )));
            }
        }
    }

    debug!(in_flight = rounds.len(), "probe scheduler draining");
    for round in rounds {
        let _ = round.await;
    }
    info!("probe scheduler stopped");
}

/// One probe round: every check in the battery, concurrently, with no
/// short-circuit on individual failures.
async fn probe_round(
    ctx: Arc<RunContext>,
    api: Arc<dyn PlatformApi>,
    battery: Arc<Vec<HttpCheck>>,
) {
    let results = join_all(battery.iter().map(|check| {
        let api = api.clone();
        async move { (check.name, api.probe(check).await) }
    }))
    .await;

    for (name, result) in results {
        match result {
            Ok(()) => ctx.counters.probe_pass(),
            Err(err) => {
                warn!(check = name, "probe check failed: {err}");
                ctx.counters.probe_fail();
            }
        }
    }
}
