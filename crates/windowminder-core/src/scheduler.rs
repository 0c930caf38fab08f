//! Periodic check loop.
//!
//! The first check runs immediately, then one per period. A check that
//! overruns its period delays the next one instead of bursting.

use std::future::Future;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::minder::SharedMinder;

/// Run `check_and_notify` every `period` until `shutdown` resolves.
pub async fn run_periodic_checks<F>(minder: SharedMinder, period: Duration, shutdown: F)
where
    F: Future<Output = ()>,
{
    if period.is_zero() {
        info!("scheduled checks disabled");
        return;
    }

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    info!(period_secs = period.as_secs_f64(), "scheduled checks started");
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                debug!("scheduled checks stopping");
                break;
            }
            _ = ticker.tick() => {
                let mut minder = minder.lock().await;
                let report = minder.check_and_notify().await;
                debug!(
                    delivered = report.delivered_count(),
                    failed = report.failure_count(),
                    "scheduled check done"
                );
            }
        }
    }
}
