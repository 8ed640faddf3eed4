//! Periodic revalidation and heartbeat timers.
//!
//! Two independent tasks: an hourly proactive `is_license_valid()` call
//! that keeps the cached verdict fresh, and a 30-minute telemetry
//! heartbeat. Both are scoped to the scheduler value: `stop()` or
//! dropping it aborts them, so a logged-out installation is never polled
//! by a leaked timer.

use crate::validator::LicenseValidator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info};

/// Cadence of the proactive validity check.
pub const REVALIDATION_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Cadence of the telemetry heartbeat.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Handle over the two periodic licensing tasks.
pub struct RevalidationScheduler {
    revalidation: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

impl RevalidationScheduler {
    /// Starts both timers at their production cadence.
    #[must_use]
    pub fn start(validator: Arc<LicenseValidator>) -> Self {
        Self::start_with_intervals(validator, REVALIDATION_INTERVAL, HEARTBEAT_INTERVAL)
    }

    /// Starts both timers with explicit cadences. The first tick of each
    /// fires one full period after start.
    #[must_use]
    pub fn start_with_intervals(
        validator: Arc<LicenseValidator>,
        revalidation_every: Duration,
        heartbeat_every: Duration,
    ) -> Self {
        let revalidation = {
            let validator = Arc::clone(&validator);
            tokio::spawn(async move {
                let mut ticker = delayed_interval(revalidation_every);
                loop {
                    ticker.tick().await;
                    // Fire-and-forget: the result only refreshes cached state.
                    let valid = validator.is_license_valid().await;
                    debug!(valid, "periodic license check");
                }
            })
        };

        let heartbeat = {
            let validator = Arc::clone(&validator);
            tokio::spawn(async move {
                let mut ticker = delayed_interval(heartbeat_every);
                loop {
                    ticker.tick().await;
                    validator.send_heartbeat().await;
                }
            })
        };

        info!("revalidation scheduler started");
        Self {
            revalidation,
            heartbeat,
        }
    }

    /// Cancels both timers. Idempotent.
    pub fn stop(&self) {
        self.revalidation.abort();
        self.heartbeat.abort();
        debug!("revalidation scheduler stopped");
    }
}

impl Drop for RevalidationScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// An interval whose first tick fires after one full period, not
/// immediately.
fn delayed_interval(period: Duration) -> time::Interval {
    let mut ticker = time::interval_at(time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}
