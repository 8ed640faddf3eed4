//! License-driven top-level view selection.
//!
//! The shell is a four-state machine that runs for the life of the
//! process: `Loading` until the first verdict, then `Activation`,
//! `Expired`, or `Ide`. The validator supplies verdicts; the shell only
//! branches on booleans and timestamps and never handles errors itself.
//!
//! While in `Ide` a periodic re-check notices a lapsed license and
//! forces the transition to `Expired`. Leaving for `Activation` happens
//! only on an explicit renew or logout action.

use chrono::Utc;
use kiln_license::{Assessment, LicenseValidator, RevalidationScheduler, ValidationOutcome};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Cadence of the in-editor license re-check.
pub const VIEW_RECHECK_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Why the expired screen is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryReason {
    /// The subscription is past `valid_until`.
    Expired,
    /// The license was rejected or could not be verified past grace.
    Invalid,
}

/// The top-level views the shell can present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppView {
    /// Startup, before the first verdict.
    Loading,
    /// The key/email activation form.
    Activation,
    /// The renewal screen.
    Expired {
        /// Drives the screen copy and whether retry is offered.
        reason: ExpiryReason,
    },
    /// The editor itself.
    Ide {
        /// Show the "verifying subscription when back online" banner.
        grace_banner: bool,
    },
}

/// Timer cadences for the shell. Injectable so tests run in milliseconds.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// In-editor re-check cadence.
    pub recheck_every: Duration,
    /// Proactive validity check cadence.
    pub revalidation_every: Duration,
    /// Telemetry heartbeat cadence.
    pub heartbeat_every: Duration,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            recheck_every: VIEW_RECHECK_INTERVAL,
            revalidation_every: kiln_license::REVALIDATION_INTERVAL,
            heartbeat_every: kiln_license::HEARTBEAT_INTERVAL,
        }
    }
}

/// The app shell: owns the current view and the licensing timers.
pub struct AppShell {
    validator: Arc<LicenseValidator>,
    config: ShellConfig,
    view: RwLock<AppView>,
    scheduler: Mutex<Option<RevalidationScheduler>>,
    recheck: Mutex<Option<JoinHandle<()>>>,
    /// Handed to the re-check task so a dropped shell tears it down.
    weak_self: Weak<AppShell>,
}

impl AppShell {
    /// Creates a shell in the `Loading` state with production cadences.
    #[must_use]
    pub fn new(validator: Arc<LicenseValidator>) -> Arc<Self> {
        Self::with_config(validator, ShellConfig::default())
    }

    /// Creates a shell with explicit timer cadences.
    #[must_use]
    pub fn with_config(validator: Arc<LicenseValidator>, config: ShellConfig) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            validator,
            config,
            view: RwLock::new(AppView::Loading),
            scheduler: Mutex::new(None),
            recheck: Mutex::new(None),
            weak_self: weak_self.clone(),
        })
    }

    /// The validator backing this shell.
    #[must_use]
    pub fn validator(&self) -> &Arc<LicenseValidator> {
        &self.validator
    }

    /// The currently presented view.
    pub async fn view(&self) -> AppView {
        *self.view.read().await
    }

    /// Resolves `Loading` into the first real view and, when that view is
    /// the editor, starts the licensing timers.
    pub async fn resolve_initial_view(&self) -> AppView {
        if self.validator.license_info().await.is_none() {
            self.set_view(AppView::Activation).await;
            return self.view().await;
        }

        if self.validator.is_license_valid().await {
            // A record still stale after a passing check means the server
            // was unreachable and the grace window is carrying validity.
            let grace_banner = match self.validator.license_info().await {
                Some(record) => record.assess_at(Utc::now()) == Assessment::Stale,
                None => false,
            };
            self.enter_ide(grace_banner).await;
        } else {
            let reason = self.expiry_reason().await;
            self.set_view(AppView::Expired { reason }).await;
        }
        self.view().await
    }

    /// Activates from the activation form. On success the shell confirms
    /// with a fresh validity check before presenting the editor.
    pub async fn activate(&self, key: &str, email: &str) -> ValidationOutcome {
        let outcome = self.validator.activate(key, email).await;
        if outcome.valid && self.validator.is_license_valid().await {
            self.enter_ide(outcome.offline).await;
        }
        outcome
    }

    /// Explicit renew action from the expired screen.
    pub async fn renew(&self) {
        let mut view = self.view.write().await;
        if matches!(*view, AppView::Expired { .. }) {
            *view = AppView::Activation;
        }
    }

    /// Logs out: clears the persisted license, cancels every timer, and
    /// returns to the activation form.
    pub async fn logout(&self) {
        if let Err(err) = self.validator.clear_license().await {
            warn!(%err, "failed to clear license on logout");
        }
        self.stop_timers().await;
        self.set_view(AppView::Activation).await;
        info!("logged out");
    }

    /// Cancels the scheduler and the in-editor re-check task.
    pub async fn stop_timers(&self) {
        if let Some(scheduler) = self.scheduler.lock().await.take() {
            scheduler.stop();
        }
        if let Some(handle) = self.recheck.lock().await.take() {
            handle.abort();
        }
    }

    async fn enter_ide(&self, grace_banner: bool) {
        self.set_view(AppView::Ide { grace_banner }).await;

        let mut scheduler = self.scheduler.lock().await;
        if scheduler.is_none() {
            *scheduler = Some(RevalidationScheduler::start_with_intervals(
                Arc::clone(&self.validator),
                self.config.revalidation_every,
                self.config.heartbeat_every,
            ));
        }
        drop(scheduler);

        let mut recheck = self.recheck.lock().await;
        if recheck.is_none() {
            *recheck = Some(self.spawn_recheck());
        }
    }

    /// Spawns the in-editor re-check. The task holds only a weak
    /// reference so a dropped shell tears it down.
    fn spawn_recheck(&self) -> JoinHandle<()> {
        let weak = self.weak_self.clone();
        let period = self.config.recheck_every;
        tokio::spawn(async move {
            let mut ticker = time::interval_at(time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let Some(shell) = weak.upgrade() else { break };
                if !matches!(*shell.view.read().await, AppView::Ide { .. }) {
                    continue;
                }
                if !shell.validator.is_license_valid().await {
                    let reason = shell.expiry_reason().await;
                    warn!(?reason, "license lapsed while in the editor");
                    shell.set_view(AppView::Expired { reason }).await;
                }
            }
        })
    }

    /// Distinguishes a hard expiry from every other invalid state at this
    /// moment.
    async fn expiry_reason(&self) -> ExpiryReason {
        match self.validator.license_info().await {
            Some(record) if record.is_expired_at(Utc::now()) => ExpiryReason::Expired,
            _ => ExpiryReason::Invalid,
        }
    }

    async fn set_view(&self, next: AppView) {
        let mut view = self.view.write().await;
        if *view != next {
            debug!(from = ?*view, to = ?next, "view transition");
            *view = next;
        }
    }
}
