//! License validation and the offline grace-period algorithm.
//!
//! The validator owns the single mutable [`LicenseRecord`] for the
//! process. It is constructed once at application start with its store
//! and server configuration, and handed by `Arc` to whatever consumes
//! verdicts. Remote calls are serialized through an in-flight guard so
//! two overlapping checks can never race a store write.
//!
//! Failure handling degrades rather than throws: every public operation
//! returns a structured outcome or a plain boolean, and the only errors
//! surfaced are storage writes failing during explicit mutations.

use crate::device;
use crate::error::{LicenseError, LicenseResult};
use crate::record::{Assessment, LicenseRecord, RenewalInfo, RENEW_SOON_DAYS};
use crate::remote::{HeartbeatPing, LicenseClient, ValidateRequest, ValidationConfig};
use crate::store::LicenseStore;
use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Developer bypass key. Compiled in only with the `dev-bypass` feature;
/// grants a synthetic one-year subscription without a server round-trip.
#[cfg(feature = "dev-bypass")]
pub const DEV_BYPASS_KEY: &str = "KILN-DEV-MASTER";

/// Outcome of an activation or validation attempt. Never an `Err`: the
/// validator absorbs network and storage failures into this shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    /// Whether the license is usable right now.
    pub valid: bool,
    /// True when validity comes from the offline grace window rather
    /// than a server verdict.
    pub offline: bool,
    /// Human-readable detail for the activation screen.
    pub message: String,
}

impl ValidationOutcome {
    fn accepted(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            offline: false,
            message: message.into(),
        }
    }

    fn offline_grace(message: impl Into<String>) -> Self {
        Self {
            valid: true,
            offline: true,
            message: message.into(),
        }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self {
            valid: false,
            offline: false,
            message: message.into(),
        }
    }
}

/// Validates activations and keeps the persisted record fresh.
pub struct LicenseValidator {
    store: LicenseStore,
    client: LicenseClient,
    device_id: String,
    record: RwLock<Option<LicenseRecord>>,
    /// Serializes remote validation calls; at most one in flight.
    in_flight: Mutex<()>,
}

impl LicenseValidator {
    /// Creates a validator, resolving the device identity and loading any
    /// persisted record.
    #[must_use]
    pub fn new(store: LicenseStore, config: ValidationConfig) -> Self {
        let device_id = device::device_id(&store);
        let record = store.load();
        if record.is_some() {
            debug!(device_id = %device_id, "loaded persisted license record");
        }
        Self {
            client: LicenseClient::new(config),
            device_id,
            record: RwLock::new(record),
            store,
            in_flight: Mutex::new(()),
        }
    }

    /// The stable device identifier for this installation.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Exchanges a key/email pair for a confirmed, persisted record.
    ///
    /// On server rejection the grace window is not consulted; on an
    /// unreachable server an existing in-grace record keeps the
    /// installation usable offline.
    pub async fn activate(&self, key: &str, email: &str) -> ValidationOutcome {
        let key = key.trim().to_uppercase();
        let email = email.trim().to_lowercase();

        #[cfg(feature = "dev-bypass")]
        if key == DEV_BYPASS_KEY {
            return self.activate_bypass(&key, &email).await;
        }

        let _guard = self.in_flight.lock().await;

        let request = ValidateRequest {
            device_id: self.device_id.clone(),
            license_key: key.clone(),
            user_email: email.clone(),
        };

        match self.client.validate(&request).await {
            Ok(response) if response.valid => {
                let record = LicenseRecord {
                    device_id: self.device_id.clone(),
                    license_key: key,
                    user_email: response.user_email,
                    valid_until: response.valid_until,
                    last_validated: Utc::now(),
                    is_valid: true,
                };
                self.commit(record).await;
                info!("license activated");
                ValidationOutcome::accepted(
                    response
                        .message
                        .unwrap_or_else(|| "License activated".to_string()),
                )
            }
            Ok(response) => {
                let message = response
                    .message
                    .unwrap_or_else(|| "License key or email not recognized".to_string());
                warn!(%message, "activation rejected");
                ValidationOutcome::failed(message)
            }
            Err(err) if err.is_unreachable() => self.offline_fallback(err).await,
            Err(err) => ValidationOutcome::failed(err.to_string()),
        }
    }

    #[cfg(feature = "dev-bypass")]
    async fn activate_bypass(&self, key: &str, email: &str) -> ValidationOutcome {
        let now = Utc::now();
        let record = LicenseRecord {
            device_id: self.device_id.clone(),
            license_key: key.to_string(),
            user_email: email.to_string(),
            valid_until: now + chrono::Duration::days(365),
            last_validated: now,
            is_valid: true,
        };
        self.commit(record).await;
        warn!("license activated via developer bypass key");
        ValidationOutcome::accepted("Developer license activated")
    }

    /// The staleness/grace algorithm.
    ///
    /// Checks, in order: record present, absolute expiry, staleness
    /// (with a remote re-check when stale), grace window. Expiry is
    /// checked before grace; a record past `valid_until` is invalid no
    /// matter how recently the server confirmed it.
    pub async fn is_license_valid(&self) -> bool {
        let _guard = self.in_flight.lock().await;

        let Some(record) = self.record.read().await.clone() else {
            return false;
        };

        let now = Utc::now();
        match record.assess_at(now) {
            Assessment::Expired => false,
            Assessment::Fresh => record.is_valid,
            Assessment::Stale => match self.revalidate(&record).await {
                Some(verdict) => verdict,
                // Server unreachable: tolerate inside the grace window.
                None => record.is_valid && record.in_grace_at(now),
            },
        }
    }

    /// Attempts a fresh server verdict for a stale record. Returns `None`
    /// when the server could not answer (the grace window applies);
    /// `Some(verdict)` when it did.
    async fn revalidate(&self, record: &LicenseRecord) -> Option<bool> {
        let request = ValidateRequest {
            device_id: record.device_id.clone(),
            license_key: record.license_key.clone(),
            user_email: record.user_email.clone(),
        };

        match self.client.validate(&request).await {
            Ok(response) => {
                let mut updated = record.clone();
                updated.last_validated = Utc::now();
                updated.valid_until = response.valid_until;
                updated.is_valid = response.valid;
                self.commit(updated).await;
                if response.valid {
                    debug!("license revalidated");
                } else {
                    warn!(message = ?response.message, "license revalidation rejected");
                }
                Some(response.valid)
            }
            Err(err) => {
                debug!(%err, "revalidation failed, falling back to grace window");
                None
            }
        }
    }

    /// True while the last successful validation is at most seven days
    /// old. Callers must pair this with an expiry check: grace never
    /// overrides `valid_until`.
    pub async fn is_in_grace_period(&self) -> bool {
        match self.record.read().await.as_ref() {
            Some(record) => record.in_grace_at(Utc::now()),
            None => false,
        }
    }

    /// When the grace window closes, or `None` if not activated.
    pub async fn grace_period_end(&self) -> Option<chrono::DateTime<Utc>> {
        self.record
            .read()
            .await
            .as_ref()
            .map(LicenseRecord::grace_period_ends)
    }

    /// The current record, or `None` if not activated.
    pub async fn license_info(&self) -> Option<LicenseRecord> {
        self.record.read().await.clone()
    }

    /// Renewal summary for the account screen, or `None` if not activated.
    pub async fn renewal_info(&self) -> Option<RenewalInfo> {
        let record = self.record.read().await.clone()?;
        let days_remaining = record.days_remaining_at(Utc::now());
        Some(RenewalInfo {
            price: self.client.config().renewal_price.clone(),
            days_remaining,
            will_expire_on: record.valid_until,
            should_renew_soon: days_remaining <= RENEW_SOON_DAYS,
        })
    }

    /// Sends a usage ping. Fire-and-forget: failures are logged and
    /// swallowed.
    pub async fn send_heartbeat(&self) {
        let ping = HeartbeatPing {
            device_id: self.device_id.clone(),
            timestamp: Utc::now(),
            version: device::CLIENT_AGENT.to_string(),
        };
        if let Err(err) = self.client.heartbeat(&ping).await {
            debug!(%err, "heartbeat not delivered");
        }
    }

    /// Removes the persisted record and in-memory state. The device
    /// identifier survives; it belongs to the installation, not the
    /// subscription.
    ///
    /// # Errors
    ///
    /// Returns an error if the record blob exists but cannot be removed.
    pub async fn clear_license(&self) -> LicenseResult<()> {
        self.store.clear()?;
        *self.record.write().await = None;
        info!("license cleared");
        Ok(())
    }

    /// Replaces the record in memory and on disk. A failed write keeps
    /// the in-memory record authoritative for this process and is logged.
    async fn commit(&self, record: LicenseRecord) {
        if let Err(err) = self.store.save(&record) {
            warn!(%err, "failed to persist license record");
        }
        *self.record.write().await = Some(record);
    }

    /// Falls back to the grace window after an unreachable server during
    /// activation.
    async fn offline_fallback(&self, err: LicenseError) -> ValidationOutcome {
        let now = Utc::now();
        match self.record.read().await.as_ref() {
            Some(record)
                if record.is_valid && !record.is_expired_at(now) && record.in_grace_at(now) =>
            {
                info!("license server unreachable, operating on grace window");
                ValidationOutcome::offline_grace(format!(
                    "License server unreachable; operating offline until {}",
                    record.grace_period_ends().format("%Y-%m-%d %H:%M UTC")
                ))
            }
            _ => ValidationOutcome::failed(format!("Could not reach license server: {err}")),
        }
    }
}
