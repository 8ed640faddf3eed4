//! The persisted license record and its validity arithmetic.
//!
//! All time math lives here as pure functions of an explicit `now` so the
//! validator stays trivially testable. Two independent windows apply:
//!
//! - the **revalidation threshold** (24 hours) decides *when* a fresh
//!   remote check is attempted;
//! - the **grace window** (7 days) decides *how long* an unreachable
//!   server is tolerated.
//!
//! Absolute expiry (`valid_until`) dominates both: a record past its
//! expiry is invalid no matter how recently it was validated.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Days an unreachable license server is tolerated after the last
/// successful validation.
pub const GRACE_PERIOD_DAYS: i64 = 7;

/// Hours after which a cached verdict is considered stale and a fresh
/// remote check is attempted.
pub const REVALIDATE_AFTER_HOURS: i64 = 24;

/// Days before expiry at which the renewal nudge switches on.
pub const RENEW_SOON_DAYS: i64 = 14;

/// The single persisted license record for this installation.
///
/// Timestamps serialize as RFC 3339 strings, which sort lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    /// Stable per-installation device identifier.
    pub device_id: String,
    /// Opaque subscription key, stored normalized (trimmed, uppercased).
    pub license_key: String,
    /// Account email, stored normalized (trimmed, lowercased).
    pub user_email: String,
    /// Absolute subscription expiry.
    pub valid_until: DateTime<Utc>,
    /// Last time the server (or the dev bypass) confirmed validity.
    pub last_validated: DateTime<Utc>,
    /// Cache of the last computed verdict.
    pub is_valid: bool,
}

/// Classification of a record at an instant, before any network I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Assessment {
    /// Past `valid_until`. Terminal; grace never applies.
    Expired,
    /// Validated within the last 24 hours.
    Fresh,
    /// Not expired, but the last validation is over 24 hours old.
    Stale,
}

impl LicenseRecord {
    /// When the offline grace window closes.
    #[must_use]
    pub fn grace_period_ends(&self) -> DateTime<Utc> {
        self.last_validated + Duration::days(GRACE_PERIOD_DAYS)
    }

    /// True if `now` is past the absolute subscription expiry.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }

    /// True if `now` is still inside the offline grace window.
    #[must_use]
    pub fn in_grace_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.grace_period_ends()
    }

    /// Classifies this record at `now`. Expiry is checked first;
    /// reordering these arms would let an expired-but-recently-checked
    /// record report valid indefinitely.
    #[must_use]
    pub fn assess_at(&self, now: DateTime<Utc>) -> Assessment {
        if self.is_expired_at(now) {
            Assessment::Expired
        } else if now - self.last_validated > Duration::hours(REVALIDATE_AFTER_HOURS) {
            Assessment::Stale
        } else {
            Assessment::Fresh
        }
    }

    /// Whole days until expiry, clamped at zero.
    #[must_use]
    pub fn days_remaining_at(&self, now: DateTime<Utc>) -> i64 {
        (self.valid_until - now).num_days().max(0)
    }
}

/// Renewal summary surfaced to the account screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenewalInfo {
    /// Display price, e.g. `"$12/month"`.
    pub price: String,
    /// Whole days until the subscription lapses.
    pub days_remaining: i64,
    /// The expiry date itself.
    pub will_expire_on: DateTime<Utc>,
    /// True once expiry is two weeks out or closer.
    pub should_renew_soon: bool,
}
