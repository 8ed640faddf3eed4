//! Property tests for the validity arithmetic.

use chrono::{Duration, Utc};
use kiln_license::{Assessment, LicenseRecord, GRACE_PERIOD_DAYS, REVALIDATE_AFTER_HOURS};
use proptest::prelude::*;

const DAY_SECS: i64 = 24 * 60 * 60;

fn record(validated_ago_secs: i64, expires_in_secs: i64) -> LicenseRecord {
    let now = Utc::now();
    LicenseRecord {
        device_id: "KILN-0123456789abcdef-prop".to_string(),
        license_key: "KILN-PROP-0001".to_string(),
        user_email: "prop@example.com".to_string(),
        valid_until: now + Duration::seconds(expires_in_secs),
        last_validated: now - Duration::seconds(validated_ago_secs),
        is_valid: true,
    }
}

proptest! {
    /// A record past its expiry is Expired no matter how recently it was
    /// validated.
    #[test]
    fn expiry_dominates_recency(
        validated_ago in 0i64..(30 * DAY_SECS),
        expired_for in 1i64..(30 * DAY_SECS),
    ) {
        let rec = record(validated_ago, -expired_for);
        prop_assert_eq!(rec.assess_at(Utc::now()), Assessment::Expired);
    }

    /// Inside 24 hours a record is Fresh; past it, Stale. Expiry far in
    /// the future in both cases.
    #[test]
    fn staleness_threshold_classifies(validated_ago in 0i64..(10 * DAY_SECS)) {
        let rec = record(validated_ago, 365 * DAY_SECS);
        let expected = if validated_ago <= REVALIDATE_AFTER_HOURS * 60 * 60 {
            Assessment::Fresh
        } else {
            Assessment::Stale
        };
        // Allow the boundary second itself to land either way: the clock
        // advances between record construction and assessment.
        if (validated_ago - REVALIDATE_AFTER_HOURS * 60 * 60).abs() > 1 {
            prop_assert_eq!(rec.assess_at(Utc::now()), expected);
        }
    }

    /// Leaving the grace window is one-way: once out, staying out for
    /// every later instant.
    #[test]
    fn grace_exit_is_monotonic(
        validated_ago in 0i64..(20 * DAY_SECS),
        later in 0i64..(20 * DAY_SECS),
    ) {
        let rec = record(validated_ago, 365 * DAY_SECS);
        let now = Utc::now();
        if !rec.in_grace_at(now) {
            prop_assert!(!rec.in_grace_at(now + Duration::seconds(later)));
        }
    }

    /// The grace window closes exactly seven days after the last
    /// validation.
    #[test]
    fn grace_window_length_is_fixed(validated_ago in 0i64..(20 * DAY_SECS)) {
        let rec = record(validated_ago, 365 * DAY_SECS);
        prop_assert_eq!(
            rec.grace_period_ends() - rec.last_validated,
            Duration::days(GRACE_PERIOD_DAYS)
        );
    }

    /// Days remaining never goes negative.
    #[test]
    fn days_remaining_is_non_negative(expires_in in -(30 * DAY_SECS)..(30 * DAY_SECS)) {
        let rec = record(0, expires_in);
        prop_assert!(rec.days_remaining_at(Utc::now()) >= 0);
    }
}
