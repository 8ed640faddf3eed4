//! Shared test helpers for shell tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use kiln_license::{LicenseRecord, LicenseStore, LicenseValidator, ValidationConfig};
use kiln_shell::ShellConfig;
use std::sync::Arc;
use std::time::Duration as StdDuration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_KEY: &str = "KILN-4F2A-9921-TEST";
pub const TEST_EMAIL: &str = "dev@example.com";

/// Opt-in log output for debugging timer-driven tests
/// (`RUST_LOG=kiln_shell=debug cargo test`).
pub fn init_logging() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .try_init();
    });
}

pub fn temp_store() -> (TempDir, LicenseStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = LicenseStore::open_at(dir.path()).expect("open store");
    (dir, store)
}

pub fn record_at(last_validated_ago: Duration, expires_in: Duration) -> LicenseRecord {
    let now = Utc::now();
    LicenseRecord {
        device_id: "KILN-0011223344556677-test".to_string(),
        license_key: TEST_KEY.to_string(),
        user_email: TEST_EMAIL.to_string(),
        valid_until: now + expires_in,
        last_validated: now - last_validated_ago,
        is_valid: true,
    }
}

pub fn validator_for(store: LicenseStore, base_url: &str) -> Arc<LicenseValidator> {
    Arc::new(LicenseValidator::new(
        store,
        ValidationConfig {
            api_base_url: base_url.to_string(),
            request_timeout_secs: 5,
            ..ValidationConfig::default()
        },
    ))
}

pub fn offline_validator(store: LicenseStore) -> Arc<LicenseValidator> {
    validator_for(store, "http://127.0.0.1:1")
}

/// Timer cadences fast enough for tests but far enough apart to stay
/// deterministic.
pub fn fast_config() -> ShellConfig {
    ShellConfig {
        recheck_every: StdDuration::from_millis(100),
        revalidation_every: StdDuration::from_secs(3600),
        heartbeat_every: StdDuration::from_secs(3600),
    }
}

pub async fn mount_accept(server: &MockServer, valid_for: Duration) {
    let valid_until = Utc::now() + valid_for;
    Mock::given(method("POST"))
        .and(path("/v1/licenses/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "valid": true,
            "validUntil": valid_until.to_rfc3339(),
            "userEmail": TEST_EMAIL,
            "subscriptionActive": true,
            "daysRemaining": valid_for.num_days(),
        })))
        .mount(server)
        .await;
}

pub async fn mount_heartbeat(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/licenses/heartbeat"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}
