//! Shared test helpers for license tests.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use kiln_license::{LicenseRecord, LicenseStore, LicenseValidator, ValidationConfig};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_KEY: &str = "KILN-4F2A-9921-TEST";
pub const TEST_EMAIL: &str = "dev@example.com";

/// A store rooted in a fresh temp directory. Keep the `TempDir` alive
/// for the duration of the test.
pub fn temp_store() -> (TempDir, LicenseStore) {
    let dir = TempDir::new().expect("temp dir");
    let store = LicenseStore::open_at(dir.path()).expect("open store");
    (dir, store)
}

/// A record whose timestamps are offsets from now.
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

/// A validator wired to the given mock server.
pub fn validator_for(store: LicenseStore, server: &MockServer) -> LicenseValidator {
    LicenseValidator::new(store, config_for(&server.uri()))
}

/// A validator pointed at a dead endpoint (connection refused).
pub fn offline_validator(store: LicenseStore) -> LicenseValidator {
    LicenseValidator::new(store, config_for("http://127.0.0.1:1"))
}

pub fn config_for(base_url: &str) -> ValidationConfig {
    ValidationConfig {
        api_base_url: base_url.to_string(),
        request_timeout_secs: 5,
        ..ValidationConfig::default()
    }
}

/// JSON body of an accepting validation response.
pub fn accept_body(valid_until: DateTime<Utc>, days_remaining: i64) -> serde_json::Value {
    serde_json::json!({
        "valid": true,
        "validUntil": valid_until.to_rfc3339(),
        "userEmail": TEST_EMAIL,
        "subscriptionActive": true,
        "daysRemaining": days_remaining,
    })
}

/// JSON body of an explicit rejection.
pub fn reject_body(message: &str) -> serde_json::Value {
    serde_json::json!({
        "valid": false,
        "validUntil": Utc::now().to_rfc3339(),
        "userEmail": TEST_EMAIL,
        "message": message,
        "subscriptionActive": false,
        "daysRemaining": 0,
    })
}

/// Mounts an accepting validate endpoint.
pub async fn mount_accept(server: &MockServer, valid_for: Duration) {
    let valid_until = Utc::now() + valid_for;
    Mock::given(method("POST"))
        .and(path("/v1/licenses/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accept_body(
            valid_until,
            valid_for.num_days(),
        )))
        .mount(server)
        .await;
}

/// Mounts a rejecting validate endpoint.
pub async fn mount_reject(server: &MockServer, message: &str) {
    Mock::given(method("POST"))
        .and(path("/v1/licenses/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reject_body(message)))
        .mount(server)
        .await;
}

/// Mounts a validate endpoint answering a server error.
pub async fn mount_server_error(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/licenses/validate"))
        .respond_with(ResponseTemplate::new(503))
        .mount(server)
        .await;
}

/// Mounts a heartbeat endpoint.
pub async fn mount_heartbeat(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/licenses/heartbeat"))
        .respond_with(ResponseTemplate::new(204))
        .mount(server)
        .await;
}
