//! HTTP client for the license server.
//!
//! Wire contract:
//!
//! - `POST /v1/licenses/validate` with `{deviceId, licenseKey, userEmail}`
//!   answers `{valid, validUntil, userEmail, message?, subscriptionActive,
//!   daysRemaining}`.
//! - `POST /v1/licenses/heartbeat` with `{deviceId, timestamp, version}`,
//!   fire-and-forget.
//!
//! Any transport failure, timeout, or non-2xx status is reported as
//! [`LicenseError::Unreachable`]; only a well-formed response with
//! `valid = false` becomes an explicit rejection.

use crate::device::CLIENT_AGENT;
use crate::error::{LicenseError, LicenseResult};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Configuration for the license server connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Base URL of the license server.
    pub api_base_url: String,
    /// Request timeout in seconds. A hung server must not stall the
    /// validity check the app shell is waiting on.
    pub request_timeout_secs: u64,
    /// Display price quoted in renewal info.
    pub renewal_price: String,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://licensing.kiln-ide.com".to_string(),
            request_timeout_secs: 10,
            renewal_price: "$12/month".to_string(),
        }
    }
}

/// Body of a validation request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// Device identifier the subscription is bound to.
    pub device_id: String,
    /// Subscription key, normalized.
    pub license_key: String,
    /// Account email, normalized.
    pub user_email: String,
}

/// Verdict returned by the license server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateResponse {
    /// Whether the key/email pair is accepted for this device.
    pub valid: bool,
    /// Subscription expiry.
    pub valid_until: DateTime<Utc>,
    /// Canonical account email.
    pub user_email: String,
    /// Optional human-readable detail, set on rejections.
    #[serde(default)]
    pub message: Option<String>,
    /// Whether the backing subscription is active.
    pub subscription_active: bool,
    /// Whole days until expiry, as computed server-side.
    pub days_remaining: i64,
}

/// Body of a heartbeat ping.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatPing {
    /// Device identifier.
    pub device_id: String,
    /// Client-side send time.
    pub timestamp: DateTime<Utc>,
    /// Client version string.
    pub version: String,
}

/// HTTP client for the license server.
#[derive(Debug, Clone)]
pub struct LicenseClient {
    config: ValidationConfig,
    http: Client,
}

impl LicenseClient {
    /// Creates a client with a bounded request timeout.
    #[must_use]
    pub fn new(config: ValidationConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .expect("failed to create HTTP client");
        Self { config, http }
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Asks the server for a verdict on the given key/email/device triple.
    ///
    /// # Errors
    ///
    /// `Unreachable` on transport failure or non-2xx status,
    /// `MalformedResponse` if the body does not parse. A parsed response
    /// with `valid = false` is returned as `Ok`; mapping it to a
    /// rejection is the validator's call.
    pub async fn validate(&self, request: &ValidateRequest) -> LicenseResult<ValidateResponse> {
        let url = format!("{}/v1/licenses/validate", self.config.api_base_url);
        debug!(%url, device_id = %request.device_id, "validating license");

        let response = self
            .http
            .post(&url)
            .header("X-Device-Id", &request.device_id)
            .header("X-Client-Version", CLIENT_AGENT)
            .json(request)
            .send()
            .await
            .map_err(|e| LicenseError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LicenseError::Unreachable(format!(
                "license server returned {status}"
            )));
        }

        response
            .json::<ValidateResponse>()
            .await
            .map_err(|e| LicenseError::MalformedResponse(e.to_string()))
    }

    /// Sends a usage ping. Telemetry only; callers swallow the error.
    ///
    /// # Errors
    ///
    /// `Unreachable` on transport failure or non-2xx status.
    pub async fn heartbeat(&self, ping: &HeartbeatPing) -> LicenseResult<()> {
        let url = format!("{}/v1/licenses/heartbeat", self.config.api_base_url);

        let response = self
            .http
            .post(&url)
            .header("X-Device-Id", &ping.device_id)
            .header("X-Client-Version", CLIENT_AGENT)
            .json(ping)
            .send()
            .await
            .map_err(|e| LicenseError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(LicenseError::Unreachable(format!(
                "heartbeat returned {status}"
            )));
        }
        Ok(())
    }
}
