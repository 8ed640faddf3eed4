//! Device identity for license binding.
//!
//! Produces a stable per-installation identifier from coarse machine
//! attributes. The identifier is persisted on first generation and read
//! back on every later call, so it survives restarts; it is a best-effort
//! binding, not a security boundary, and deliberately avoids
//! uniquely-identifying hardware serials.

use crate::store::LicenseStore;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::env;
use tracing::{debug, warn};

/// Prefix on every generated device identifier.
pub const DEVICE_ID_PREFIX: &str = "KILN";

/// Client agent string sent with every server call and mixed into the
/// fingerprint.
pub const CLIENT_AGENT: &str = concat!("kiln-ide/", env!("CARGO_PKG_VERSION"));

/// Coarse machine attributes feeding the fingerprint hash.
///
/// Every field is optional: a probe that fails is simply absent from the
/// hash input rather than aborting generation.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceAttributes {
    /// Operating system name.
    pub platform: Option<String>,
    /// CPU architecture.
    pub arch: Option<String>,
    /// Operating system version.
    pub os_version: Option<String>,
    /// Machine hostname.
    pub hostname: Option<String>,
    /// Client agent string.
    pub client_agent: Option<String>,
}

impl DeviceAttributes {
    /// Collects attributes for the current machine.
    #[must_use]
    pub fn collect() -> Self {
        Self {
            platform: non_empty(env::consts::OS),
            arch: non_empty(env::consts::ARCH),
            os_version: get_os_version(),
            hostname: get_hostname(),
            client_agent: Some(CLIENT_AGENT.to_string()),
        }
    }

    /// True if no probe yielded anything usable.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platform.is_none()
            && self.arch.is_none()
            && self.os_version.is_none()
            && self.hostname.is_none()
            && self.client_agent.is_none()
    }
}

/// Returns the device identifier for this installation.
///
/// If one was persisted earlier it is returned unchanged; otherwise a new
/// identifier is generated from the current machine attributes, persisted,
/// and returned. A storage write failure is logged and the fresh
/// identifier is still returned.
#[must_use]
pub fn device_id(store: &LicenseStore) -> String {
    if let Some(id) = store.load_device_id() {
        return id;
    }

    let id = generate_device_id(&DeviceAttributes::collect());
    if let Err(err) = store.save_device_id(&id) {
        warn!(%err, "failed to persist device id, continuing with in-memory id");
    } else {
        debug!(id = %id, "generated device id");
    }
    id
}

/// Generates a `KILN-<hex>-<base36 timestamp>` identifier from the given
/// attributes. Falls back to a random UUID as hash input when every probe
/// failed; that fallback is not reproducible across reinstalls.
#[must_use]
pub fn generate_device_id(attrs: &DeviceAttributes) -> String {
    let hash_input = if attrs.is_empty() {
        warn!("no machine attributes available, falling back to random identity");
        uuid::Uuid::new_v4().to_string()
    } else {
        // Serialization of a struct of strings cannot fail.
        serde_json::to_string(attrs).unwrap_or_else(|_| uuid::Uuid::new_v4().to_string())
    };

    let mut hasher = Sha256::new();
    hasher.update(hash_input.as_bytes());
    let digest = hasher.finalize();

    format!(
        "{}-{}-{}",
        DEVICE_ID_PREFIX,
        hex::encode(&digest[..8]),
        base36(chrono::Utc::now().timestamp_millis())
    )
}

/// Lowercase base-36 rendering of a non-negative integer.
fn base36(mut n: i64) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n <= 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while n > 0 {
        out.push(DIGITS[(n % 36) as usize]);
        n /= 36;
    }
    out.reverse();
    String::from_utf8(out).expect("base36 digits are ASCII")
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s.to_string())
    }
}

/// Gets the machine hostname, if resolvable.
fn get_hostname() -> Option<String> {
    hostname::get().ok().and_then(|h| h.into_string().ok())
}

/// Gets the OS version string, if the platform exposes one.
fn get_os_version() -> Option<String> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("sw_vers")
            .arg("-productVersion")
            .output()
            .ok()
            .and_then(|o| String::from_utf8(o.stdout).ok())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/etc/os-release")
            .ok()
            .and_then(|content| {
                content
                    .lines()
                    .find(|l| l.starts_with("VERSION_ID="))
                    .map(|l| {
                        l.trim_start_matches("VERSION_ID=")
                            .trim_matches('"')
                            .to_string()
                    })
            })
            .filter(|s| !s.is_empty())
    }

    #[cfg(target_os = "windows")]
    {
        // The build ID from the registry would be better; the coarse
        // constant is enough for a non-unique fingerprint component.
        Some("windows".to_string())
    }

    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        None
    }
}
