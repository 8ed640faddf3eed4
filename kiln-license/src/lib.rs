//! Subscription licensing and activation for Kiln.
//!
//! This crate handles:
//! - Device fingerprinting for installation binding
//! - Activation against the license server
//! - Offline tolerance via a bounded grace window
//! - Periodic revalidation and telemetry heartbeats
//!
//! # Design Principles
//!
//! - **Degrade, never crash**: every failure mode maps to a structured
//!   outcome; the app shell only branches on booleans and timestamps
//! - **Expiry dominates grace**: a subscription past `valid_until` is
//!   invalid regardless of when the server was last reachable
//! - **One record per installation**: activation overwrites, logout
//!   clears, nothing else writes
//! - **Scoped timers**: every periodic task carries a cancellation
//!   handle and dies with its owner
//!
//! # Validity windows
//!
//! A verdict is trusted for 24 hours before a fresh server check is
//! attempted; an unreachable server is tolerated for 7 days past the
//! last successful validation. The two constants are independent.

mod device;
mod error;
mod record;
mod remote;
mod scheduler;
mod store;
mod validator;

pub use device::{device_id, generate_device_id, DeviceAttributes, CLIENT_AGENT, DEVICE_ID_PREFIX};
pub use error::{LicenseError, LicenseResult};
pub use record::{
    Assessment, LicenseRecord, RenewalInfo, GRACE_PERIOD_DAYS, RENEW_SOON_DAYS,
    REVALIDATE_AFTER_HOURS,
};
pub use remote::{
    HeartbeatPing, LicenseClient, ValidateRequest, ValidateResponse, ValidationConfig,
};
pub use scheduler::{RevalidationScheduler, HEARTBEAT_INTERVAL, REVALIDATION_INTERVAL};
pub use store::LicenseStore;
pub use validator::{LicenseValidator, ValidationOutcome};

#[cfg(feature = "dev-bypass")]
pub use validator::DEV_BYPASS_KEY;
