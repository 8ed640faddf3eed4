//! Top-level app shell for Kiln.
//!
//! Consumes license verdicts from `kiln-license` and chooses which of
//! the four top-level views to present. Rendering lives elsewhere; this
//! crate only decides *what* to show and keeps the decision fresh.

mod view;

pub use view::{AppShell, AppView, ExpiryReason, ShellConfig, VIEW_RECHECK_INTERVAL};
