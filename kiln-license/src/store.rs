//! Durable storage for the license record and device identifier.
//!
//! Two independent blobs under one app data directory: `license.json`
//! holds the serialized [`LicenseRecord`], `device_id` holds the bare
//! identifier string. Single process, single writer, synchronous I/O.
//!
//! A record blob that fails to parse is treated as absent, resetting the
//! installation to the not-activated state instead of erroring.

use crate::error::{LicenseError, LicenseResult};
use crate::record::LicenseRecord;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

const RECORD_FILE: &str = "license.json";
const DEVICE_ID_FILE: &str = "device_id";

/// File-backed storage for licensing state.
#[derive(Debug, Clone)]
pub struct LicenseStore {
    dir: PathBuf,
}

impl LicenseStore {
    /// Opens the store under the platform data directory
    /// (e.g. `~/.local/share/kiln` on Linux).
    ///
    /// # Errors
    ///
    /// Returns an error if the platform exposes no data directory or the
    /// app directory cannot be created.
    pub fn open_default() -> LicenseResult<Self> {
        let dir = dirs::data_dir()
            .ok_or_else(|| LicenseError::Storage("no platform data directory".to_string()))?
            .join("kiln");
        Self::open_at(dir)
    }

    /// Opens the store rooted at an explicit directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_at(dir: impl Into<PathBuf>) -> LicenseResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| LicenseError::Storage(format!("create {}: {e}", dir.display())))?;
        Ok(Self { dir })
    }

    /// The directory this store writes under.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persists the record, overwriting any prior value.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, record: &LicenseRecord) -> LicenseResult<()> {
        let json = serde_json::to_string_pretty(record)?;
        let path = self.record_path();
        std::fs::write(&path, json)
            .map_err(|e| LicenseError::Storage(format!("write {}: {e}", path.display())))?;
        debug!(path = %path.display(), "license record saved");
        Ok(())
    }

    /// Loads the persisted record, or `None` if absent or unreadable.
    #[must_use]
    pub fn load(&self) -> Option<LicenseRecord> {
        let path = self.record_path();
        let raw = std::fs::read_to_string(&path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(record) => Some(record),
            Err(err) => {
                warn!(%err, path = %path.display(), "license record unreadable, treating as not activated");
                None
            }
        }
    }

    /// Removes the persisted record. Missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> LicenseResult<()> {
        let path = self.record_path();
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(LicenseError::Storage(format!(
                "remove {}: {e}",
                path.display()
            ))),
        }
    }

    /// Loads the persisted device identifier, if any.
    #[must_use]
    pub fn load_device_id(&self) -> Option<String> {
        let raw = std::fs::read_to_string(self.device_id_path()).ok()?;
        let id = raw.trim().to_string();
        if id.is_empty() { None } else { Some(id) }
    }

    /// Persists the device identifier. Written once per installation.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn save_device_id(&self, id: &str) -> LicenseResult<()> {
        let path = self.device_id_path();
        std::fs::write(&path, id)
            .map_err(|e| LicenseError::Storage(format!("write {}: {e}", path.display())))
    }

    fn record_path(&self) -> PathBuf {
        self.dir.join(RECORD_FILE)
    }

    fn device_id_path(&self) -> PathBuf {
        self.dir.join(DEVICE_ID_FILE)
    }
}
