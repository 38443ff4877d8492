//! Settings persisted as a JSON file.

use super::{Settings, SettingsStore};
use crate::errors::{AppError, AppResult, LockError};
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// Stores the settings record as pretty-printed JSON at a fixed path.
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, under an exclusive lock on a sibling `.lock`
/// file. Concurrent writers fail fast with [`LockError::FileBusy`] instead
/// of interleaving.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self) -> AppResult<Settings> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings file yet, using defaults");
                return Ok(Settings::default());
            }
            Err(e) => return Err(AppError::Io(e)),
        };

        if content.trim().is_empty() {
            return Ok(Settings::default());
        }

        serde_json::from_str(&content).map_err(|e| {
            AppError::Settings(format!(
                "Failed to parse settings file {}: {}",
                self.path.display(),
                e
            ))
        })
    }

    fn save(&self, settings: &Settings) -> AppResult<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .map_err(|source| LockError::AcquisitionFailed {
                path: lock_path.clone(),
                source,
            })?;

        if let Err(e) = lock_file.try_lock_exclusive() {
            if e.kind() == fs2::lock_contended_error().kind() {
                return Err(LockError::FileBusy {
                    path: self.path.clone(),
                }
                .into());
            }
            return Err(LockError::AcquisitionFailed {
                path: lock_path,
                source: e,
            }
            .into());
        }

        let json = serde_json::to_string_pretty(settings)?;
        let mut temp = NamedTempFile::new_in(&dir)?;
        temp.write_all(json.as_bytes())?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| AppError::Io(e.error))?;

        lock_file.unlock()?;
        debug!(streams = settings.streams.len(), "Settings saved");
        Ok(())
    }
}
