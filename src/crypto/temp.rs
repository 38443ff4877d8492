//! Secure temporary file handling with tmpfs preference.
//!
//! Decrypted notes are handed to the editor through a temporary file. RAM
//! backed tmpfs is preferred so plaintext is less likely to hit the disk,
//! and the file is overwritten before removal.

use crate::errors::AppResult;
use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::TempPath;
use tracing::{debug, warn};

/// Temporary filesystem paths to check for RAM-based storage.
const TMPFS_PATHS: &[&str] = &["/dev/shm", "/run/shm"];

/// Get a secure temporary directory, preferring tmpfs when available.
///
/// On Linux/BSD systems this prefers RAM-based tmpfs (`/dev/shm` or
/// `/run/shm`). Otherwise it falls back to the system temp directory with a
/// warning.
pub fn get_secure_temp_dir() -> AppResult<PathBuf> {
    for candidate in TMPFS_PATHS {
        let path = Path::new(candidate);
        if path.is_dir() && is_writable(path) {
            debug!(dir = %candidate, "Using tmpfs for decrypted notes");
            return Ok(path.to_path_buf());
        }
    }

    let fallback = std::env::temp_dir();
    warn!(
        dir = %fallback.display(),
        "tmpfs not available; decrypted notes will use the system temp directory"
    );
    Ok(fallback)
}

fn is_writable(dir: &Path) -> bool {
    tempfile::Builder::new()
        .prefix(".streams-writable-")
        .tempfile_in(dir)
        .is_ok()
}

/// A private temporary file holding decrypted note contents.
///
/// The file is created with owner-only permissions and is scrubbed and
/// removed when dropped.
#[derive(Debug)]
pub struct PrivateTempFile {
    path: Option<TempPath>,
}

impl PrivateTempFile {
    /// Creates a temp file in the secure temp directory containing
    /// `contents`. The file name keeps the `.md` suffix so editors pick
    /// markdown highlighting.
    pub fn with_contents(contents: &[u8]) -> AppResult<Self> {
        let dir = get_secure_temp_dir()?;
        Self::with_contents_in(&dir, contents)
    }

    pub fn with_contents_in(dir: &Path, contents: &[u8]) -> AppResult<Self> {
        // tempfile creates files 0o600 on Unix
        let mut file = tempfile::Builder::new()
            .prefix("streams-")
            .suffix(crate::constants::NOTE_FILE_EXTENSION)
            .tempfile_in(dir)?;
        file.write_all(contents)?;
        file.as_file().sync_all()?;
        Ok(Self {
            path: Some(file.into_temp_path()),
        })
    }

    pub fn path(&self) -> &Path {
        match &self.path {
            Some(path) => path,
            None => Path::new(""),
        }
    }

    pub fn read(&self) -> AppResult<Vec<u8>> {
        Ok(fs::read(self.path())?)
    }

    /// Overwrites and removes the file now, reporting failures.
    pub fn close(mut self) -> AppResult<()> {
        match self.path.take() {
            Some(path) => {
                secure_delete(&path)?;
                path.close()?;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Drop for PrivateTempFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            if let Err(e) = secure_delete(&path) {
                warn!(error = %e, "Failed to scrub temporary note");
            }
            // TempPath removes the file on drop.
        }
    }
}

/// Best-effort secure file deletion (overwrite before removal).
///
/// Not cryptographically secure on SSDs or journaling filesystems, but
/// better than a plain unlink.
fn secure_delete(path: &Path) -> AppResult<()> {
    let len = match fs::metadata(path) {
        Ok(metadata) => metadata.len(),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };
    let mut file: File = OpenOptions::new().write(true).open(path)?;
    file.seek(SeekFrom::Start(0))?;
    let zeros = vec![0u8; 8192];
    let mut remaining = len;
    while remaining > 0 {
        let chunk = remaining.min(zeros.len() as u64) as usize;
        file.write_all(&zeros[..chunk])?;
        remaining -= chunk as u64;
    }
    file.sync_all()?;
    Ok(())
}
