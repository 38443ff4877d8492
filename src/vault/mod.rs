//! File access for notes.
//!
//! The [`Vault`] trait is the narrow slice of file API the rest of the
//! crate needs: everything is addressed by vault-relative `/`-separated
//! paths. [`FsVault`] maps those onto a directory on disk.

use crate::errors::{AppError, AppResult};
use std::fs::{self, OpenOptions};
#[cfg(unix)]
use std::fs::Permissions;
use std::io::{self, Write};
#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// Vault-relative file operations.
pub trait Vault {
    fn exists(&self, path: &str) -> bool;

    /// Size in bytes, or `None` when the file does not exist.
    fn size(&self, path: &str) -> Option<u64>;

    fn read(&self, path: &str) -> AppResult<Vec<u8>>;

    /// Replaces the file's contents, creating it if needed.
    fn write(&self, path: &str, contents: &[u8]) -> AppResult<()>;

    /// Creates a new file; fails if it already exists.
    fn create(&self, path: &str, contents: &[u8]) -> AppResult<()>;

    fn remove(&self, path: &str) -> AppResult<()>;

    /// Creates `folder` and its parents.
    fn ensure_folder(&self, folder: &str) -> AppResult<()>;

    /// Vault-relative paths of all files below `folder`, sorted.
    fn list_files(&self, folder: &str) -> AppResult<Vec<String>>;

    /// Location on disk, for handing a note to an external editor.
    fn absolute_path(&self, path: &str) -> AppResult<PathBuf>;
}

/// A vault rooted at a directory on the local filesystem.
///
/// New folders get owner-only permissions (0o700) and new files 0o600 on
/// Unix.
#[derive(Debug, Clone)]
pub struct FsVault {
    root: PathBuf,
}

impl FsVault {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Creates the vault root if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if the root is not an absolute path, and
    /// `AppError::Io` if creating it fails.
    pub fn ensure_root(&self) -> AppResult<()> {
        if !self.root.is_absolute() {
            return Err(AppError::Config(format!(
                "Vault directory path must be absolute: {}",
                self.root.display()
            )));
        }
        if !self.root.exists() {
            create_private_dir_all(&self.root)?;
            debug!("Created vault directory");
        }
        Ok(())
    }

    /// Resolves a vault-relative path, rejecting anything that would
    /// escape the root.
    fn resolve(&self, path: &str) -> AppResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        for component in relative.components() {
            match component {
                Component::Normal(_) | Component::CurDir => {}
                _ => {
                    return Err(AppError::Note(format!(
                        "Path escapes the vault: {}",
                        path
                    )))
                }
            }
        }
        Ok(self.root.join(relative))
    }

    fn ensure_parent(&self, full: &Path) -> AppResult<()> {
        if let Some(parent) = full.parent() {
            if !parent.exists() {
                create_private_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

impl Vault for FsVault {
    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn size(&self, path: &str) -> Option<u64> {
        let full = self.resolve(path).ok()?;
        let metadata = fs::metadata(full).ok()?;
        metadata.is_file().then(|| metadata.len())
    }

    fn read(&self, path: &str) -> AppResult<Vec<u8>> {
        Ok(fs::read(self.resolve(path)?)?)
    }

    fn write(&self, path: &str, contents: &[u8]) -> AppResult<()> {
        let full = self.resolve(path)?;
        self.ensure_parent(&full)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full)?;
        restrict_file(&file)?;
        file.write_all(contents)?;
        Ok(())
    }

    fn create(&self, path: &str, contents: &[u8]) -> AppResult<()> {
        let full = self.resolve(path)?;
        self.ensure_parent(&full)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&full)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    AppError::Note(format!("Note already exists: {}", path))
                } else {
                    AppError::Io(e)
                }
            })?;
        restrict_file(&file)?;
        file.write_all(contents)?;
        debug!(path = %path, "Created file");
        Ok(())
    }

    fn remove(&self, path: &str) -> AppResult<()> {
        fs::remove_file(self.resolve(path)?)?;
        Ok(())
    }

    fn ensure_folder(&self, folder: &str) -> AppResult<()> {
        let full = self.resolve(folder)?;
        if !full.exists() {
            create_private_dir_all(&full)?;
        }
        Ok(())
    }

    fn list_files(&self, folder: &str) -> AppResult<Vec<String>> {
        let base = self.resolve(folder)?;
        if !base.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(&base).follow_links(false) {
            let entry = entry.map_err(|e| {
                AppError::Io(io::Error::other(format!(
                    "Failed to walk {}: {}",
                    folder, e
                )))
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            files.push(parts.join("/"));
        }
        files.sort();
        Ok(files)
    }

    fn absolute_path(&self, path: &str) -> AppResult<PathBuf> {
        self.resolve(path)
    }
}

fn create_private_dir_all(dir: &Path) -> AppResult<()> {
    fs::create_dir_all(dir).map_err(|e| {
        AppError::Io(io::Error::new(
            e.kind(),
            format!("Failed to create directory {}: {}", dir.display(), e),
        ))
    })?;

    #[cfg(unix)]
    {
        use crate::constants::DEFAULT_DIR_PERMISSIONS;
        fs::set_permissions(dir, Permissions::from_mode(DEFAULT_DIR_PERMISSIONS)).map_err(
            |e| {
                AppError::Io(io::Error::new(
                    e.kind(),
                    format!("Failed to set secure permissions on directory: {}", e),
                ))
            },
        )?;
    }
    Ok(())
}

#[allow(unused_variables)]
fn restrict_file(file: &fs::File) -> AppResult<()> {
    #[cfg(unix)]
    {
        use crate::constants::DEFAULT_FILE_PERMISSIONS;
        let mut permissions = file.metadata()?.permissions();
        permissions.set_mode(DEFAULT_FILE_PERMISSIONS);
        file.set_permissions(permissions)?;
    }
    Ok(())
}
