//! Opening notes in an external editor.
//!
//! Opening a note is abstracted behind the [`Editor`] trait so note
//! operations can be tested without spawning processes.

use crate::errors::{AppError, AppResult, EditorError};
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Something that can show a note file to the user.
///
/// # Examples
///
/// ```
/// use streams::editor::Editor;
/// use streams::errors::AppResult;
/// use std::path::Path;
///
/// struct DummyEditor;
///
/// impl Editor for DummyEditor {
///     fn open_file(&self, path: &Path) -> AppResult<()> {
///         println!("Would open {}", path.display());
///         Ok(())
///     }
/// }
///
/// DummyEditor.open_file(Path::new("Daily/2024-01-15.md")).unwrap();
/// ```
pub trait Editor {
    /// Opens `path` and returns once the user is done with it.
    fn open_file(&self, path: &Path) -> AppResult<()>;
}

/// Launches an external command with the note path as its only argument.
///
/// ```no_run
/// use streams::editor::{Editor, SystemEditor};
/// use std::path::Path;
///
/// let editor = SystemEditor::new("vim");
/// editor.open_file(Path::new("/vault/Daily/2024-01-15.md"))?;
/// # Ok::<(), streams::AppError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SystemEditor {
    /// The command to run (e.g. "vim", "code", "nano").
    pub editor_cmd: String,
}

impl SystemEditor {
    pub fn new(editor_cmd: impl Into<String>) -> Self {
        Self {
            editor_cmd: editor_cmd.into(),
        }
    }
}

impl Editor for SystemEditor {
    /// # Errors
    ///
    /// Maps spawn failures to `EditorError::CommandNotFound`,
    /// `EditorError::PermissionDenied` or `EditorError::ExecutionFailed`
    /// by I/O error kind, and a failing exit status to
    /// `EditorError::NonZeroExit`.
    fn open_file(&self, path: &Path) -> AppResult<()> {
        debug!("Launching editor: {} {:?}", self.editor_cmd, path);

        let command = self.editor_cmd.clone();
        match Command::new(&self.editor_cmd).arg(path).status() {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::Editor(EditorError::CommandNotFound { command, source: e }))
            }
            Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
                Err(AppError::Editor(EditorError::PermissionDenied { command, source: e }))
            }
            Err(e) => Err(AppError::Editor(EditorError::ExecutionFailed { command, source: e })),
            Ok(status) if !status.success() => Err(AppError::Editor(EditorError::NonZeroExit {
                command,
                status_code: status.code().unwrap_or(-1),
            })),
            Ok(_) => Ok(()),
        }
    }
}
