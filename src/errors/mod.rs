//! Error handling utilities for the streams application.
//!
//! This module provides the central error type `AppError` which represents all
//! possible error conditions that might occur in the application, the
//! convenience type alias `AppResult`, and the [`ErrorLog`] that records
//! failures caught at call sites which choose to log and continue.

mod handler;

pub use handler::{ErrorLog, ErrorRecord};

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Represents specific error cases that can occur when interacting with external editors.
///
/// # Examples
///
/// ```
/// use streams::errors::EditorError;
/// use std::io::{self, ErrorKind};
///
/// let io_error = io::Error::new(ErrorKind::NotFound, "command not found");
/// let error = EditorError::CommandNotFound {
///     command: "vim".to_string(),
///     source: io_error,
/// };
///
/// assert!(format!("{}", error).contains("not found"));
/// assert!(format!("{}", error).contains("vim"));
/// ```
#[derive(Debug, Error)]
pub enum EditorError {
    /// Error when the specified editor command cannot be found.
    #[error("Editor command '{command}' not found: {source}. Please check that the editor is installed and available in your PATH.")]
    CommandNotFound {
        /// The editor command that was not found
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when permission is denied to execute the editor command.
    #[error("Permission denied when trying to execute editor '{command}': {source}. Please check file permissions or try running with appropriate access rights.")]
    PermissionDenied {
        /// The editor command that had permission denied
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor command fails to execute due to other I/O errors.
    #[error("Failed to execute editor '{command}': {source}. Please check system resources, disk space, or editor installation.")]
    ExecutionFailed {
        /// The editor command that failed to execute
        command: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Error when the editor exits with a non-zero status code.
    #[error("Editor '{command}' exited with non-zero status code: {status_code}. This may indicate an issue with editor configuration or the note being edited.")]
    NonZeroExit {
        /// The editor command that exited with a non-zero status
        command: String,
        /// The exit status code
        status_code: i32,
    },
}

/// Errors raised while locking the settings file for a write.
///
/// ```
/// use streams::errors::LockError;
/// use std::path::PathBuf;
///
/// let error = LockError::FileBusy {
///     path: PathBuf::from("/vault/.streams/settings.json"),
/// };
/// assert!(format!("{}", error).contains("being written"));
/// ```
#[derive(Debug, Error)]
pub enum LockError {
    /// Another process holds the settings lock.
    #[error("Settings file is currently being written by another process: {path}. Please retry once the other streams process has finished.")]
    FileBusy {
        /// The path to the locked file
        path: PathBuf,
    },

    /// Acquiring the lock failed for a technical reason.
    #[error("Failed to acquire lock for settings file {path}: {source}. Please check file permissions and ensure the directory is accessible.")]
    AcquisitionFailed {
        /// The path to the file that couldn't be locked
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Failures of the encryption collaborator.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// No passphrase is configured, so encrypted notes cannot be handled.
    #[error("Encryption not available. Set STREAMS_PASSPHRASE or pass --prompt-passphrase to work with encrypted streams.")]
    Unavailable,

    /// The passphrase did not decrypt the note.
    #[error("Incorrect passphrase. Please try again with the passphrase used to encrypt this stream: {0}")]
    InvalidPassphrase(String),

    /// The note was encrypted with something other than a passphrase.
    #[error("Unsupported encryption format")]
    UnsupportedFormat,

    /// The path handed to the collaborator has the wrong extension.
    #[error("Invalid file path: {0}")]
    InvalidPath(String),

    /// Error during encryption.
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Error during decryption.
    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),
}

/// Errors raised by stream list management.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StreamError {
    /// No stream matches the given id or name.
    #[error("Stream not found: {0}")]
    NotFound(String),

    /// A stream with this id already exists.
    #[error("A stream with id '{0}' already exists")]
    DuplicateId(String),

    /// Stream names cannot be blank.
    #[error("Stream name cannot be empty")]
    EmptyName,

    /// The stream exists but is disabled.
    #[error("Stream '{0}' is disabled")]
    Disabled(String),

    /// A reorder referenced a position outside the list.
    #[error("Stream index {index} is out of range for {len} streams")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of streams
        len: usize,
    },
}

/// Represents all possible errors that can occur in the streams application.
///
/// Note: This type does not implement `Clone` to avoid losing error context when
/// cloning `std::io::Error` values.
///
/// # Examples
///
/// ```
/// use streams::errors::AppError;
///
/// let error = AppError::Config("Missing vault directory".to_string());
/// assert_eq!(format!("{}", error), "Configuration error: Missing vault directory");
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Errors related to configuration loading or validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input/output errors from filesystem operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings record could not be read or written.
    #[error("Settings error: {0}")]
    Settings(String),

    /// The settings file is not valid JSON for the settings record.
    #[error("Settings serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Errors from stream list management.
    #[error("Stream error: {0}")]
    Stream(#[from] StreamError),

    /// Errors resolving or creating a note (e.g., invalid date formats).
    #[error("Note error: {0}")]
    Note(String),

    /// Errors when interacting with the text editor.
    #[error("Editor error: {0}")]
    Editor(#[from] EditorError),

    /// Errors related to locking the settings file.
    #[error("File locking error: {0}")]
    Lock(#[from] LockError),

    /// Errors from the encryption collaborator.
    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),
}

/// A type alias for `Result<T, AppError>` to simplify function signatures.
pub type AppResult<T> = Result<T, AppError>;
