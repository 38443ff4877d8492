//! Integration tests for encrypted streams.
//!
//! These tests verify the complete workflow of an encrypted stream with the
//! age collaborator: creating a note, editing it through a private
//! temporary file, and reading it back.

use age::secrecy::SecretString;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use streams::crypto::{AgeEncryption, Encryption};
use streams::editor::Editor;
use streams::errors::{AppError, AppResult, CryptoError};
use streams::events::{EventBus, Topic};
use streams::notes::{NoteService, OpenOutcome};
use streams::settings::Stream;
use streams::vault::{FsVault, Vault};
use tempfile::tempdir;

/// Appends a line to whatever file it is asked to open.
struct AppendingEditor {
    line: &'static str,
    opened: Mutex<Vec<PathBuf>>,
}

impl AppendingEditor {
    fn new(line: &'static str) -> Self {
        Self {
            line,
            opened: Mutex::new(Vec::new()),
        }
    }
}

impl Editor for AppendingEditor {
    fn open_file(&self, path: &Path) -> AppResult<()> {
        self.opened.lock().unwrap().push(path.to_path_buf());
        let mut content = fs::read_to_string(path)?;
        content.push_str(self.line);
        fs::write(path, content)?;
        Ok(())
    }
}

fn encryption(passphrase: &str) -> AgeEncryption {
    AgeEncryption::new(SecretString::new(passphrase.to_string()))
}

fn private() -> Stream {
    Stream {
        encrypt_this_stream: true,
        ..Stream::new("Private", "Private")
    }
}

#[test]
fn test_encrypted_note_lifecycle() {
    let dir = tempdir().expect("create temp dir");
    let vault = FsVault::new(dir.path());
    let age = encryption("integration-test-passphrase");
    let bus = EventBus::new();
    let notes = NoteService::new(&vault, &age, bus.clone());
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    let editor = AppendingEditor::new("first line\n");

    let outcome = notes.open(&private(), date, &editor, true).expect("open note");

    assert_eq!(
        outcome,
        OpenOutcome::Opened {
            path: "Private/2024-01-15.mdenc".to_string(),
            created: true,
            modified: true,
        }
    );

    // The editor only ever saw a temporary file outside the vault, which
    // is gone afterwards.
    let opened = editor.opened.lock().unwrap().clone();
    assert_eq!(opened.len(), 1);
    assert!(!opened[0].starts_with(dir.path()));
    assert!(!opened[0].exists());

    // Only ciphertext is on disk.
    let on_disk = vault.read("Private/2024-01-15.mdenc").unwrap();
    assert!(!on_disk.windows(10).any(|w| w == b"first line"));
    assert!(!vault.exists("Private/2024-01-15.md"));

    assert_eq!(
        notes.read_note("Private/2024-01-15.mdenc").unwrap(),
        "first line\n"
    );
    assert_eq!(bus.history_for(Topic::NoteModified).len(), 1);
}

#[test]
fn test_wrong_passphrase_cannot_open() {
    let dir = tempdir().expect("create temp dir");
    let vault = FsVault::new(dir.path());
    encryption("right")
        .write_encrypted(&vault, "Private/2024-01-15.mdenc", b"secret")
        .unwrap();

    let wrong = encryption("wrong");
    let notes = NoteService::new(&vault, &wrong, EventBus::new());
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

    let result = notes.open(&private(), date, &AppendingEditor::new("x"), false);

    assert!(matches!(
        result,
        Err(AppError::Crypto(CryptoError::InvalidPassphrase(_)))
    ));
    assert!(encryption("right")
        .decrypt(&vault, "Private/2024-01-15.mdenc")
        .is_ok());
}

#[test]
fn test_encrypting_an_existing_plain_note() {
    let dir = tempdir().expect("create temp dir");
    let vault = FsVault::new(dir.path());
    vault.create("Private/2024-01-15.md", b"was plain").unwrap();
    let age = encryption("pass");

    let encrypted = age.encrypt(&vault, "Private/2024-01-15.md").unwrap();

    assert_eq!(encrypted, "Private/2024-01-15.mdenc");
    assert!(!vault.exists("Private/2024-01-15.md"));
    assert_eq!(age.decrypt(&vault, &encrypted).unwrap(), b"was plain");
}
