//! Opening, creating and listing a stream's daily notes.
//!
//! A note is resolved in three ways: an existing plain note opens directly,
//! an existing encrypted note opens through the encryption collaborator
//! (or reports itself locked when the collaborator is unavailable), and a
//! missing note can be created. Failures propagate to the caller, which
//! logs them once; nothing is retried.

use crate::crypto::{Encryption, PrivateTempFile};
use crate::editor::Editor;
use crate::errors::{AppError, AppResult, CryptoError};
use crate::events::{EventBus, EventData, Topic};
use crate::paths::{
    encrypted_note_path, normalize_folder, note_path, parse_note_path, NoteKind,
};
use crate::settings::Stream;
use crate::vault::Vault;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

const SOURCE: &str = "notes";

/// Where the note for a stream and date stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NoteResolution {
    /// A plain note exists.
    Existing(String),
    /// An encrypted note exists and the collaborator can open it.
    Encrypted(String),
    /// An encrypted note exists but the collaborator is unavailable.
    Locked(String),
    /// No note exists yet. `path` is where create would put it.
    Missing { path: String, encrypted: bool },
}

/// Result of [`NoteService::open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened {
        path: String,
        created: bool,
        modified: bool,
    },
    Locked(String),
    /// Missing and creation was not requested.
    Missing(String),
    /// The stream is encrypted but the collaborator is unavailable, so the
    /// note was not created.
    EncryptionUnavailable(String),
}

/// One dated note found in a stream folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteEntry {
    pub date: NaiveDate,
    pub path: String,
    pub encrypted: bool,
    pub size: u64,
}

/// BLAKE3 hex digest used to detect edits.
pub fn calculate_checksum(content: &[u8]) -> String {
    blake3::hash(content).to_hex().to_string()
}

/// Note operations over a vault, with an optional encryption collaborator.
pub struct NoteService<'a> {
    vault: &'a dyn Vault,
    encryption: &'a dyn Encryption,
    bus: EventBus,
}

impl<'a> NoteService<'a> {
    pub fn new(vault: &'a dyn Vault, encryption: &'a dyn Encryption, bus: EventBus) -> Self {
        Self {
            vault,
            encryption,
            bus,
        }
    }

    pub fn resolve(&self, stream: &Stream, date: NaiveDate) -> NoteResolution {
        let plain = note_path(stream, date);
        if self.vault.exists(&plain) {
            return NoteResolution::Existing(plain);
        }

        let encrypted = encrypted_note_path(stream, date);
        if self.vault.exists(&encrypted) {
            return if self.encryption.is_available() {
                NoteResolution::Encrypted(encrypted)
            } else {
                NoteResolution::Locked(encrypted)
            };
        }

        if stream.encrypt_this_stream {
            NoteResolution::Missing {
                path: encrypted,
                encrypted: true,
            }
        } else {
            NoteResolution::Missing {
                path: plain,
                encrypted: false,
            }
        }
    }

    /// On-disk size of the note for `date`, plain or encrypted.
    pub fn note_size(&self, stream: &Stream, date: NaiveDate) -> Option<u64> {
        self.vault
            .size(&note_path(stream, date))
            .or_else(|| self.vault.size(&encrypted_note_path(stream, date)))
    }

    /// Creates an empty note, encrypting it for encrypted streams.
    ///
    /// Returns `None` without touching the vault when the stream wants
    /// encryption and the collaborator is unavailable.
    pub fn create(&self, stream: &Stream, date: NaiveDate) -> AppResult<Option<String>> {
        if stream.encrypt_this_stream && !self.encryption.is_available() {
            warn!(stream = %stream.name, "{}", CryptoError::Unavailable);
            return Ok(None);
        }

        let plain = note_path(stream, date);
        let encrypted = encrypted_note_path(stream, date);
        if let Some(existing) = [&plain, &encrypted].into_iter().find(|p| self.vault.exists(p)) {
            return Err(AppError::Note(format!("Note already exists: {}", existing)));
        }

        self.vault.ensure_folder(&normalize_folder(&stream.folder))?;
        self.vault.create(&plain, b"")?;

        let path = if stream.encrypt_this_stream {
            match self.encryption.encrypt(self.vault, &plain) {
                Ok(path) => path,
                Err(e) => {
                    // Leave no plaintext behind when encryption fails.
                    if self.vault.exists(&plain) {
                        if let Err(cleanup) = self.vault.remove(&plain) {
                            warn!(
                                path = %plain,
                                error = %cleanup,
                                "Failed to remove plaintext after encryption failed"
                            );
                        }
                    }
                    return Err(e);
                }
            }
        } else {
            plain
        };

        info!(stream = %stream.name, path = %path, "Created note");
        self.bus
            .emit(Topic::NoteCreated, EventData::Path(path.clone()), SOURCE);
        Ok(Some(path))
    }

    /// Opens the note for `date` in `editor`, creating it first when it is
    /// missing and `create_missing` is set.
    pub fn open(
        &self,
        stream: &Stream,
        date: NaiveDate,
        editor: &dyn Editor,
        create_missing: bool,
    ) -> AppResult<OpenOutcome> {
        let (path, created) = match self.resolve(stream, date) {
            NoteResolution::Existing(path) | NoteResolution::Encrypted(path) => (path, false),
            NoteResolution::Locked(path) => {
                warn!(path = %path, "Encrypted note is locked");
                return Ok(OpenOutcome::Locked(path));
            }
            NoteResolution::Missing { path, .. } if !create_missing => {
                return Ok(OpenOutcome::Missing(path));
            }
            NoteResolution::Missing { path, .. } => match self.create(stream, date)? {
                Some(created) => (created, true),
                None => return Ok(OpenOutcome::EncryptionUnavailable(path)),
            },
        };

        let modified = match parse_note_path(&path) {
            Some((_, NoteKind::Encrypted)) => self.edit_encrypted(&path, editor)?,
            _ => self.edit_plain(&path, editor)?,
        };

        if modified {
            self.bus
                .emit(Topic::NoteModified, EventData::Path(path.clone()), SOURCE);
        }
        Ok(OpenOutcome::Opened {
            path,
            created,
            modified,
        })
    }

    fn edit_plain(&self, path: &str, editor: &dyn Editor) -> AppResult<bool> {
        let before = calculate_checksum(&self.vault.read(path)?);
        editor.open_file(&self.vault.absolute_path(path)?)?;
        let after = calculate_checksum(&self.vault.read(path)?);
        Ok(before != after)
    }

    fn edit_encrypted(&self, path: &str, editor: &dyn Editor) -> AppResult<bool> {
        let plaintext = self.encryption.decrypt(self.vault, path)?;
        let temp = PrivateTempFile::with_contents(&plaintext)?;
        let before = calculate_checksum(&plaintext);

        editor.open_file(temp.path())?;

        let edited = temp.read()?;
        let changed = calculate_checksum(&edited) != before;
        if changed {
            self.encryption.write_encrypted(self.vault, path, &edited)?;
            debug!(path = %path, "Re-encrypted edited note");
        } else {
            debug!(path = %path, "Note unchanged, skipping re-encryption");
        }
        temp.close()?;
        Ok(changed)
    }

    /// Dated notes directly inside the stream folder, newest first.
    pub fn list_notes(&self, stream: &Stream) -> AppResult<Vec<NoteEntry>> {
        let folder = normalize_folder(&stream.folder);
        let mut notes = Vec::new();
        for path in self.vault.list_files(&folder)? {
            let parent = path.rsplit_once('/').map(|(p, _)| p).unwrap_or("");
            if parent != folder {
                continue;
            }
            let Some((date, kind)) = parse_note_path(&path) else {
                continue;
            };
            let size = self.vault.size(&path).unwrap_or(0);
            notes.push(NoteEntry {
                date,
                path,
                encrypted: kind == NoteKind::Encrypted,
                size,
            });
        }
        notes.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| a.path.cmp(&b.path)));
        Ok(notes)
    }

    /// Reads a note's text, decrypting when needed.
    pub fn read_note(&self, path: &str) -> AppResult<String> {
        let bytes = match parse_note_path(path) {
            Some((_, NoteKind::Encrypted)) => self.encryption.decrypt(self.vault, path)?,
            Some((_, NoteKind::Plain)) => self.vault.read(path)?,
            None => return Err(AppError::Note(format!("Not a dated note: {}", path))),
        };
        String::from_utf8(bytes)
            .map_err(|_| AppError::Note(format!("Note is not valid UTF-8: {}", path)))
    }
}
