//! The optional encryption collaborator for encrypted streams.
//!
//! Notes of an encrypted stream are stored with the `.mdenc` extension.
//! Whether they can be read or written depends on an [`Encryption`]
//! implementation being available at runtime; its absence is a disabled
//! feature, not an error, and encrypted notes then show up as locked.
//!
//! # Module Structure
//!
//! - `age`: passphrase encryption with the age format
//! - `temp`: private temporary files for editing decrypted notes
//!
//! # Example
//!
//! ```no_run
//! use streams::crypto::{AgeEncryption, Encryption};
//! use streams::vault::FsVault;
//! use age::secrecy::SecretString;
//!
//! let vault = FsVault::new("/home/me/Documents/streams");
//! let encryption = AgeEncryption::new(SecretString::new("passphrase".to_string()));
//! let encrypted = encryption.encrypt(&vault, "Private/2024-01-15.md")?;
//! assert_eq!(encrypted, "Private/2024-01-15.mdenc");
//! # Ok::<(), streams::AppError>(())
//! ```

pub mod age;
pub mod temp;

pub use self::age::{decrypt_with_passphrase, encrypt_with_passphrase, AgeEncryption};
pub use self::temp::{get_secure_temp_dir, PrivateTempFile};

use crate::errors::{AppResult, CryptoError};
use crate::paths::{parse_note_path, with_kind, NoteKind};
use crate::vault::Vault;

/// Capability offered by the encryption collaborator.
pub trait Encryption {
    /// Whether the collaborator can be used right now.
    fn is_available(&self) -> bool;

    /// Encrypts `plaintext`.
    fn seal(&self, plaintext: &[u8]) -> AppResult<Vec<u8>>;

    /// Decrypts what [`Encryption::seal`] produced.
    fn open(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>>;

    /// Encrypts the plain note at `path` into its `.mdenc` sibling and
    /// removes the plain file. Returns the encrypted note's path.
    ///
    /// Fails without touching either file when the sibling already exists.
    fn encrypt(&self, vault: &dyn Vault, path: &str) -> AppResult<String> {
        let target = match parse_note_path(path) {
            Some((_, NoteKind::Plain)) => with_kind(path, NoteKind::Encrypted),
            _ => None,
        }
        .ok_or_else(|| CryptoError::InvalidPath(path.to_string()))?;

        let plaintext = vault.read(path)?;
        let ciphertext = self.seal(&plaintext)?;
        vault.create(&target, &ciphertext)?;
        vault.remove(path)?;
        Ok(target)
    }

    /// Returns the plaintext of the encrypted note at `path`.
    fn decrypt(&self, vault: &dyn Vault, path: &str) -> AppResult<Vec<u8>> {
        if !matches!(parse_note_path(path), Some((_, NoteKind::Encrypted))) {
            return Err(CryptoError::InvalidPath(path.to_string()).into());
        }
        self.open(&vault.read(path)?)
    }

    /// Replaces the encrypted note at `path` with `plaintext`, encrypted.
    fn write_encrypted(&self, vault: &dyn Vault, path: &str, plaintext: &[u8]) -> AppResult<()> {
        if !matches!(parse_note_path(path), Some((_, NoteKind::Encrypted))) {
            return Err(CryptoError::InvalidPath(path.to_string()).into());
        }
        let ciphertext = self.seal(plaintext)?;
        vault.write(path, &ciphertext)
    }
}

/// Stand-in used when no collaborator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEncryption;

impl Encryption for NoEncryption {
    fn is_available(&self) -> bool {
        false
    }

    fn seal(&self, _plaintext: &[u8]) -> AppResult<Vec<u8>> {
        Err(CryptoError::Unavailable.into())
    }

    fn open(&self, _ciphertext: &[u8]) -> AppResult<Vec<u8>> {
        Err(CryptoError::Unavailable.into())
    }
}
