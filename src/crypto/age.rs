//! Passphrase encryption with the age format.

use crate::crypto::Encryption;
use crate::errors::{AppResult, CryptoError};
use age::secrecy::SecretString;
use std::fmt;
use std::io::{Read, Write};

/// Encrypt data using age with passphrase.
///
/// # Example
///
/// ```no_run
/// use streams::crypto::encrypt_with_passphrase;
/// use age::secrecy::SecretString;
///
/// let passphrase = SecretString::new("my-secret-passphrase".to_string());
/// let encrypted = encrypt_with_passphrase(b"Secret data", &passphrase)?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn encrypt_with_passphrase(plaintext: &[u8], passphrase: &SecretString) -> AppResult<Vec<u8>> {
    let encryptor = age::Encryptor::with_user_passphrase(passphrase.clone());

    let mut ciphertext = Vec::new();
    let mut writer = encryptor
        .wrap_output(&mut ciphertext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    writer
        .write_all(plaintext)
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| CryptoError::EncryptionFailed(e.to_string()))?;

    Ok(ciphertext)
}

/// Decrypt age-encrypted data with passphrase.
///
/// # Errors
///
/// Returns `CryptoError::InvalidPassphrase` when the passphrase does not
/// match, and `CryptoError::UnsupportedFormat` when the data was encrypted
/// to recipients rather than a passphrase.
pub fn decrypt_with_passphrase(ciphertext: &[u8], passphrase: &SecretString) -> AppResult<Vec<u8>> {
    let decryptor = match age::Decryptor::new(ciphertext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?
    {
        age::Decryptor::Passphrase(d) => d,
        _ => return Err(CryptoError::UnsupportedFormat.into()),
    };

    let mut reader = decryptor
        .decrypt(passphrase, None)
        .map_err(|e| CryptoError::InvalidPassphrase(e.to_string()))?;

    let mut plaintext = Vec::new();
    reader
        .read_to_end(&mut plaintext)
        .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

    Ok(plaintext)
}

/// Encryption collaborator backed by a single passphrase.
pub struct AgeEncryption {
    passphrase: SecretString,
}

impl AgeEncryption {
    pub fn new(passphrase: SecretString) -> Self {
        Self { passphrase }
    }
}

impl fmt::Debug for AgeEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgeEncryption")
            .field("passphrase", &crate::constants::REDACTED_PLACEHOLDER)
            .finish()
    }
}

impl Encryption for AgeEncryption {
    fn is_available(&self) -> bool {
        true
    }

    fn seal(&self, plaintext: &[u8]) -> AppResult<Vec<u8>> {
        encrypt_with_passphrase(plaintext, &self.passphrase)
    }

    fn open(&self, ciphertext: &[u8]) -> AppResult<Vec<u8>> {
        decrypt_with_passphrase(ciphertext, &self.passphrase)
    }
}
