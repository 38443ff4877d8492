//! Configuration management for the streams application.
//!
//! Configuration comes from environment variables with sensible defaults.
//! Stream definitions themselves live in the settings file, not here.
//!
//! # Environment Variables
//!
//! - `STREAMS_VAULT`: vault root directory (defaults to ~/Documents/streams)
//! - `STREAMS_SETTINGS`: settings file (defaults to `<vault>/.streams/settings.json`)
//! - `STREAMS_EDITOR`: editor used to open notes
//! - `EDITOR`: fallback editor if STREAMS_EDITOR is not set (defaults to "vim")
//! - `STREAMS_PASSPHRASE`: passphrase for encrypted streams
//! - `STREAMS_LOG_FORMAT`: "text" or "json"
//! - `HOME`: used for expanding the default vault path

use crate::constants::{
    DEFAULT_EDITOR_COMMAND, DEFAULT_VAULT_SUBDIR, EDITOR_FORBIDDEN_CHARS, ENV_VAR_EDITOR,
    ENV_VAR_HOME, ENV_VAR_STREAMS_EDITOR, ENV_VAR_STREAMS_LOG_FORMAT, ENV_VAR_STREAMS_PASSPHRASE,
    ENV_VAR_STREAMS_SETTINGS, ENV_VAR_STREAMS_VAULT, LOG_FORMAT_JSON, LOG_FORMAT_TEXT,
    REDACTED_PLACEHOLDER, SETTINGS_DIR_NAME, SETTINGS_FILE_NAME,
};
use crate::errors::{AppError, AppResult};
use age::secrecy::SecretString;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Configuration for the streams application.
///
/// # Examples
///
/// ```
/// use streams::Config;
/// use std::path::PathBuf;
///
/// let config = Config {
///     editor: "nano".to_string(),
///     vault_dir: PathBuf::from("/path/to/vault"),
///     settings_path: PathBuf::from("/path/to/vault/.streams/settings.json"),
///     ..Config::default()
/// };
/// assert!(config.validate().is_ok());
/// ```
pub struct Config {
    /// Editor command, from STREAMS_EDITOR, then EDITOR, then "vim".
    pub editor: String,

    /// Root of the vault that stream folders are relative to.
    pub vault_dir: PathBuf,

    /// JSON settings file holding the stream list.
    pub settings_path: PathBuf,

    /// Passphrase for the encryption collaborator, if configured.
    pub passphrase: Option<SecretString>,

    /// Log output format, "text" or "json".
    pub log_format: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("editor", &"[REDACTED_COMMAND]")
            .field("vault_dir", &"[REDACTED_PATH]")
            .field("settings_path", &"[REDACTED_PATH]")
            .field(
                "passphrase",
                &self.passphrase.as_ref().map(|_| REDACTED_PLACEHOLDER),
            )
            .field("log_format", &self.log_format)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            editor: DEFAULT_EDITOR_COMMAND.to_string(),
            vault_dir: PathBuf::from(""),
            settings_path: PathBuf::from(""),
            passphrase: None,
            log_format: LOG_FORMAT_TEXT.to_string(),
        }
    }
}

impl Config {
    /// Default settings file location inside a vault.
    pub fn default_settings_path(vault_dir: &Path) -> PathBuf {
        vault_dir.join(SETTINGS_DIR_NAME).join(SETTINGS_FILE_NAME)
    }

    /// Validates an editor command string for security.
    ///
    /// The command must be non-empty and free of spaces and shell
    /// metacharacters.
    fn validate_editor_command(editor_cmd: &str) -> AppResult<&str> {
        if editor_cmd.is_empty() {
            return Err(AppError::Config(
                "Editor command cannot be empty".to_string(),
            ));
        }

        if editor_cmd.contains(' ') {
            return Err(AppError::Config(
                "Editor command cannot contain spaces. Use a wrapper script or shell alias for editors requiring arguments".to_string(),
            ));
        }

        if let Some(ch) = editor_cmd.chars().find(|c| EDITOR_FORBIDDEN_CHARS.contains(c)) {
            return Err(AppError::Config(format!(
                "Editor command cannot contain shell metacharacters: '{}'. Use a wrapper script or shell alias instead",
                ch
            )));
        }

        Ok(editor_cmd)
    }

    fn expand_path(raw: &str) -> AppResult<PathBuf> {
        let expanded = shellexpand::full(raw)
            .map_err(|e| AppError::Config(format!("Failed to expand path: {}", e)))?;
        Ok(PathBuf::from(expanded.into_owned()))
    }

    /// Loads configuration from environment variables with sensible defaults.
    ///
    /// Paths are expanded with `shellexpand`, so `~` and `$VARS` work.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if path expansion fails, the vault path
    /// is empty, or the editor command fails validation. The log format is
    /// checked by [`Config::validate`], after command-line overrides.
    pub fn load() -> AppResult<Self> {
        let editor_raw = env::var(ENV_VAR_STREAMS_EDITOR)
            .or_else(|_| env::var(ENV_VAR_EDITOR))
            .unwrap_or_else(|_| DEFAULT_EDITOR_COMMAND.to_string());
        let editor = Config::validate_editor_command(&editor_raw)?;

        let vault_raw = env::var(ENV_VAR_STREAMS_VAULT).unwrap_or_else(|_| {
            let home = env::var(ENV_VAR_HOME).unwrap_or_default();
            format!("{}/{}", home, DEFAULT_VAULT_SUBDIR)
        });
        let vault_dir = Config::expand_path(&vault_raw)?;
        if vault_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Vault directory path is empty".to_string()));
        }

        let settings_path = match env::var(ENV_VAR_STREAMS_SETTINGS) {
            Ok(raw) if !raw.is_empty() => Config::expand_path(&raw)?,
            _ => Config::default_settings_path(&vault_dir),
        };

        let passphrase = env::var(ENV_VAR_STREAMS_PASSPHRASE)
            .ok()
            .filter(|p| !p.is_empty())
            .map(SecretString::new);

        let log_format = env::var(ENV_VAR_STREAMS_LOG_FORMAT)
            .unwrap_or_else(|_| LOG_FORMAT_TEXT.to_string());

        Ok(Config {
            editor: editor.to_string(),
            vault_dir,
            settings_path,
            passphrase,
            log_format,
        })
    }

    pub fn validate_log_format(format: &str) -> AppResult<()> {
        if format == LOG_FORMAT_TEXT || format == LOG_FORMAT_JSON {
            Ok(())
        } else {
            Err(AppError::Config(format!(
                "Invalid log format '{}': expected '{}' or '{}'",
                format, LOG_FORMAT_TEXT, LOG_FORMAT_JSON
            )))
        }
    }

    /// Validates that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` when the vault path is empty or relative,
    /// the settings path or editor is empty, or the log format is neither
    /// "text" nor "json".
    pub fn validate(&self) -> AppResult<()> {
        if self.vault_dir.as_os_str().is_empty() {
            return Err(AppError::Config("Vault directory path is empty".to_string()));
        }

        if self.settings_path.as_os_str().is_empty() {
            return Err(AppError::Config("Settings file path is empty".to_string()));
        }

        if self.editor.is_empty() {
            return Err(AppError::Config("Editor command is empty".to_string()));
        }

        if !self.vault_dir.is_absolute() {
            return Err(AppError::Config(
                "Vault directory must be an absolute path".to_string(),
            ));
        }

        Config::validate_log_format(&self.log_format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use age::secrecy::ExposeSecret;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        ENV_VAR_STREAMS_EDITOR,
        ENV_VAR_EDITOR,
        ENV_VAR_STREAMS_VAULT,
        ENV_VAR_STREAMS_SETTINGS,
        ENV_VAR_STREAMS_PASSPHRASE,
        ENV_VAR_STREAMS_LOG_FORMAT,
        ENV_VAR_HOME,
    ];

    /// Runs `f` with only `vars` set among the variables `Config` reads,
    /// restoring the previous environment afterwards.
    fn with_env<F: FnOnce()>(vars: &[(&str, &str)], f: F) {
        let saved: Vec<(&str, Option<String>)> =
            VARS.iter().map(|&k| (k, env::var(k).ok())).collect();
        for key in VARS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            env::set_var(key, value);
        }

        f();

        for (key, value) in saved {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }
    }

    #[test]
    fn test_debug_impl_redacts_sensitive_info() {
        let config = Config {
            editor: "vim".to_string(),
            vault_dir: PathBuf::from("/home/username/private/vault"),
            settings_path: PathBuf::from("/home/username/private/vault/s.json"),
            passphrase: Some(SecretString::new("hunter2".to_string())),
            log_format: "text".to_string(),
        };

        let debug_output = format!("{:?}", config);

        assert!(debug_output.contains("[REDACTED_COMMAND]"));
        assert!(debug_output.contains("[REDACTED_PATH]"));
        assert!(debug_output.contains(REDACTED_PLACEHOLDER));
        assert!(!debug_output.contains("vim"));
        assert!(!debug_output.contains("/home/username/private"));
        assert!(!debug_output.contains("hunter2"));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.editor, "vim");
        assert_eq!(config.vault_dir, PathBuf::from(""));
        assert!(config.passphrase.is_none());
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_load_defaults_from_home() {
        with_env(&[(ENV_VAR_HOME, "/home/tester")], || {
            let config = Config::load().unwrap();
            assert_eq!(config.editor, "vim");
            assert_eq!(config.vault_dir, PathBuf::from("/home/tester/Documents/streams"));
            assert_eq!(
                config.settings_path,
                PathBuf::from("/home/tester/Documents/streams/.streams/settings.json")
            );
            assert!(config.passphrase.is_none());
            assert_eq!(config.log_format, "text");
            assert!(config.validate().is_ok());
        });
    }

    #[test]
    #[serial]
    fn test_streams_editor_takes_precedence() {
        with_env(&[(ENV_VAR_HOME, "/h"), (ENV_VAR_EDITOR, "nano")], || {
            assert_eq!(Config::load().unwrap().editor, "nano");
        });
        with_env(
            &[
                (ENV_VAR_HOME, "/h"),
                (ENV_VAR_EDITOR, "nano"),
                (ENV_VAR_STREAMS_EDITOR, "code"),
            ],
            || {
                assert_eq!(Config::load().unwrap().editor, "code");
            },
        );
    }

    #[test]
    #[serial]
    fn test_paths_are_expanded() {
        with_env(
            &[
                (ENV_VAR_HOME, "/home/tester"),
                (ENV_VAR_STREAMS_VAULT, "~/notes"),
                (ENV_VAR_STREAMS_SETTINGS, "$HOME/streams.json"),
            ],
            || {
                let config = Config::load().unwrap();
                assert_eq!(config.vault_dir, PathBuf::from("/home/tester/notes"));
                assert_eq!(config.settings_path, PathBuf::from("/home/tester/streams.json"));
            },
        );
    }

    #[test]
    #[serial]
    fn test_passphrase_and_log_format() {
        with_env(
            &[
                (ENV_VAR_HOME, "/h"),
                (ENV_VAR_STREAMS_PASSPHRASE, "open sesame"),
                (ENV_VAR_STREAMS_LOG_FORMAT, "json"),
            ],
            || {
                let config = Config::load().unwrap();
                let passphrase = config.passphrase.as_ref().unwrap();
                assert_eq!(passphrase.expose_secret(), "open sesame");
                assert_eq!(config.log_format, "json");
            },
        );
        with_env(
            &[(ENV_VAR_HOME, "/h"), (ENV_VAR_STREAMS_PASSPHRASE, "")],
            || {
                assert!(Config::load().unwrap().passphrase.is_none());
            },
        );
    }

    #[test]
    #[serial]
    fn test_invalid_log_format() {
        with_env(
            &[(ENV_VAR_HOME, "/h"), (ENV_VAR_STREAMS_LOG_FORMAT, "xml")],
            || {
                let mut config = Config::load().unwrap();
                assert_eq!(config.log_format, "xml");
                match config.validate() {
                    Err(AppError::Config(msg)) => assert!(msg.contains("Invalid log format")),
                    other => panic!("Expected config error, got {:?}", other),
                }

                config.log_format = LOG_FORMAT_TEXT.to_string();
                assert!(config.validate().is_ok());
            },
        );
    }

    #[test]
    fn test_validate_editor_command() {
        assert!(Config::validate_editor_command("vim").is_ok());
        assert!(Config::validate_editor_command("/usr/bin/nvim").is_ok());
        assert!(Config::validate_editor_command("").is_err());
        assert!(Config::validate_editor_command("code --wait").is_err());
        for bad in ["vim;rm", "vim|cat", "$(evil)", "`x`", "a&b", "a>b"] {
            match Config::validate_editor_command(bad) {
                Err(AppError::Config(msg)) => assert!(msg.contains("metacharacters"), "{}", bad),
                other => panic!("Expected config error for {}, got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_validate_requires_absolute_vault() {
        let config = Config {
            vault_dir: PathBuf::from("relative/vault"),
            settings_path: PathBuf::from("relative/vault/s.json"),
            ..Config::default()
        };
        match config.validate() {
            Err(AppError::Config(msg)) => assert!(msg.contains("absolute")),
            other => panic!("Expected config error, got {:?}", other),
        }
    }
}
