//! Constants used throughout the application.
//!
//! This module contains all constants used in the Streams application, organized
//! into logical groups. Having constants centralized makes them easier to find,
//! modify, and reference consistently.

// Application Metadata
/// The name of the application.
pub const APP_NAME: &str = "streams";
/// The description of the application used in CLI help text.
pub const APP_DESCRIPTION: &str = "Daily notes organized into named streams";

// CLI Arguments & Defaults
/// Default command for the editor if not specified otherwise.
pub const DEFAULT_EDITOR_COMMAND: &str = "vim";
/// Log format identifier for plain text.
pub const LOG_FORMAT_TEXT: &str = "text";
/// Log format identifier for JSON.
pub const LOG_FORMAT_JSON: &str = "json";
/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

// Configuration Keys & Environment Variables
/// Environment variable for the vault root directory.
pub const ENV_VAR_STREAMS_VAULT: &str = "STREAMS_VAULT";
/// Environment variable for the settings file location.
pub const ENV_VAR_STREAMS_SETTINGS: &str = "STREAMS_SETTINGS";
/// Environment variable for specifying the preferred editor.
pub const ENV_VAR_STREAMS_EDITOR: &str = "STREAMS_EDITOR";
/// Standard environment variable for specifying the default editor.
pub const ENV_VAR_EDITOR: &str = "EDITOR";
/// Environment variable holding the passphrase for encrypted streams.
pub const ENV_VAR_STREAMS_PASSPHRASE: &str = "STREAMS_PASSPHRASE";
/// Environment variable selecting the log format.
pub const ENV_VAR_STREAMS_LOG_FORMAT: &str = "STREAMS_LOG_FORMAT";
/// Standard environment variable for the user's home directory.
pub const ENV_VAR_HOME: &str = "HOME";
/// Default vault location within the user's home directory.
pub const DEFAULT_VAULT_SUBDIR: &str = "Documents/streams";
/// Settings directory inside the vault.
pub const SETTINGS_DIR_NAME: &str = ".streams";
/// Settings file name inside the settings directory.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

// Validation
/// Characters forbidden in editor commands for security reasons.
pub const EDITOR_FORBIDDEN_CHARS: &[char] =
    &['|', '&', ';', '$', '(', ')', '`', '\\', '<', '>', '\'', '"'];
/// Placeholder string for redacted information in debug output.
pub const REDACTED_PLACEHOLDER: &str = "[REDACTED]";

// File System Parameters
/// File extension for plain notes.
pub const NOTE_FILE_EXTENSION: &str = ".md";
/// File extension for encrypted notes.
pub const ENCRYPTED_NOTE_FILE_EXTENSION: &str = ".mdenc";
/// Default POSIX permissions for newly created directories (owner read/write/execute).
#[cfg(unix)]
pub const DEFAULT_DIR_PERMISSIONS: u32 = 0o700;
/// Default POSIX permissions for newly created files (owner read/write).
#[cfg(unix)]
pub const DEFAULT_FILE_PERMISSIONS: u32 = 0o600;

// Date/Time Logic
/// Date format string for ISO date format (YYYY-MM-DD).
pub const DATE_FORMAT_ISO: &str = "%Y-%m-%d";
/// Date format string for compact date format (YYYYMMDD).
pub const DATE_FORMAT_COMPACT: &str = "%Y%m%d";
/// Month format accepted by the calendar command (YYYY-MM).
pub const MONTH_FORMAT: &str = "%Y-%m";
/// How long the date state reports `is_navigating` after a date change.
pub const NAVIGATION_DEBOUNCE_MS: u64 = 100;

// Streams
/// Icon assigned to new streams.
pub const DEFAULT_STREAM_ICON: &str = "calendar";

// Event bus & error history
/// Number of events retained by the event bus.
pub const EVENT_HISTORY_CAPACITY: usize = 100;
/// Number of failures retained by the error log.
pub const ERROR_HISTORY_CAPACITY: usize = 100;

// Content indicators
/// Notes smaller than this many bytes get a single dot.
pub const INDICATOR_SMALL_MAX_BYTES: u64 = 1000;
/// Notes smaller than this many bytes (and not small) get two dots.
pub const INDICATOR_MEDIUM_MAX_BYTES: u64 = 5000;
/// Default radius, in days, of the streams bar around the viewed date.
pub const DEFAULT_BAR_RADIUS: i64 = 3;

// Logging Configuration
/// Service name used in tracing spans and structured logs.
pub const TRACING_SERVICE_NAME: &str = "streams";
/// Name for the root tracing span covering an application invocation.
pub const TRACING_ROOT_SPAN_NAME: &str = "app_invocation";
