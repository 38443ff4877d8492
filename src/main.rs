/*!
# Streams - Daily notes organized into named streams

Streams keeps one markdown note per day in each of several folders
("streams"), shows which days have notes, and can keep a stream's notes
encrypted with a passphrase.

## Usage

```
streams [OPTIONS] <COMMAND>

Commands:
  list        List configured streams
  add         Add a stream
  remove      Remove a stream (its notes stay on disk)
  move        Move a stream up or down in the list
  activate    Make a stream the active one
  deactivate  Clear the active stream
  enable      Re-enable a disabled stream
  disable     Disable a stream without removing it
  open        Open the note for the date in the editor
  notes       List a stream's notes, newest first
  calendar    Show the month calendar with note indicators
  bar         Show the days around the date
  commands    List or run commands and ribbon entries
  settings    Show or change general settings

Options:
  -v, --verbose              Print verbose output
      --log-format <FORMAT>  Log format: text or json
      --prompt-passphrase    Prompt for the passphrase of encrypted streams
  -d, --date <DATE>          Date to work with instead of today
```

## Configuration

- `STREAMS_VAULT`: vault directory (defaults to "~/Documents/streams")
- `STREAMS_SETTINGS`: settings file (defaults to "<vault>/.streams/settings.json")
- `STREAMS_EDITOR` or `EDITOR`: editor for notes (defaults to "vim")
- `STREAMS_PASSPHRASE`: passphrase for encrypted streams
- `STREAMS_LOG_FORMAT`: "text" or "json"
*/

use age::secrecy::SecretString;
use chrono::Local;
use std::io;
use streams::app::StreamsContext;
use streams::cli::{handlers, CliArgs, LogFormat};
use streams::config::Config;
use streams::constants::{
    DEFAULT_LOG_LEVEL, LOG_FORMAT_JSON, TRACING_ROOT_SPAN_NAME, TRACING_SERVICE_NAME,
};
use streams::editor::SystemEditor;
use streams::errors::{AppError, AppResult};
use streams::settings::{JsonSettingsStore, SettingsStore};
use tracing::{debug, error, info, info_span};
use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` or the stored debug
/// toggle selects `debug` and the default is `info`. Output goes to stderr
/// so stdout stays clean.
fn init_logging(format: &str, verbose: bool) {
    let default_level = if verbose { "debug" } else { DEFAULT_LOG_LEVEL };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(true)
        .with_level(true);

    if format == LOG_FORMAT_JSON {
        builder.json().with_current_span(true).init();
    } else {
        builder.init();
    }
}

/// The `debugMode` toggle from the settings file, read before logging is
/// installed. An unreadable file counts as off; `run` reports it later.
fn stored_debug_mode(config: &Config) -> bool {
    JsonSettingsStore::new(&config.settings_path)
        .load()
        .map(|settings| settings.debug_mode)
        .unwrap_or(false)
}

fn main() {
    let args = CliArgs::parse();

    // Load errors are reported by run once logging is installed.
    let config = Config::load();
    let debug_mode = config.as_ref().map_or(false, stored_debug_mode);
    let log_format = match (args.log_format, &config) {
        (Some(format), _) => format.as_str().to_string(),
        (None, Ok(config)) => config.log_format.clone(),
        (None, Err(_)) => LogFormat::Text.as_str().to_string(),
    };
    init_logging(&log_format, args.verbose || debug_mode);

    let span = info_span!(
        TRACING_ROOT_SPAN_NAME,
        service = TRACING_SERVICE_NAME,
        command = ?args.command
    );
    let _guard = span.enter();
    if debug_mode {
        debug!("Debug mode enabled in settings");
    }

    if let Err(e) = run(args, config) {
        error!(error = %e, "Command failed");
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: CliArgs, config: AppResult<Config>) -> AppResult<()> {
    let today = Local::now().date_naive();
    debug!("CLI arguments: {:?}", args);

    let mut config = config?;
    if let Some(format) = args.log_format {
        config.log_format = format.as_str().to_string();
    }
    config.validate()?;
    info!(vault = %config.vault_dir.display(), "Configuration loaded");

    if args.prompt_passphrase && config.passphrase.is_none() {
        let passphrase = rpassword::prompt_password("Passphrase: ")?;
        if passphrase.is_empty() {
            return Err(AppError::Config("Passphrase cannot be empty".to_string()));
        }
        config.passphrase = Some(SecretString::new(passphrase));
    }

    let mut ctx = StreamsContext::from_config(&config, today)?;
    if let Some(date) = args.parse_date() {
        let date =
            date.map_err(|e| AppError::Config(format!("Invalid date format: {}", e)))?;
        ctx.date.set_current_date(date);
    }

    let editor = SystemEditor::new(config.editor.clone());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    handlers::run(&args.command, &mut ctx, &editor, today, &mut out)?;

    if !ctx.error_log.is_empty() {
        debug!(failures = ctx.error_log.len(), "Event handlers reported failures");
    }
    Ok(())
}
