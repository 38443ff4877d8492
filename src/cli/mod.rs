//! Command-line argument definitions.
//!
//! Parsing lives here; [`handlers`] turns parsed arguments into calls on a
//! [`StreamsContext`](crate::app::StreamsContext).

pub mod handlers;

use crate::constants::{
    APP_DESCRIPTION, APP_NAME, DATE_FORMAT_COMPACT, DATE_FORMAT_ISO, DEFAULT_BAR_RADIUS,
};
use crate::settings::BarStyle;
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use std::str::FromStr;

/// Daily notes organized into named streams
#[derive(Parser, Debug)]
#[clap(name = APP_NAME, about = APP_DESCRIPTION)]
#[clap(author, version, long_about = None)]
pub struct CliArgs {
    /// Print verbose output
    #[clap(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Log format: text or json (overrides STREAMS_LOG_FORMAT)
    #[clap(long, value_enum, global = true)]
    pub log_format: Option<LogFormat>,

    /// Prompt for the passphrase of encrypted streams
    #[clap(long, global = true)]
    pub prompt_passphrase: bool,

    /// Date to work with instead of today (format: YYYY-MM-DD or YYYYMMDD)
    #[clap(short = 'd', long, global = true)]
    pub date: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// List configured streams
    List {
        #[clap(long)]
        json: bool,
    },
    /// Add a stream
    Add {
        name: String,
        /// Folder inside the vault holding the stream's notes
        folder: String,
        #[clap(long)]
        icon: Option<String>,
        /// Show a "today" shortcut in the ribbon
        #[clap(long)]
        ribbon: bool,
        /// Register an "open today" command
        #[clap(long = "command")]
        add_command: bool,
        /// Store this stream's notes encrypted
        #[clap(long)]
        encrypt: bool,
    },
    /// Remove a stream (its notes stay on disk)
    Remove { stream: String },
    /// Move a stream up or down in the list
    Move {
        stream: String,
        #[clap(value_enum)]
        direction: Direction,
    },
    /// Make a stream the active one
    Activate { stream: String },
    /// Clear the active stream
    Deactivate,
    /// Re-enable a disabled stream
    Enable { stream: String },
    /// Disable a stream without removing it
    Disable { stream: String },
    /// Open the note for the date in the editor
    Open {
        /// Stream id or name; defaults to the active stream
        stream: Option<String>,
        /// Do not create the note when it does not exist
        #[clap(long)]
        no_create: bool,
    },
    /// List a stream's notes, newest first
    Notes {
        stream: Option<String>,
        #[clap(long)]
        json: bool,
    },
    /// Show the month calendar with note indicators
    Calendar {
        stream: Option<String>,
        /// Month to show (format: YYYY-MM)
        #[clap(long)]
        month: Option<String>,
        #[clap(long)]
        json: bool,
    },
    /// Show the days around the date
    Bar {
        stream: Option<String>,
        #[clap(long, default_value_t = DEFAULT_BAR_RADIUS)]
        radius: i64,
    },
    /// List or run commands and ribbon entries
    Commands {
        /// Run the command with this id
        #[clap(long)]
        run: Option<String>,
        #[clap(long)]
        json: bool,
    },
    /// Show or change general settings
    Settings {
        #[clap(long)]
        show_bar: Option<bool>,
        #[clap(long)]
        reuse_tab: Option<bool>,
        #[clap(long)]
        debug_mode: Option<bool>,
        #[clap(long)]
        bar_style: Option<BarStyle>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => crate::constants::LOG_FORMAT_TEXT,
            LogFormat::Json => crate::constants::LOG_FORMAT_JSON,
        }
    }
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Self {
        CliArgs::parse_from(std::env::args())
    }

    /// Get the date if specified, parsing it into a NaiveDate
    pub fn parse_date(&self) -> Option<Result<NaiveDate, chrono::ParseError>> {
        self.date.as_ref().map(|date_str| {
            NaiveDate::from_str(date_str)
                .or_else(|_| NaiveDate::parse_from_str(date_str, DATE_FORMAT_COMPACT))
        })
    }
}

/// Parses a `YYYY-MM` month into its first day.
pub fn parse_month(month: &str) -> Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), DATE_FORMAT_ISO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_open_defaults() {
        let args = CliArgs::parse_from(vec!["streams", "open"]);
        assert!(!args.verbose);
        assert!(args.date.is_none());
        assert!(args.log_format.is_none());
        assert_eq!(
            args.command,
            Command::Open {
                stream: None,
                no_create: false
            }
        );
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let args = CliArgs::parse_from(vec![
            "streams", "open", "Work", "-v", "--date", "2023-01-15", "--log-format", "json",
        ]);
        assert!(args.verbose);
        assert_eq!(args.date.as_deref(), Some("2023-01-15"));
        assert_eq!(args.log_format, Some(LogFormat::Json));
    }

    #[test]
    fn test_add_flags() {
        let args = CliArgs::parse_from(vec![
            "streams", "add", "Work", "Journal/Work", "--ribbon", "--command", "--encrypt",
        ]);
        assert_eq!(
            args.command,
            Command::Add {
                name: "Work".into(),
                folder: "Journal/Work".into(),
                icon: None,
                ribbon: true,
                add_command: true,
                encrypt: true,
            }
        );
    }

    #[test]
    fn test_move_direction() {
        let args = CliArgs::parse_from(vec!["streams", "move", "Work", "down"]);
        assert_eq!(
            args.command,
            Command::Move {
                stream: "Work".into(),
                direction: Direction::Down
            }
        );
        assert!(CliArgs::try_parse_from(vec!["streams", "move", "Work", "sideways"]).is_err());
    }

    #[test]
    fn test_settings_values() {
        let args = CliArgs::parse_from(vec![
            "streams", "settings", "--show-bar", "false", "--bar-style", "modern",
        ]);
        match args.command {
            Command::Settings {
                show_bar,
                bar_style,
                reuse_tab,
                ..
            } => {
                assert_eq!(show_bar, Some(false));
                assert_eq!(bar_style, Some(BarStyle::Modern));
                assert_eq!(reuse_tab, None);
            }
            other => panic!("Expected settings command, got {:?}", other),
        }
    }

    #[test]
    fn test_bar_radius_default() {
        let args = CliArgs::parse_from(vec!["streams", "bar"]);
        assert_eq!(
            args.command,
            Command::Bar {
                stream: None,
                radius: DEFAULT_BAR_RADIUS
            }
        );
    }

    #[test]
    fn test_subcommand_required() {
        assert!(CliArgs::try_parse_from(vec!["streams"]).is_err());
    }

    #[test]
    fn test_parse_date() {
        let parse = |date: &str| {
            CliArgs::parse_from(vec!["streams", "open", "--date", date])
                .parse_date()
                .unwrap()
        };

        let parsed = parse("2023-01-15").unwrap();
        assert_eq!((parsed.year(), parsed.month(), parsed.day()), (2023, 1, 15));
        assert_eq!(parse("20230115").unwrap(), parsed);
        assert!(parse("invalid-date").is_err());
        assert!(CliArgs::parse_from(vec!["streams", "open"]).parse_date().is_none());
    }

    #[test]
    fn test_parse_month() {
        assert_eq!(
            parse_month("2024-02").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
        );
        assert!(parse_month("2024-13").is_err());
        assert!(parse_month("February").is_err());
    }
}
