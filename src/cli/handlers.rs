//! Executes parsed subcommands against a [`StreamsContext`].
//!
//! Results go to `out` (stdout in the binary); user notices go to stderr
//! and the log.

use crate::app::{CommandOutcome, StreamsContext};
use crate::calendar::render_strip;
use crate::cli::{parse_month, Command, Direction};
use crate::commands::{all_commands, ribbon_entries};
use crate::editor::Editor;
use crate::errors::{AppError, AppResult};
use crate::notes::OpenOutcome;
use crate::settings::{SettingsStore, Stream};
use chrono::NaiveDate;
use serde_json::json;
use std::io::Write;
use tracing::{info, warn};

/// Runs `command`, writing its output to `out`.
pub fn run<S, W>(
    command: &Command,
    ctx: &mut StreamsContext<S>,
    editor: &dyn Editor,
    today: NaiveDate,
    out: &mut W,
) -> AppResult<()>
where
    S: SettingsStore,
    W: Write,
{
    match command {
        Command::List { json } => list(ctx, *json, out),
        Command::Add {
            name,
            folder,
            icon,
            ribbon,
            add_command,
            encrypt,
        } => {
            let mut stream = Stream::new(name.as_str(), folder.as_str());
            if let Some(icon) = icon {
                stream.icon = icon.clone();
            }
            stream.show_today_in_ribbon = *ribbon;
            stream.add_command = *add_command;
            stream.encrypt_this_stream = *encrypt;

            let added = ctx.streams.add_stream(stream)?.clone();
            if ctx.streams.active_stream()?.is_none() {
                ctx.streams.set_active_stream(Some(&added.id))?;
            }
            writeln!(out, "Added stream {} ({})", added.name, added.id)?;
            Ok(())
        }
        Command::Remove { stream } => {
            let id = ctx.streams.find(stream)?.id.clone();
            let removed = ctx.streams.remove_stream(&id)?;
            writeln!(out, "Removed stream {}", removed.name)?;
            Ok(())
        }
        Command::Move { stream, direction } => {
            let found = ctx.streams.find(stream)?.clone();
            let index = ctx.streams.position(&found.id).unwrap_or(0);
            let new_index = match direction {
                Direction::Up => ctx.streams.move_up(index)?,
                Direction::Down => ctx.streams.move_down(index)?,
            };
            writeln!(out, "{} is now at position {}", found.name, new_index + 1)?;
            Ok(())
        }
        Command::Activate { stream } => {
            let found = ctx.streams.find(stream)?.clone();
            ctx.streams.set_active_stream(Some(&found.id))?;
            writeln!(out, "Active stream: {}", found.name)?;
            Ok(())
        }
        Command::Deactivate => {
            ctx.streams.set_active_stream(None)?;
            writeln!(out, "No active stream")?;
            Ok(())
        }
        Command::Enable { stream } => set_disabled(ctx, stream, false, out),
        Command::Disable { stream } => set_disabled(ctx, stream, true, out),
        Command::Open { stream, no_create } => {
            let outcome = ctx.open_note(stream.as_deref(), editor, !no_create)?;
            report_open(&outcome, out)
        }
        Command::Notes { stream, json } => {
            let stream = ctx.resolve_stream(stream.as_deref())?;
            let notes = ctx.notes().list_notes(&stream)?;
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&notes)?)?;
            } else if notes.is_empty() {
                writeln!(out, "No notes in {}", stream.name)?;
            } else {
                for note in notes {
                    let marker = if note.encrypted { " (encrypted)" } else { "" };
                    writeln!(out, "{}  {}  {} B{}", note.date, note.path, note.size, marker)?;
                }
            }
            Ok(())
        }
        Command::Calendar {
            stream,
            month,
            json,
        } => {
            if let Some(month) = month {
                let first = parse_month(month)
                    .map_err(|e| AppError::Config(format!("Invalid month '{}': {}", month, e)))?;
                ctx.date.set_current_date(first);
            }
            let grid = ctx.month_grid(stream.as_deref(), today)?;
            if *json {
                writeln!(out, "{}", serde_json::to_string_pretty(&grid)?)?;
            } else {
                write!(out, "{}", grid.render())?;
            }
            Ok(())
        }
        Command::Bar { stream, radius } => {
            if !ctx.streams.settings().show_streams_bar {
                info!("Streams bar is hidden in settings; showing it on request");
            }
            let name = ctx.resolve_stream(stream.as_deref())?.name;
            let cells = ctx.day_strip(stream.as_deref(), *radius, today)?;
            writeln!(out, "{}", name)?;
            write!(out, "{}", render_strip(&cells))?;
            Ok(())
        }
        Command::Commands { run, json } => match run {
            Some(id) => {
                let outcome = ctx.run_command(id, editor, today)?;
                match outcome {
                    CommandOutcome::Note(open) => report_open(&open, out),
                    CommandOutcome::Date(date) => {
                        writeln!(out, "{}", date)?;
                        Ok(())
                    }
                    CommandOutcome::StreamsBar(shown) => {
                        let state = if shown { "shown" } else { "hidden" };
                        writeln!(out, "Streams bar {}", state)?;
                        Ok(())
                    }
                }
            }
            None => {
                let settings = ctx.streams.settings();
                let commands = all_commands(settings);
                let ribbon = ribbon_entries(settings);
                if *json {
                    let value = json!({ "commands": commands, "ribbon": ribbon });
                    writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
                } else {
                    for command in commands {
                        writeln!(out, "{:<24} {}", command.id, command.name)?;
                    }
                    for entry in ribbon {
                        writeln!(out, "ribbon: {} [{}]", entry.tooltip, entry.icon)?;
                    }
                }
                Ok(())
            }
        },
        Command::Settings {
            show_bar,
            reuse_tab,
            debug_mode,
            bar_style,
        } => {
            let changed = show_bar.is_some()
                || reuse_tab.is_some()
                || debug_mode.is_some()
                || bar_style.is_some();
            if changed {
                ctx.streams.update_settings(|s| {
                    if let Some(v) = show_bar {
                        s.show_streams_bar = *v;
                    }
                    if let Some(v) = reuse_tab {
                        s.reuse_current_tab = *v;
                    }
                    if let Some(v) = debug_mode {
                        s.debug_mode = *v;
                    }
                    if let Some(v) = bar_style {
                        s.bar_style = *v;
                    }
                })?;
            }
            let settings = ctx.streams.settings();
            let value = json!({
                "activeStreamId": settings.active_stream_id,
                "showStreamsBar": settings.show_streams_bar,
                "reuseCurrentTab": settings.reuse_current_tab,
                "debugMode": settings.debug_mode,
                "barStyle": settings.bar_style,
                "streams": settings.streams.len(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&value)?)?;
            Ok(())
        }
    }
}

fn list<S: SettingsStore, W: Write>(
    ctx: &mut StreamsContext<S>,
    json: bool,
    out: &mut W,
) -> AppResult<()> {
    let active = ctx.streams.active_stream()?.map(|s| s.id.clone());
    let streams = ctx.streams.streams();

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(streams)?)?;
        return Ok(());
    }
    if streams.is_empty() {
        writeln!(
            out,
            "No streams configured. Add one with: streams add <NAME> <FOLDER>"
        )?;
        return Ok(());
    }

    for (i, stream) in streams.iter().enumerate() {
        let marker = if active.as_deref() == Some(stream.id.as_str()) {
            '*'
        } else {
            ' '
        };
        let mut flags = Vec::new();
        if stream.encrypt_this_stream {
            flags.push("encrypted");
        }
        if stream.disabled {
            flags.push("disabled");
        }
        let flags = if flags.is_empty() {
            String::new()
        } else {
            format!(" ({})", flags.join(", "))
        };
        writeln!(
            out,
            "{} {}. {}  {}  [{}]{}",
            marker,
            i + 1,
            stream.name,
            stream.folder,
            stream.id,
            flags
        )?;
    }
    Ok(())
}

fn set_disabled<S: SettingsStore, W: Write>(
    ctx: &mut StreamsContext<S>,
    key: &str,
    disabled: bool,
    out: &mut W,
) -> AppResult<()> {
    let id = ctx.streams.find(key)?.id.clone();
    let stream = ctx.streams.update_stream(&id, |s| s.disabled = disabled)?;
    let state = if disabled { "Disabled" } else { "Enabled" };
    writeln!(out, "{} stream {}", state, stream.name)?;
    Ok(())
}

fn report_open<W: Write>(outcome: &OpenOutcome, out: &mut W) -> AppResult<()> {
    match outcome {
        OpenOutcome::Opened {
            path,
            created,
            modified,
        } => {
            let mut notes = Vec::new();
            if *created {
                notes.push("created");
            }
            if *modified {
                notes.push("modified");
            }
            if notes.is_empty() {
                writeln!(out, "Opened {}", path)?;
            } else {
                writeln!(out, "Opened {} ({})", path, notes.join(", "))?;
            }
        }
        OpenOutcome::Missing(path) => {
            writeln!(out, "No note at {}", path)?;
        }
        OpenOutcome::Locked(path) => {
            notice(&format!(
                "{} is encrypted and encryption is not available. Set STREAMS_PASSPHRASE or pass --prompt-passphrase.",
                path
            ));
        }
        OpenOutcome::EncryptionUnavailable(path) => {
            notice(&format!(
                "Encryption not available; {} was not created. Set STREAMS_PASSPHRASE or pass --prompt-passphrase.",
                path
            ));
        }
    }
    Ok(())
}

fn notice(message: &str) {
    warn!("{}", message);
    eprintln!("{}", message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::NoEncryption;
    use crate::editor::tests::MockEditor;
    use crate::errors::StreamError;
    use crate::settings::MemorySettingsStore;
    use crate::vault::{FsVault, Vault};
    use tempfile::{tempdir, TempDir};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
    }

    fn context() -> (TempDir, StreamsContext<MemorySettingsStore>) {
        let dir = tempdir().unwrap();
        let ctx = StreamsContext::new(
            MemorySettingsStore::new(),
            FsVault::new(dir.path()),
            Box::new(NoEncryption),
            today(),
        )
        .unwrap();
        (dir, ctx)
    }

    fn exec(ctx: &mut StreamsContext<MemorySettingsStore>, command: Command) -> AppResult<String> {
        let mut out = Vec::new();
        run(&command, ctx, &MockEditor::default(), today(), &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn add(name: &str, folder: &str) -> Command {
        Command::Add {
            name: name.into(),
            folder: folder.into(),
            icon: None,
            ribbon: false,
            add_command: true,
            encrypt: false,
        }
    }

    #[test]
    fn test_first_added_stream_becomes_active() {
        let (_dir, mut ctx) = context();
        exec(&mut ctx, add("Work", "Work")).unwrap();
        exec(&mut ctx, add("Home", "Home")).unwrap();

        let listing = exec(&mut ctx, Command::List { json: false }).unwrap();
        let lines: Vec<&str> = listing.lines().collect();
        assert!(lines[0].starts_with("* 1. Work"));
        assert!(lines[1].starts_with("  2. Home"));
    }

    #[test]
    fn test_move_and_disable() {
        let (_dir, mut ctx) = context();
        exec(&mut ctx, add("Work", "Work")).unwrap();
        exec(&mut ctx, add("Home", "Home")).unwrap();

        let moved = exec(
            &mut ctx,
            Command::Move {
                stream: "home".into(),
                direction: Direction::Up,
            },
        )
        .unwrap();
        assert_eq!(moved.trim(), "Home is now at position 1");

        exec(&mut ctx, Command::Disable { stream: "Work".into() }).unwrap();
        let listing = exec(&mut ctx, Command::List { json: false }).unwrap();
        assert!(listing.contains("(disabled)"));

        assert!(matches!(
            exec(&mut ctx, Command::Open { stream: None, no_create: false }),
            Err(AppError::Stream(StreamError::Disabled(_)))
        ));
    }

    #[test]
    fn test_open_and_notes() {
        let (_dir, mut ctx) = context();
        exec(&mut ctx, add("Work", "Work")).unwrap();

        let missing = exec(
            &mut ctx,
            Command::Open {
                stream: None,
                no_create: true,
            },
        )
        .unwrap();
        assert_eq!(missing.trim(), "No note at Work/2024-01-15.md");

        let opened = exec(
            &mut ctx,
            Command::Open {
                stream: Some("Work".into()),
                no_create: false,
            },
        )
        .unwrap();
        assert_eq!(opened.trim(), "Opened Work/2024-01-15.md (created)");

        let notes = exec(
            &mut ctx,
            Command::Notes {
                stream: None,
                json: false,
            },
        )
        .unwrap();
        assert_eq!(notes.trim(), "2024-01-15  Work/2024-01-15.md  0 B");
    }

    #[test]
    fn test_calendar_month_option() {
        let (_dir, mut ctx) = context();
        exec(&mut ctx, add("Work", "Work")).unwrap();
        ctx.vault().create("Work/2024-02-03.md", b"hi").unwrap();

        let text = exec(
            &mut ctx,
            Command::Calendar {
                stream: None,
                month: Some("2024-02".into()),
                json: false,
            },
        )
        .unwrap();
        assert!(text.starts_with("February 2024"));
        assert!(text.contains(" 3•"));

        assert!(matches!(
            exec(
                &mut ctx,
                Command::Calendar {
                    stream: None,
                    month: Some("2024-13".into()),
                    json: false,
                },
            ),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_commands_listing_and_run() {
        let (_dir, mut ctx) = context();
        exec(&mut ctx, add("Work", "Work")).unwrap();
        let id = ctx.streams.find("Work").unwrap().id.clone();

        let listing = exec(&mut ctx, Command::Commands { run: None, json: false }).unwrap();
        assert!(listing.contains("previous-day"));
        assert!(listing.contains(&format!("open-today-{}", id)));

        let ran = exec(
            &mut ctx,
            Command::Commands {
                run: Some("next-day".into()),
                json: false,
            },
        )
        .unwrap();
        assert_eq!(ran.trim(), "2024-01-16");
    }

    #[test]
    fn test_settings_update() {
        let (_dir, mut ctx) = context();
        let output = exec(
            &mut ctx,
            Command::Settings {
                show_bar: Some(false),
                reuse_tab: None,
                debug_mode: Some(true),
                bar_style: None,
            },
        )
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["showStreamsBar"], false);
        assert_eq!(value["debugMode"], true);
        assert_eq!(value["barStyle"], "default");
        assert!(!ctx.streams.settings().show_streams_bar);
    }
}
