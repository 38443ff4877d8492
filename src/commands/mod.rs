//! Commands and ribbon entries derived from settings.
//!
//! The registrations are recomputed from [`Settings`] whenever they are
//! needed, so they always reflect the current stream list.

use crate::settings::Settings;
use serde::Serialize;

/// What running a command does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandAction {
    OpenToday(String),
    PreviousDay,
    NextDay,
    GoToToday,
    ToggleStreamsBar,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandSpec {
    pub id: String,
    pub name: String,
    pub action: CommandAction,
}

/// A one-click "today" shortcut for a stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RibbonEntry {
    pub stream_id: String,
    pub icon: String,
    pub tooltip: String,
}

pub fn open_today_command_id(stream_id: &str) -> String {
    format!("open-today-{}", stream_id)
}

/// An "open today" command for every enabled stream with `addCommand`.
pub fn stream_commands(settings: &Settings) -> Vec<CommandSpec> {
    settings
        .streams
        .iter()
        .filter(|s| !s.disabled && s.add_command)
        .map(|s| CommandSpec {
            id: open_today_command_id(&s.id),
            name: format!("Open today's note: {}", s.name),
            action: CommandAction::OpenToday(s.id.clone()),
        })
        .collect()
}

/// A ribbon entry for every enabled stream with `showTodayInRibbon`.
pub fn ribbon_entries(settings: &Settings) -> Vec<RibbonEntry> {
    settings
        .streams
        .iter()
        .filter(|s| !s.disabled && s.show_today_in_ribbon)
        .map(|s| RibbonEntry {
            stream_id: s.id.clone(),
            icon: s.icon.clone(),
            tooltip: format!("{}: today", s.name),
        })
        .collect()
}

pub fn global_commands() -> Vec<CommandSpec> {
    [
        ("previous-day", "Go to previous day", CommandAction::PreviousDay),
        ("next-day", "Go to next day", CommandAction::NextDay),
        ("go-to-today", "Go to today", CommandAction::GoToToday),
        (
            "toggle-streams-bar",
            "Toggle streams bar",
            CommandAction::ToggleStreamsBar,
        ),
    ]
    .into_iter()
    .map(|(id, name, action)| CommandSpec {
        id: id.to_string(),
        name: name.to_string(),
        action,
    })
    .collect()
}

/// Global commands followed by the per-stream ones.
pub fn all_commands(settings: &Settings) -> Vec<CommandSpec> {
    let mut commands = global_commands();
    commands.extend(stream_commands(settings));
    commands
}

pub fn find_command(settings: &Settings, id: &str) -> Option<CommandSpec> {
    all_commands(settings).into_iter().find(|c| c.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Stream;

    fn settings() -> Settings {
        let work = Stream {
            id: "work".into(),
            add_command: true,
            show_today_in_ribbon: true,
            ..Stream::new("Work", "Work")
        };
        let home = Stream {
            id: "home".into(),
            add_command: false,
            show_today_in_ribbon: true,
            icon: "house".into(),
            ..Stream::new("Home", "Home")
        };
        let old = Stream {
            id: "old".into(),
            add_command: true,
            show_today_in_ribbon: true,
            disabled: true,
            ..Stream::new("Old", "Old")
        };
        Settings {
            streams: vec![work, home, old],
            ..Settings::default()
        }
    }

    #[test]
    fn test_stream_commands_follow_flags() {
        let commands = stream_commands(&settings());
        assert_eq!(commands.len(), 1);
        assert_eq!(commands[0].id, "open-today-work");
        assert_eq!(commands[0].action, CommandAction::OpenToday("work".into()));
    }

    #[test]
    fn test_ribbon_skips_disabled_streams() {
        let entries = ribbon_entries(&settings());
        let ids: Vec<&str> = entries.iter().map(|e| e.stream_id.as_str()).collect();
        assert_eq!(ids, vec!["work", "home"]);
        assert_eq!(entries[1].icon, "house");
    }

    #[test]
    fn test_global_commands_always_present() {
        let commands = all_commands(&Settings::default());
        let ids: Vec<&str> = commands.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(
            ids,
            vec!["previous-day", "next-day", "go-to-today", "toggle-streams-bar"]
        );
    }

    #[test]
    fn test_find_command() {
        let s = settings();
        assert_eq!(
            find_command(&s, "next-day").map(|c| c.action),
            Some(CommandAction::NextDay)
        );
        assert!(find_command(&s, "open-today-old").is_none());
    }

    #[test]
    fn test_serializes_actions_in_kebab_case() {
        let json = serde_json::to_value(&stream_commands(&settings())[0]).unwrap();
        assert_eq!(json["action"]["open-today"], "work");
        let json = serde_json::to_value(&global_commands()[0]).unwrap();
        assert_eq!(json["action"], "previous-day");
    }
}
