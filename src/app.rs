//! The application context.
//!
//! [`StreamsContext`] owns one instance of every long-lived component (the
//! event bus, error log, date state, stream manager, vault and encryption
//! collaborator) and hands them to the operations that need them.

use crate::calendar::{day_strip, CalendarView, DayCell, MonthGrid};
use crate::commands::{find_command, CommandAction};
use crate::config::Config;
use crate::crypto::{AgeEncryption, Encryption, NoEncryption};
use crate::editor::Editor;
use crate::errors::{AppResult, ErrorLog, StreamError};
use crate::events::EventBus;
use crate::notes::{NoteService, OpenOutcome};
use crate::settings::{JsonSettingsStore, SettingsStore, Stream};
use crate::state::DateState;
use crate::streams::StreamManager;
use crate::vault::FsVault;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// What running a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Note(OpenOutcome),
    Date(NaiveDate),
    StreamsBar(bool),
}

/// Wiring of all components for one session.
pub struct StreamsContext<S: SettingsStore = JsonSettingsStore> {
    pub bus: EventBus,
    pub error_log: Arc<ErrorLog>,
    pub date: DateState,
    pub streams: StreamManager<S>,
    vault: FsVault,
    encryption: Box<dyn Encryption>,
}

impl StreamsContext<JsonSettingsStore> {
    /// Builds a context from `config`, creating the vault root if needed.
    ///
    /// The encryption collaborator is available only when a passphrase is
    /// configured.
    pub fn from_config(config: &Config, today: NaiveDate) -> AppResult<Self> {
        let vault = FsVault::new(&config.vault_dir);
        vault.ensure_root()?;

        let encryption: Box<dyn Encryption> = match &config.passphrase {
            Some(passphrase) => Box::new(AgeEncryption::new(passphrase.clone())),
            None => Box::new(NoEncryption),
        };
        debug!(
            encryption_available = encryption.is_available(),
            "Encryption collaborator configured"
        );

        let store = JsonSettingsStore::new(&config.settings_path);
        StreamsContext::new(store, vault, encryption, today)
    }
}

impl<S: SettingsStore> StreamsContext<S> {
    pub fn new(
        store: S,
        vault: FsVault,
        encryption: Box<dyn Encryption>,
        today: NaiveDate,
    ) -> AppResult<Self> {
        let error_log = Arc::new(ErrorLog::new());
        let bus = EventBus::new().with_error_log(Arc::clone(&error_log));
        let streams = StreamManager::load(store, bus.clone())?;
        let mut date = DateState::new(bus.clone(), today);
        date.set_selected_stream(streams.active_stream_id().map(str::to_string));

        Ok(Self {
            bus,
            error_log,
            date,
            streams,
            vault,
            encryption,
        })
    }

    pub fn vault(&self) -> &FsVault {
        &self.vault
    }

    pub fn encryption(&self) -> &dyn Encryption {
        self.encryption.as_ref()
    }

    pub fn notes(&self) -> NoteService<'_> {
        NoteService::new(&self.vault, self.encryption.as_ref(), self.bus.clone())
    }

    /// A calendar view listening on this context's bus.
    pub fn calendar_view(&self) -> CalendarView {
        CalendarView::new(&self.bus)
    }

    /// The stream named by `key` (id or name), or the active stream.
    ///
    /// # Errors
    ///
    /// `StreamError::NotFound` when nothing matches or there is no active
    /// stream, `StreamError::Disabled` when the stream is disabled.
    pub fn resolve_stream(&mut self, key: Option<&str>) -> AppResult<Stream> {
        let stream = match key {
            Some(key) => self.streams.find(key)?.clone(),
            None => self
                .streams
                .active_stream()?
                .cloned()
                .ok_or_else(|| StreamError::NotFound("no active stream".to_string()))?,
        };
        if stream.disabled {
            return Err(StreamError::Disabled(stream.name).into());
        }
        Ok(stream)
    }

    /// Opens the note for the currently viewed date.
    pub fn open_note(
        &mut self,
        key: Option<&str>,
        editor: &dyn Editor,
        create_missing: bool,
    ) -> AppResult<OpenOutcome> {
        let stream = self.resolve_stream(key)?;
        self.date.set_selected_stream(Some(stream.id.clone()));
        let date = self.date.current_date();
        info!(stream = %stream.name, date = %self.date.current_viewed_date(), "Opening note");
        self.notes().open(&stream, date, editor, create_missing)
    }

    /// Month grid for the stream around the viewed date.
    pub fn month_grid(&mut self, key: Option<&str>, today: NaiveDate) -> AppResult<MonthGrid> {
        let stream = self.resolve_stream(key)?;
        let notes = self.notes();
        MonthGrid::for_date(self.date.current_date(), today, |d| {
            notes.note_size(&stream, d)
        })
    }

    /// Bar strip for the stream around the viewed date.
    pub fn day_strip(
        &mut self,
        key: Option<&str>,
        radius: i64,
        today: NaiveDate,
    ) -> AppResult<Vec<DayCell>> {
        let stream = self.resolve_stream(key)?;
        let notes = self.notes();
        Ok(day_strip(self.date.current_date(), radius, today, |d| {
            notes.note_size(&stream, d)
        }))
    }

    /// Runs the registered command `id`.
    pub fn run_command(
        &mut self,
        id: &str,
        editor: &dyn Editor,
        today: NaiveDate,
    ) -> AppResult<CommandOutcome> {
        let command = find_command(self.streams.settings(), id)
            .ok_or_else(|| StreamError::NotFound(format!("command '{}'", id)))?;
        debug!(command = %command.id, "Running command");

        match command.action {
            CommandAction::OpenToday(stream_id) => {
                self.date.go_to_today(today);
                let outcome = self.open_note(Some(&stream_id), editor, true)?;
                Ok(CommandOutcome::Note(outcome))
            }
            CommandAction::PreviousDay => Ok(CommandOutcome::Date(self.date.navigate_days(-1))),
            CommandAction::NextDay => Ok(CommandOutcome::Date(self.date.navigate_days(1))),
            CommandAction::GoToToday => {
                self.date.go_to_today(today);
                Ok(CommandOutcome::Date(today))
            }
            CommandAction::ToggleStreamsBar => {
                self.streams
                    .update_settings(|s| s.show_streams_bar = !s.show_streams_bar)?;
                Ok(CommandOutcome::StreamsBar(
                    self.streams.settings().show_streams_bar,
                ))
            }
        }
    }
}
