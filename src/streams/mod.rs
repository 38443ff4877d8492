//! Stream list management.
//!
//! `StreamManager` owns the loaded [`Settings`] record. Every mutation
//! edits a copy, writes it through the [`SettingsStore`], and adopts it
//! only after the write succeeds. Broadcasts follow the adoption, so
//! views refresh after the change is durable.

use crate::errors::{AppResult, StreamError};
use crate::events::{EventBus, EventData, Topic};
use crate::settings::{Settings, SettingsStore, Stream};
use tracing::{debug, info, warn};

const SOURCE: &str = "stream-manager";

/// CRUD over the configured streams plus the active-stream pointer.
///
/// ```
/// use streams::events::EventBus;
/// use streams::settings::{MemorySettingsStore, Stream};
/// use streams::streams::StreamManager;
///
/// let mut manager = StreamManager::load(MemorySettingsStore::new(), EventBus::new())?;
/// let id = manager.add_stream(Stream::new("Work", "Journal/Work"))?.id.clone();
/// manager.set_active_stream(Some(&id))?;
/// assert_eq!(manager.active_stream()?.map(|s| s.name.as_str()), Some("Work"));
/// # Ok::<(), streams::AppError>(())
/// ```
#[derive(Debug)]
pub struct StreamManager<S: SettingsStore> {
    store: S,
    settings: Settings,
    bus: EventBus,
}

impl<S: SettingsStore> StreamManager<S> {
    /// Loads the settings record from `store`.
    pub fn load(store: S, bus: EventBus) -> AppResult<Self> {
        let settings = store.load()?;
        debug!(streams = settings.streams.len(), "Settings loaded");
        Ok(Self {
            store,
            settings,
            bus,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn streams(&self) -> &[Stream] {
        &self.settings.streams
    }

    pub fn enabled_streams(&self) -> impl Iterator<Item = &Stream> {
        self.settings.streams.iter().filter(|s| !s.disabled)
    }

    pub fn get(&self, id: &str) -> Option<&Stream> {
        self.settings.streams.iter().find(|s| s.id == id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.settings.streams.iter().position(|s| s.id == id)
    }

    /// Looks a stream up by exact id, then by case-insensitive name.
    pub fn find(&self, key: &str) -> AppResult<&Stream> {
        self.get(key)
            .or_else(|| {
                self.settings
                    .streams
                    .iter()
                    .find(|s| s.name.eq_ignore_ascii_case(key))
            })
            .ok_or_else(|| StreamError::NotFound(key.to_string()).into())
    }

    /// The raw active-stream pointer, which may be dangling.
    pub fn active_stream_id(&self) -> Option<&str> {
        self.settings.active_stream_id.as_deref()
    }

    /// The active stream.
    ///
    /// A pointer to a stream that no longer exists is cleared on read: the
    /// cleared record is persisted and `active-stream-changed` is broadcast
    /// with no id.
    pub fn active_stream(&mut self) -> AppResult<Option<&Stream>> {
        if let Some(id) = self.settings.active_stream_id.clone() {
            if self.get(&id).is_none() {
                warn!(stream_id = %id, "Active stream no longer exists, clearing it");
                let mut next = self.settings.clone();
                next.active_stream_id = None;
                self.commit(next)?;
                self.bus
                    .emit(Topic::ActiveStreamChanged, EventData::StreamId(None), SOURCE);
                return Ok(None);
            }
        }
        Ok(self
            .settings
            .active_stream_id
            .as_deref()
            .and_then(|id| self.settings.streams.iter().find(|s| s.id == id)))
    }

    /// Points the active stream at `id` (or clears it), persists and broadcasts.
    ///
    /// Unknown ids are stored as given; [`StreamManager::active_stream`]
    /// repairs them on the next read.
    pub fn set_active_stream(&mut self, id: Option<&str>) -> AppResult<()> {
        let mut next = self.settings.clone();
        next.active_stream_id = id.map(str::to_string);
        self.commit(next)?;
        info!(stream_id = ?id, "Active stream changed");
        self.bus.emit(
            Topic::ActiveStreamChanged,
            EventData::StreamId(id.map(str::to_string)),
            SOURCE,
        );
        Ok(())
    }

    /// Appends `stream` to the list.
    pub fn add_stream(&mut self, mut stream: Stream) -> AppResult<&Stream> {
        stream.name = stream.name.trim().to_string();
        if stream.name.is_empty() {
            return Err(StreamError::EmptyName.into());
        }
        if self.get(&stream.id).is_some() {
            return Err(StreamError::DuplicateId(stream.id).into());
        }

        info!(stream_id = %stream.id, name = %stream.name, "Adding stream");
        let mut next = self.settings.clone();
        next.streams.push(stream);
        self.commit(next)?;
        self.broadcast_streams();

        let last = self.settings.streams.len() - 1;
        Ok(&self.settings.streams[last])
    }

    /// Removes the stream with `id` and returns it.
    ///
    /// Removing the active stream also clears the active pointer and
    /// broadcasts `active-stream-changed` with no id.
    pub fn remove_stream(&mut self, id: &str) -> AppResult<Stream> {
        let index = self
            .position(id)
            .ok_or_else(|| StreamError::NotFound(id.to_string()))?;
        let mut next = self.settings.clone();
        let removed = next.streams.remove(index);
        let was_active = next.active_stream_id.as_deref() == Some(id);
        if was_active {
            next.active_stream_id = None;
        }

        self.commit(next)?;
        info!(stream_id = %id, name = %removed.name, "Removed stream");
        self.broadcast_streams();
        if was_active {
            self.bus
                .emit(Topic::ActiveStreamChanged, EventData::StreamId(None), SOURCE);
        }
        Ok(removed)
    }

    /// Swaps the stream at `index` with the one above it.
    ///
    /// Returns the stream's new index; moving the first stream up is a
    /// no-op that returns `0`. Moving the result back down restores the
    /// previous order.
    pub fn move_up(&mut self, index: usize) -> AppResult<usize> {
        self.check_index(index)?;
        if index == 0 {
            return Ok(0);
        }
        self.swap(index - 1, index)?;
        Ok(index - 1)
    }

    /// Swaps the stream at `index` with the one below it.
    ///
    /// Returns the stream's new index; moving the last stream down is a
    /// no-op.
    pub fn move_down(&mut self, index: usize) -> AppResult<usize> {
        self.check_index(index)?;
        if index + 1 == self.settings.streams.len() {
            return Ok(index);
        }
        self.swap(index, index + 1)?;
        Ok(index + 1)
    }

    /// Edits the stream with `id` in place. The id itself cannot change.
    pub fn update_stream<F>(&mut self, id: &str, edit: F) -> AppResult<&Stream>
    where
        F: FnOnce(&mut Stream),
    {
        let index = self
            .position(id)
            .ok_or_else(|| StreamError::NotFound(id.to_string()))?;

        let mut updated = self.settings.streams[index].clone();
        edit(&mut updated);
        updated.id = id.to_string();
        updated.name = updated.name.trim().to_string();
        if updated.name.is_empty() {
            return Err(StreamError::EmptyName.into());
        }

        let mut next = self.settings.clone();
        next.streams[index] = updated;
        self.commit(next)?;
        debug!(stream_id = %id, "Stream updated");
        self.broadcast_streams();
        Ok(&self.settings.streams[index])
    }

    /// Edits the UI toggles of the settings record.
    ///
    /// The stream list and the active pointer are owned by the dedicated
    /// operations above; changes to them made here are discarded.
    pub fn update_settings<F>(&mut self, edit: F) -> AppResult<()>
    where
        F: FnOnce(&mut Settings),
    {
        let mut next = self.settings.clone();
        edit(&mut next);
        next.streams = self.settings.streams.clone();
        next.active_stream_id = self.settings.active_stream_id.clone();

        self.commit(next)?;
        self.bus
            .emit(Topic::SettingsChanged, EventData::None, SOURCE);
        Ok(())
    }

    fn check_index(&self, index: usize) -> AppResult<()> {
        let len = self.settings.streams.len();
        if index >= len {
            return Err(StreamError::IndexOutOfRange { index, len }.into());
        }
        Ok(())
    }

    fn swap(&mut self, a: usize, b: usize) -> AppResult<()> {
        let mut next = self.settings.clone();
        next.streams.swap(a, b);
        self.commit(next)?;
        self.broadcast_streams();
        Ok(())
    }

    /// Saves `next`, then adopts it. A failed save leaves the current
    /// record untouched.
    fn commit(&mut self, next: Settings) -> AppResult<()> {
        self.store.save(&next)?;
        self.settings = next;
        Ok(())
    }

    fn broadcast_streams(&self) {
        let ids = self.settings.streams.iter().map(|s| s.id.clone()).collect();
        self.bus
            .emit(Topic::StreamsChanged, EventData::StreamIds(ids), SOURCE);
    }
}
