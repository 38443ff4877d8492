//! Publish/subscribe channel between the stream logic and its views.
//!
//! Every emitted event is recorded in a bounded history and delivered
//! synchronously to the subscribers of its topic, in subscription order.
//! A failing subscriber is logged and skipped; it never aborts the emit.

use crate::constants::EVENT_HISTORY_CAPACITY;
use crate::errors::{AppError, AppResult, ErrorLog};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::{error, trace};

/// Named channels on the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Topic {
    /// The viewed date changed.
    DateChanged,
    /// The stream selected in the date state changed.
    SelectedStreamChanged,
    /// The persisted active stream changed (or was cleared).
    ActiveStreamChanged,
    /// Streams were added, removed, reordered or edited.
    StreamsChanged,
    /// Any other settings field changed.
    SettingsChanged,
    /// A note file was created.
    NoteCreated,
    /// A note file was written.
    NoteModified,
}

impl Topic {
    pub const ALL: [Topic; 7] = [
        Topic::DateChanged,
        Topic::SelectedStreamChanged,
        Topic::ActiveStreamChanged,
        Topic::StreamsChanged,
        Topic::SettingsChanged,
        Topic::NoteCreated,
        Topic::NoteModified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::DateChanged => "date-changed",
            Topic::SelectedStreamChanged => "selected-stream-changed",
            Topic::ActiveStreamChanged => "active-stream-changed",
            Topic::StreamsChanged => "streams-changed",
            Topic::SettingsChanged => "settings-changed",
            Topic::NoteCreated => "note-created",
            Topic::NoteModified => "note-modified",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Topic {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .iter()
            .copied()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| AppError::Config(format!("Unknown event topic: {}", s)))
    }
}

/// Payload carried by an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum EventData {
    None,
    /// A date together with its `YYYY-MM-DD` rendering.
    Date { date: NaiveDate, viewed: String },
    /// A stream id, or `None` when the stream was cleared.
    StreamId(Option<String>),
    /// The ordered ids of all streams.
    StreamIds(Vec<String>),
    /// A vault-relative note path.
    Path(String),
}

/// One entry in the bus history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Event {
    pub topic: Topic,
    pub data: EventData,
    pub timestamp: DateTime<Utc>,
    /// Component that emitted the event.
    pub source: String,
}

type Handler = Arc<dyn Fn(&Event) -> AppResult<()> + Send + Sync>;

struct Subscriber {
    id: u64,
    topic: Topic,
    handler: Handler,
}

struct BusState {
    subscribers: Vec<Subscriber>,
    history: VecDeque<Event>,
    capacity: usize,
    next_id: u64,
}

/// Process-wide event bus. Cloning yields another handle to the same bus.
///
/// ```
/// use streams::events::{EventBus, EventData, Topic};
/// use std::sync::{Arc, Mutex};
///
/// let bus = EventBus::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
/// let subscription = bus.subscribe(Topic::ActiveStreamChanged, move |event| {
///     sink.lock().unwrap().push(event.data.clone());
///     Ok(())
/// });
///
/// bus.emit(Topic::ActiveStreamChanged, EventData::StreamId(None), "docs");
/// subscription.unsubscribe();
/// bus.emit(Topic::ActiveStreamChanged, EventData::StreamId(None), "docs");
///
/// assert_eq!(seen.lock().unwrap().len(), 1);
/// assert_eq!(bus.history().len(), 2);
/// ```
#[derive(Clone)]
pub struct EventBus {
    state: Arc<Mutex<BusState>>,
    error_log: Option<Arc<ErrorLog>>,
}

impl EventBus {
    /// Creates a bus retaining the last [`EVENT_HISTORY_CAPACITY`] events.
    pub fn new() -> Self {
        Self::with_capacity(EVENT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(BusState {
                subscribers: Vec::new(),
                history: VecDeque::with_capacity(capacity),
                capacity,
                next_id: 0,
            })),
            error_log: None,
        }
    }

    /// Routes handler failures into `log` in addition to tracing output.
    pub fn with_error_log(mut self, log: Arc<ErrorLog>) -> Self {
        self.error_log = Some(log);
        self
    }

    /// Registers `handler` for `topic`.
    ///
    /// Handlers run on the emitting thread and may themselves emit or
    /// subscribe; the bus holds no lock while they run.
    pub fn subscribe<F>(&self, topic: Topic, handler: F) -> Subscription
    where
        F: Fn(&Event) -> AppResult<()> + Send + Sync + 'static,
    {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        state.subscribers.push(Subscriber {
            id,
            topic,
            handler: Arc::new(handler),
        });
        trace!(topic = %topic, subscriber = id, "Subscribed");

        Subscription {
            state: Arc::downgrade(&self.state),
            id,
            topic,
        }
    }

    /// Records the event and delivers it to the current subscribers of `topic`.
    ///
    /// Returns the number of handlers that completed successfully.
    pub fn emit(&self, topic: Topic, data: EventData, source: &str) -> usize {
        let event = Event {
            topic,
            data,
            timestamp: Utc::now(),
            source: source.to_string(),
        };
        trace!(topic = %topic, source = %source, "Emitting event");

        let handlers: Vec<(u64, Handler)> = {
            let mut state = self.lock();
            if state.capacity > 0 {
                if state.history.len() == state.capacity {
                    state.history.pop_front();
                }
                state.history.push_back(event.clone());
            }
            state
                .subscribers
                .iter()
                .filter(|s| s.topic == topic)
                .map(|s| (s.id, Arc::clone(&s.handler)))
                .collect()
        };

        let mut delivered = 0;
        for (id, handler) in handlers {
            match panic::catch_unwind(AssertUnwindSafe(|| handler(&event))) {
                Ok(Ok(())) => delivered += 1,
                Ok(Err(err)) => self.report(&event, id, err),
                Err(payload) => {
                    let message = panic_message(payload.as_ref());
                    self.report(
                        &event,
                        id,
                        AppError::Config(format!("handler panicked: {}", message)),
                    );
                }
            }
        }
        delivered
    }

    /// All retained events, oldest first.
    pub fn history(&self) -> Vec<Event> {
        self.lock().history.iter().cloned().collect()
    }

    /// Retained events for one topic, oldest first.
    pub fn history_for(&self, topic: Topic) -> Vec<Event> {
        self.lock()
            .history
            .iter()
            .filter(|e| e.topic == topic)
            .cloned()
            .collect()
    }

    pub fn clear_history(&self) {
        self.lock().history.clear();
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|s| s.topic == topic)
            .count()
    }

    fn report(&self, event: &Event, subscriber: u64, err: AppError) {
        match &self.error_log {
            Some(log) => log.record(&format!("event handler for {}", event.topic), &err),
            None => error!(
                topic = %event.topic,
                source = %event.source,
                subscriber,
                error = %err,
                "Event handler failed"
            ),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BusState> {
        lock_state(&self.state)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("EventBus")
            .field("subscribers", &state.subscribers.len())
            .field("history", &state.history.len())
            .field("capacity", &state.capacity)
            .finish()
    }
}

/// Handle returned by [`EventBus::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`Subscription::unsubscribe`] to remove it.
#[derive(Debug)]
pub struct Subscription {
    state: Weak<Mutex<BusState>>,
    id: u64,
    topic: Topic,
}

impl Subscription {
    pub fn topic(&self) -> Topic {
        self.topic
    }

    /// Removes the handler. Returns `false` if the bus is gone or the
    /// handler was already removed.
    pub fn unsubscribe(self) -> bool {
        let Some(state) = self.state.upgrade() else {
            return false;
        };
        let mut state = lock_state(&state);
        let before = state.subscribers.len();
        state.subscribers.retain(|s| s.id != self.id);
        before != state.subscribers.len()
    }
}

fn lock_state(state: &Mutex<BusState>) -> MutexGuard<'_, BusState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn recorder(
        bus: &EventBus,
        topic: Topic,
        label: &'static str,
        out: &Arc<Mutex<Vec<&'static str>>>,
    ) -> Subscription {
        let out = Arc::clone(out);
        bus.subscribe(topic, move |_| {
            out.lock().unwrap().push(label);
            Ok(())
        })
    }

    #[test]
    fn test_emit_without_subscribers_is_recorded() {
        let bus = EventBus::new();
        let delivered = bus.emit(Topic::SettingsChanged, EventData::None, "test");

        assert_eq!(delivered, 0);
        let history = bus.history();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].topic, Topic::SettingsChanged);
        assert_eq!(history[0].source, "test");
    }

    #[test]
    fn test_handlers_fire_in_subscription_order() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let _a = recorder(&bus, Topic::DateChanged, "first", &order);
        let _b = recorder(&bus, Topic::DateChanged, "second", &order);
        let _c = recorder(&bus, Topic::StreamsChanged, "other-topic", &order);

        bus.emit(Topic::DateChanged, EventData::None, "test");

        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_failing_handler_does_not_stop_delivery() {
        let bus = EventBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));
        let _failing = bus.subscribe(Topic::NoteCreated, |_| {
            Err(AppError::Note("handler failure".to_string()))
        });
        let _panicking = bus.subscribe(Topic::NoteCreated, |_| panic!("boom"));
        let _ok = recorder(&bus, Topic::NoteCreated, "ok", &order);

        let delivered = bus.emit(Topic::NoteCreated, EventData::Path("a.md".into()), "test");

        assert_eq!(delivered, 1);
        assert_eq!(*order.lock().unwrap(), vec!["ok"]);
    }

    #[test]
    fn test_handler_failures_reach_error_log() {
        let log = Arc::new(ErrorLog::new());
        let bus = EventBus::new().with_error_log(Arc::clone(&log));
        let _failing = bus.subscribe(Topic::NoteModified, |_| {
            Err(AppError::Note("disk full".to_string()))
        });

        bus.emit(Topic::NoteModified, EventData::None, "test");

        let last = log.last().expect("failure recorded");
        assert_eq!(last.context, "event handler for note-modified");
        assert!(last.message.contains("disk full"));
    }

    #[test]
    fn test_unsubscribe_removes_handler() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let subscription = bus.subscribe(Topic::DateChanged, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        bus.emit(Topic::DateChanged, EventData::None, "test");
        assert!(subscription.unsubscribe());
        bus.emit(Topic::DateChanged, EventData::None, "test");

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(bus.subscriber_count(Topic::DateChanged), 0);
    }

    #[test]
    fn test_unsubscribe_after_bus_dropped() {
        let bus = EventBus::new();
        let subscription = bus.subscribe(Topic::DateChanged, |_| Ok(()));
        drop(bus);
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_history_is_a_ring_buffer() {
        let bus = EventBus::with_capacity(3);
        for i in 0..5 {
            bus.emit(Topic::NoteCreated, EventData::Path(format!("{}.md", i)), "test");
        }

        let paths: Vec<EventData> = bus.history().into_iter().map(|e| e.data).collect();
        assert_eq!(
            paths,
            vec![
                EventData::Path("2.md".into()),
                EventData::Path("3.md".into()),
                EventData::Path("4.md".into()),
            ]
        );
    }

    #[test]
    fn test_default_capacity_is_one_hundred() {
        let bus = EventBus::new();
        for _ in 0..150 {
            bus.emit(Topic::SettingsChanged, EventData::None, "test");
        }
        assert_eq!(bus.history().len(), 100);
    }

    #[test]
    fn test_handler_may_emit_reentrantly() {
        let bus = EventBus::new();
        let inner_bus = bus.clone();
        let _relay = bus.subscribe(Topic::ActiveStreamChanged, move |_| {
            inner_bus.emit(Topic::SettingsChanged, EventData::None, "relay");
            Ok(())
        });

        bus.emit(Topic::ActiveStreamChanged, EventData::StreamId(None), "test");

        assert_eq!(bus.history_for(Topic::SettingsChanged).len(), 1);
        assert_eq!(bus.history().len(), 2);
    }

    #[test]
    fn test_topic_round_trips_through_strings() {
        for topic in Topic::ALL {
            assert_eq!(topic.as_str().parse::<Topic>().unwrap(), topic);
        }
        assert!("no-such-topic".parse::<Topic>().is_err());
    }
}
