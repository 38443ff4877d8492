//! Currently viewed date and selected stream.
//!
//! `DateState` is the one place that knows which day the calendar, the bar
//! and the "open" actions are looking at. Every change is broadcast on the
//! event bus so views can refresh.

use crate::constants::{DATE_FORMAT_ISO, NAVIGATION_DEBOUNCE_MS};
use crate::events::{EventBus, EventData, Topic};
use chrono::{Duration, Months, NaiveDate};
use serde::Serialize;
use std::time::{Duration as StdDuration, Instant};
use tracing::debug;

const SOURCE: &str = "date-state";

/// Snapshot of the date state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateSnapshot {
    pub current_date: NaiveDate,
    /// `current_date` rendered as `YYYY-MM-DD`.
    pub current_viewed_date: String,
    pub is_navigating: bool,
    pub selected_stream: Option<String>,
}

/// Holds the viewed date and broadcasts changes.
///
/// The `is_navigating` hint is a deadline rather than a timer: it reads as
/// `true` until [`NAVIGATION_DEBOUNCE_MS`] after the most recent change, so
/// a burst of navigation keeps it raised until the burst ends.
#[derive(Debug)]
pub struct DateState {
    bus: EventBus,
    current_date: NaiveDate,
    current_viewed_date: String,
    selected_stream: Option<String>,
    navigating_until: Option<Instant>,
    debounce: StdDuration,
}

impl DateState {
    /// Starts at `today` with no selected stream.
    pub fn new(bus: EventBus, today: NaiveDate) -> Self {
        Self {
            bus,
            current_date: today,
            current_viewed_date: format_date(today),
            selected_stream: None,
            navigating_until: None,
            debounce: StdDuration::from_millis(NAVIGATION_DEBOUNCE_MS),
        }
    }

    pub fn current_date(&self) -> NaiveDate {
        self.current_date
    }

    pub fn current_viewed_date(&self) -> &str {
        &self.current_viewed_date
    }

    pub fn selected_stream(&self) -> Option<&str> {
        self.selected_stream.as_deref()
    }

    pub fn is_navigating(&self) -> bool {
        self.navigating_until
            .is_some_and(|deadline| Instant::now() < deadline)
    }

    pub fn snapshot(&self) -> DateSnapshot {
        DateSnapshot {
            current_date: self.current_date,
            current_viewed_date: self.current_viewed_date.clone(),
            is_navigating: self.is_navigating(),
            selected_stream: self.selected_stream.clone(),
        }
    }

    /// Moves to `date` and broadcasts `date-changed`.
    ///
    /// Setting the date that is already current still broadcasts, so views
    /// can use it as a refresh request.
    pub fn set_current_date(&mut self, date: NaiveDate) {
        self.current_date = date;
        self.current_viewed_date = format_date(date);
        self.navigating_until = Some(Instant::now() + self.debounce);
        debug!(date = %self.current_viewed_date, "Viewed date changed");

        self.bus.emit(
            Topic::DateChanged,
            EventData::Date {
                date,
                viewed: self.current_viewed_date.clone(),
            },
            SOURCE,
        );
    }

    /// Moves by `days` (negative goes back). Out-of-range results are ignored.
    pub fn navigate_days(&mut self, days: i64) -> NaiveDate {
        if let Some(date) = Duration::try_days(days)
            .and_then(|delta| self.current_date.checked_add_signed(delta))
        {
            self.set_current_date(date);
        }
        self.current_date
    }

    /// Moves by whole months, clamping the day to the target month's length.
    pub fn navigate_months(&mut self, months: i32) -> NaiveDate {
        let delta = Months::new(months.unsigned_abs());
        let target = if months >= 0 {
            self.current_date.checked_add_months(delta)
        } else {
            self.current_date.checked_sub_months(delta)
        };
        if let Some(date) = target {
            self.set_current_date(date);
        }
        self.current_date
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.set_current_date(today);
    }

    /// Selects the stream the views display and broadcasts the change.
    pub fn set_selected_stream(&mut self, stream_id: Option<String>) {
        if self.selected_stream == stream_id {
            return;
        }
        self.selected_stream = stream_id.clone();
        self.bus.emit(
            Topic::SelectedStreamChanged,
            EventData::StreamId(stream_id),
            SOURCE,
        );
    }

    #[cfg(test)]
    fn with_debounce(mut self, debounce: StdDuration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Renders a date the way note file names and the viewed-date string use it.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT_ISO).to_string()
}
