//! Month grid and day strip views with per-day content indicators.
//!
//! Views are plain data built from a size lookup (usually
//! [`NoteService::note_size`](crate::notes::NoteService::note_size)) and
//! rendered as text. [`CalendarView`] listens on the bus and tracks whether
//! anything it shows has changed since the last render.

use crate::constants::{INDICATOR_MEDIUM_MAX_BYTES, INDICATOR_SMALL_MAX_BYTES, MONTH_FORMAT};
use crate::errors::{AppError, AppResult};
use crate::events::{EventBus, Subscription, Topic};
use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Dot indicator for how much a day's note contains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentIndicator {
    None,
    Small,
    Medium,
    Large,
}

impl ContentIndicator {
    /// Buckets a note's size in bytes; `None` means no note.
    ///
    /// ```
    /// use streams::calendar::ContentIndicator;
    ///
    /// assert_eq!(ContentIndicator::from_size(None), ContentIndicator::None);
    /// assert_eq!(ContentIndicator::from_size(Some(0)).dots(), 1);
    /// assert_eq!(ContentIndicator::from_size(Some(4999)).dots(), 2);
    /// assert_eq!(ContentIndicator::from_size(Some(5000)).dots(), 3);
    /// ```
    pub fn from_size(size: Option<u64>) -> Self {
        match size {
            None => ContentIndicator::None,
            Some(n) if n < INDICATOR_SMALL_MAX_BYTES => ContentIndicator::Small,
            Some(n) if n < INDICATOR_MEDIUM_MAX_BYTES => ContentIndicator::Medium,
            Some(_) => ContentIndicator::Large,
        }
    }

    pub fn dots(&self) -> usize {
        match self {
            ContentIndicator::None => 0,
            ContentIndicator::Small => 1,
            ContentIndicator::Medium => 2,
            ContentIndicator::Large => 3,
        }
    }

    pub fn symbol(&self) -> String {
        "•".repeat(self.dots())
    }
}

/// One day in a grid or strip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub is_selected: bool,
    pub indicator: ContentIndicator,
}

impl DayCell {
    fn new<F>(
        date: NaiveDate,
        in_month: bool,
        today: NaiveDate,
        selected: NaiveDate,
        note_size: &F,
    ) -> Self
    where
        F: Fn(NaiveDate) -> Option<u64>,
    {
        Self {
            date,
            in_month,
            is_today: date == today,
            is_selected: date == selected,
            indicator: ContentIndicator::from_size(note_size(date)),
        }
    }

    fn render(&self) -> String {
        let marker = if self.is_selected {
            '>'
        } else if self.is_today {
            '*'
        } else {
            ' '
        };
        format!("{}{:>2}{:<3}", marker, self.date.day(), self.indicator.symbol())
    }
}

/// A month laid out in Monday-first weeks.
///
/// Leading and trailing days from the neighbouring months fill the first
/// and last week and are marked `in_month: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MonthGrid {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<DayCell>>,
}

impl MonthGrid {
    /// # Errors
    ///
    /// Returns `AppError::Config` when `year`/`month` is not a valid month.
    pub fn build<F>(
        year: i32,
        month: u32,
        today: NaiveDate,
        selected: NaiveDate,
        note_size: F,
    ) -> AppResult<Self>
    where
        F: Fn(NaiveDate) -> Option<u64>,
    {
        let first = NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| AppError::Config(format!("Invalid month: {}-{:02}", year, month)))?;
        let offset = first.weekday().num_days_from_monday() as i64;
        let mut day = first - Duration::days(offset);

        let mut weeks = Vec::new();
        loop {
            let week: Vec<DayCell> = (0..7)
                .map(|i| {
                    let date = day + Duration::days(i);
                    let in_month = date.year() == year && date.month() == month;
                    DayCell::new(date, in_month, today, selected, &note_size)
                })
                .collect();
            day += Duration::days(7);
            weeks.push(week);
            if day.month() != month || day.year() != year {
                break;
            }
        }

        Ok(Self { year, month, weeks })
    }

    /// The grid for the month containing `date`.
    pub fn for_date<F>(date: NaiveDate, today: NaiveDate, note_size: F) -> AppResult<Self>
    where
        F: Fn(NaiveDate) -> Option<u64>,
    {
        Self::build(date.year(), date.month(), today, date, note_size)
    }

    /// `YYYY-MM` key of the month.
    pub fn key(&self) -> String {
        self.first_day()
            .map(|d| d.format(MONTH_FORMAT).to_string())
            .unwrap_or_default()
    }

    fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn days(&self) -> impl Iterator<Item = &DayCell> {
        self.weeks.iter().flatten().filter(|cell| cell.in_month)
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(first) = self.first_day() {
            out.push_str(&first.format("%B %Y").to_string());
            out.push('\n');
        }

        let header: Vec<String> = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .iter()
        .map(|w| format!(" {:<5}", &w.to_string()[..2]))
        .collect();
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        for week in &self.weeks {
            let cells: Vec<String> = week
                .iter()
                .map(|cell| {
                    if cell.in_month {
                        cell.render()
                    } else {
                        " ".repeat(6)
                    }
                })
                .collect();
            out.push_str(cells.join(" ").trim_end());
            out.push('\n');
        }
        out
    }
}

/// Days from `center - radius` to `center + radius`, used by the bar.
pub fn day_strip<F>(center: NaiveDate, radius: i64, today: NaiveDate, note_size: F) -> Vec<DayCell>
where
    F: Fn(NaiveDate) -> Option<u64>,
{
    let radius = radius.max(0);
    (-radius..=radius)
        .filter_map(|offset| center.checked_add_signed(Duration::days(offset)))
        .map(|date| DayCell::new(date, true, today, center, &note_size))
        .collect()
}

pub fn render_strip(cells: &[DayCell]) -> String {
    let names: Vec<String> = cells
        .iter()
        .map(|c| format!(" {:<5}", &c.date.weekday().to_string()[..2]))
        .collect();
    let days: Vec<String> = cells.iter().map(DayCell::render).collect();
    format!(
        "{}\n{}\n",
        names.join(" ").trim_end(),
        days.join(" ").trim_end()
    )
}

/// Tracks whether the calendar needs re-rendering.
///
/// Subscribes to every topic that can change what a calendar shows and
/// raises a dirty flag; the subscriptions are released on drop.
pub struct CalendarView {
    dirty: Arc<AtomicBool>,
    subscriptions: Vec<Subscription>,
}

impl CalendarView {
    pub const TOPICS: [Topic; 7] = [
        Topic::DateChanged,
        Topic::SelectedStreamChanged,
        Topic::ActiveStreamChanged,
        Topic::SettingsChanged,
        Topic::StreamsChanged,
        Topic::NoteCreated,
        Topic::NoteModified,
    ];

    /// Starts out dirty so the first render always happens.
    pub fn new(bus: &EventBus) -> Self {
        let dirty = Arc::new(AtomicBool::new(true));
        let subscriptions = Self::TOPICS
            .iter()
            .map(|&topic| {
                let flag = Arc::clone(&dirty);
                bus.subscribe(topic, move |event| {
                    trace!(topic = %event.topic, "Calendar marked dirty");
                    flag.store(true, Ordering::SeqCst);
                    Ok(())
                })
            })
            .collect();
        Self {
            dirty,
            subscriptions,
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Renders the month around `selected` and clears the dirty flag.
    pub fn render<F>(
        &self,
        selected: NaiveDate,
        today: NaiveDate,
        note_size: F,
    ) -> AppResult<String>
    where
        F: Fn(NaiveDate) -> Option<u64>,
    {
        let grid = MonthGrid::for_date(selected, today, note_size)?;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(grid.render())
    }

    /// Renders the bar strip around `selected` and clears the dirty flag.
    pub fn render_bar<F>(
        &self,
        selected: NaiveDate,
        radius: i64,
        today: NaiveDate,
        note_size: F,
    ) -> String
    where
        F: Fn(NaiveDate) -> Option<u64>,
    {
        let cells = day_strip(selected, radius, today, note_size);
        self.dirty.store(false, Ordering::SeqCst);
        render_strip(&cells)
    }
}

impl Drop for CalendarView {
    fn drop(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }
}
