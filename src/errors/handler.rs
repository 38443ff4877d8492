//! Bounded history of failures that were logged instead of propagated.

use crate::constants::ERROR_HISTORY_CAPACITY;
use crate::errors::AppResult;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::{Mutex, MutexGuard};
use tracing::error;

/// One captured failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorRecord {
    /// What the caller was doing when the failure happened.
    pub context: String,
    /// The rendered error message.
    pub message: String,
    /// When the failure was captured.
    pub timestamp: DateTime<Utc>,
}

/// Collects failures from operations that log and return early.
///
/// Call sites that should not abort the surrounding flow (event handlers,
/// calendar refreshes, best-effort cleanup) route their errors through
/// [`ErrorLog::capture`]. Every failure is logged through `tracing` and the
/// most recent ones are kept for inspection.
///
/// ```
/// use streams::errors::{AppError, ErrorLog};
///
/// let log = ErrorLog::new();
/// let value: Option<u32> = log.capture("refresh calendar", Err(AppError::Note("boom".into())));
/// assert!(value.is_none());
/// assert_eq!(log.len(), 1);
/// assert_eq!(log.recent()[0].context, "refresh calendar");
/// ```
#[derive(Debug)]
pub struct ErrorLog {
    records: Mutex<VecDeque<ErrorRecord>>,
    capacity: usize,
}

impl ErrorLog {
    /// Creates a log holding the last [`ERROR_HISTORY_CAPACITY`] failures.
    pub fn new() -> Self {
        Self::with_capacity(ERROR_HISTORY_CAPACITY)
    }

    /// Creates a log holding at most `capacity` failures.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    /// Logs `err` and appends it to the history, evicting the oldest entry when full.
    pub fn record(&self, context: &str, err: &dyn Error) {
        error!(context = %context, error = %err, "Operation failed");

        if self.capacity == 0 {
            return;
        }

        let mut records = self.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(ErrorRecord {
            context: context.to_string(),
            message: err.to_string(),
            timestamp: Utc::now(),
        });
    }

    /// Unwraps `result`, recording the error and returning `None` on failure.
    pub fn capture<T>(&self, context: &str, result: AppResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.record(context, &err);
                None
            }
        }
    }

    /// Runs `f` and captures its failure.
    pub fn wrap<T, F>(&self, context: &str, f: F) -> Option<T>
    where
        F: FnOnce() -> AppResult<T>,
    {
        self.capture(context, f())
    }

    /// Returns the retained failures, oldest first.
    pub fn recent(&self) -> Vec<ErrorRecord> {
        self.lock().iter().cloned().collect()
    }

    /// Returns the most recent failure.
    pub fn last(&self) -> Option<ErrorRecord> {
        self.lock().back().cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<ErrorRecord>> {
        // A panicking handler must not make the history unusable.
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ErrorLog {
    fn default() -> Self {
        Self::new()
    }
}
