//! Notification sink boundary.
//!
//! # Responsibility
//! - Define the write-only capability the scheduler drives:
//!   schedule an occurrence, cancel an occurrence.
//! - Provide in-process and SQLite-backed sinks.
//!
//! # Invariants
//! - `schedule` on an already-scheduled identifier replaces it.
//! - `cancel` on an absent identifier is a no-op, never an error.
//! - Sinks own their retry/timeout policy; the scheduler never reads back.

use crate::schedule::identifier::OccurrenceId;
use crate::schedule::resolver::FireTime;
use chrono::DateTime;
use chrono_tz::Tz;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod memory;
pub mod sqlite;

pub use memory::InMemorySink;
pub use sqlite::SqliteNotificationSink;

/// One recurring occurrence as handed to a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledNotification {
    pub id: OccurrenceId,
    pub title: String,
    pub body: String,
    /// First delivery, in the scheduler's configured timezone.
    pub first_fire: DateTime<Tz>,
    /// Wall-clock time of every later delivery when `repeat_daily` is set.
    pub daily_at: FireTime,
    pub repeat_daily: bool,
}

/// Failure of a single schedule/cancel call.
#[derive(Debug)]
pub enum SinkError {
    /// Delivery refused by the platform, e.g. notifications not permitted.
    PermissionDenied(String),
    /// Sink temporarily unusable.
    Unavailable(String),
    Storage(rusqlite::Error),
    InvalidData(String),
}

impl Display for SinkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PermissionDenied(message) => write!(f, "notification permission denied: {message}"),
            Self::Unavailable(message) => write!(f, "notification sink unavailable: {message}"),
            Self::Storage(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid pending notification data: {message}"),
        }
    }
}

impl Error for SinkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::PermissionDenied(_) | Self::Unavailable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<rusqlite::Error> for SinkError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Storage(value)
    }
}

/// Capability to schedule and cancel OS-level notifications.
pub trait NotificationSink {
    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), SinkError>;
    fn cancel(&self, id: OccurrenceId) -> Result<(), SinkError>;
}

impl<S: NotificationSink + ?Sized> NotificationSink for &S {
    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), SinkError> {
        (**self).schedule(notification)
    }

    fn cancel(&self, id: OccurrenceId) -> Result<(), SinkError> {
        (**self).cancel(id)
    }
}

impl<S: NotificationSink + ?Sized> NotificationSink for Box<S> {
    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), SinkError> {
        (**self).schedule(notification)
    }

    fn cancel(&self, id: OccurrenceId) -> Result<(), SinkError> {
        (**self).cancel(id)
    }
}
