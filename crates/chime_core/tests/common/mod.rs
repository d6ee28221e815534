#![allow(dead_code)]

use chime_core::{InMemorySink, NotificationSink, OccurrenceId, ScheduledNotification, SinkError};
use chrono::{DateTime, TimeZone, Utc};
use std::cell::RefCell;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkCall {
    Schedule(OccurrenceId),
    Cancel(OccurrenceId),
}

/// Sink that records every call and keeps the resulting pending set.
#[derive(Default)]
pub struct RecordingSink {
    calls: RefCell<Vec<SinkCall>>,
    failing: HashSet<OccurrenceId>,
    pending: InMemorySink,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects schedule/cancel calls for the given identifiers.
    pub fn failing_on(ids: impl IntoIterator<Item = OccurrenceId>) -> Self {
        Self {
            failing: ids.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    pub fn scheduled_ids(&self) -> Vec<OccurrenceId> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                SinkCall::Schedule(id) => Some(*id),
                SinkCall::Cancel(_) => None,
            })
            .collect()
    }

    pub fn cancelled_ids(&self) -> Vec<OccurrenceId> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                SinkCall::Cancel(id) => Some(*id),
                SinkCall::Schedule(_) => None,
            })
            .collect()
    }

    pub fn pending(&self) -> Vec<ScheduledNotification> {
        self.pending.pending()
    }

    pub fn pending_ids(&self) -> Vec<OccurrenceId> {
        self.pending().iter().map(|n| n.id).collect()
    }
}

impl NotificationSink for RecordingSink {
    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), SinkError> {
        self.calls
            .borrow_mut()
            .push(SinkCall::Schedule(notification.id));
        if self.failing.contains(&notification.id) {
            return Err(SinkError::PermissionDenied("test denial".to_string()));
        }
        self.pending.schedule(notification)
    }

    fn cancel(&self, id: OccurrenceId) -> Result<(), SinkError> {
        self.calls.borrow_mut().push(SinkCall::Cancel(id));
        if self.failing.contains(&id) {
            return Err(SinkError::Unavailable("test outage".to_string()));
        }
        self.pending.cancel(id)
    }
}

pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("valid utc datetime")
}

pub fn local<Tz: TimeZone>(
    tz: &Tz,
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> DateTime<Tz> {
    tz.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .expect("unambiguous local datetime")
}
