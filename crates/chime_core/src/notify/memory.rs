//! In-process notification sink.
//!
//! Keeps the pending set in a map keyed by occurrence identifier, mirroring
//! what a platform notification scheduler holds. Useful for embedders that
//! deliver notifications themselves and for tests.

use super::{NotificationSink, ScheduledNotification, SinkError};
use crate::schedule::identifier::OccurrenceId;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
pub struct InMemorySink {
    pending: Mutex<BTreeMap<OccurrenceId, ScheduledNotification>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending notifications ordered by identifier.
    pub fn pending(&self) -> Vec<ScheduledNotification> {
        self.state().values().cloned().collect()
    }

    pub fn get(&self, id: OccurrenceId) -> Option<ScheduledNotification> {
        self.state().get(&id).cloned()
    }

    pub fn is_scheduled(&self, id: OccurrenceId) -> bool {
        self.state().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.state().len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().is_empty()
    }

    // Map updates are single inserts/removes, so a poisoned lock still holds
    // a consistent map.
    fn state(&self) -> MutexGuard<'_, BTreeMap<OccurrenceId, ScheduledNotification>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl NotificationSink for InMemorySink {
    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), SinkError> {
        self.state().insert(notification.id, notification.clone());
        Ok(())
    }

    fn cancel(&self, id: OccurrenceId) -> Result<(), SinkError> {
        self.state().remove(&id);
        Ok(())
    }
}
