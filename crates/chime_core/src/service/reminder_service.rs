//! Reminder use-case service.
//!
//! # Responsibility
//! - Compose the reminder store (source of truth) with the recurrence
//!   scheduler (derived projection) for create/update/delete.
//! - Rebuild the whole scheduled set from the store on demand.
//!
//! # Invariants
//! - Offsets are checked before the store is written, so no row exists for
//!   a reminder the scheduler would refuse.
//! - Create: store assigns id, then `schedule_all`.
//! - Update: store write, then `reschedule_all`.
//! - Delete: `cancel_all`, then store removal.
//! - Store and sink writes are not atomic together; a sink failure never
//!   rolls back the store.

use crate::model::reminder::{Reminder, ReminderId};
use crate::notify::NotificationSink;
use crate::repo::reminder_repo::{ReminderStore, StoreError};
use crate::schedule::scheduler::{
    CancelReport, RecurrenceScheduler, RescheduleReport, ScheduleError, ScheduleReport,
};
use chrono::{DateTime, Utc};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug)]
pub enum ServiceError {
    Store(StoreError),
    Schedule(ScheduleError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::Schedule(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::Schedule(err) => Some(err),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

impl From<ScheduleError> for ServiceError {
    fn from(value: ScheduleError) -> Self {
        Self::Schedule(value)
    }
}

/// Result of creating a reminder: the persisted record and its batch.
#[derive(Debug)]
pub struct CreatedReminder {
    pub reminder: Reminder,
    pub schedule: ScheduleReport,
}

/// Result of rebuilding every reminder's occurrences from the store.
#[derive(Debug, Default)]
pub struct ResyncReport {
    pub rescheduled: Vec<RescheduleReport>,
    pub rejected: Vec<(ReminderId, ScheduleError)>,
}

impl ResyncReport {
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty() && self.rescheduled.iter().all(RescheduleReport::is_complete)
    }
}

/// Reminder use cases over an explicit store and scheduler.
pub struct ReminderService<R: ReminderStore, S: NotificationSink> {
    store: R,
    scheduler: RecurrenceScheduler<S>,
}

impl<R: ReminderStore, S: NotificationSink> ReminderService<R, S> {
    pub fn new(store: R, scheduler: RecurrenceScheduler<S>) -> Self {
        Self { store, scheduler }
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    pub fn scheduler(&self) -> &RecurrenceScheduler<S> {
        &self.scheduler
    }

    pub fn create(&self, reminder: Reminder) -> ServiceResult<CreatedReminder> {
        self.create_at(reminder, Utc::now())
    }

    /// Persists a new reminder and schedules its occurrences.
    ///
    /// # Errors
    /// - `Schedule(CapacityExceeded | InvalidOffset)` before anything is
    ///   written.
    /// - `Store(_)` for validation or persistence failures; nothing is
    ///   scheduled then.
    pub fn create_at(
        &self,
        reminder: Reminder,
        now: DateTime<Utc>,
    ) -> ServiceResult<CreatedReminder> {
        if let Some(id) = reminder.id {
            return Err(StoreError::IdentityAlreadyAssigned(id).into());
        }
        self.scheduler.check_offsets(&reminder)?;

        let id = self.store.insert(&reminder)?;
        let reminder = reminder.with_id(id);
        let schedule = self.scheduler.schedule_all_at(&reminder, now)?;

        info!(
            "event=reminder_create module=service status=ok reminder_id={} slots={} sink_failures={}",
            id,
            reminder.times.len(),
            schedule.failures.len()
        );
        Ok(CreatedReminder { reminder, schedule })
    }

    pub fn update(&self, reminder: &Reminder) -> ServiceResult<RescheduleReport> {
        self.update_at(reminder, Utc::now())
    }

    /// Persists new title/body/offsets and rebuilds the occurrence set.
    ///
    /// Unknown ids fail with `Store(NotFound)` before the sink is touched.
    pub fn update_at(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> ServiceResult<RescheduleReport> {
        let id = reminder.id.ok_or(ScheduleError::MissingIdentity)?;
        self.scheduler.check_offsets(reminder)?;

        self.store.update(reminder)?;
        let report = self.scheduler.reschedule_all_at(reminder, now)?;

        info!(
            "event=reminder_update module=service status=ok reminder_id={} slots={} complete={}",
            id,
            reminder.times.len(),
            report.is_complete()
        );
        Ok(report)
    }

    /// Cancels every occurrence of `id`, then removes the reminder.
    ///
    /// Cancellation runs even for unknown ids; the store then reports
    /// `NotFound`.
    pub fn delete(&self, id: ReminderId) -> ServiceResult<CancelReport> {
        let report = self.scheduler.cancel_reminder(id)?;
        self.store.remove(id)?;

        info!(
            "event=reminder_delete module=service status=ok reminder_id={} cancel_failures={}",
            id,
            report.failures.len()
        );
        Ok(report)
    }

    pub fn get(&self, id: ReminderId) -> ServiceResult<Option<Reminder>> {
        Ok(self.store.get(id)?)
    }

    pub fn list(&self) -> ServiceResult<Vec<Reminder>> {
        Ok(self.store.list_all()?)
    }

    pub fn resync_all(&self) -> ServiceResult<ResyncReport> {
        self.resync_all_at(Utc::now())
    }

    /// Reschedules every stored reminder.
    ///
    /// Used at startup and after the configured timezone changes. A reminder
    /// the scheduler rejects is reported and skipped; the rest continue.
    pub fn resync_all_at(&self, now: DateTime<Utc>) -> ServiceResult<ResyncReport> {
        let reminders = self.store.list_all()?;
        let mut report = ResyncReport::default();

        for reminder in &reminders {
            match self.scheduler.reschedule_all_at(reminder, now) {
                Ok(rescheduled) => report.rescheduled.push(rescheduled),
                Err(err) => {
                    let id = reminder.id.unwrap_or_default();
                    warn!(
                        "event=reminder_resync module=service status=error reminder_id={} error={}",
                        id, err
                    );
                    report.rejected.push((id, err));
                }
            }
        }

        info!(
            "event=reminder_resync module=service status={} reminders={} rejected={}",
            if report.is_complete() { "ok" } else { "partial" },
            reminders.len(),
            report.rejected.len()
        );
        Ok(report)
    }
}
