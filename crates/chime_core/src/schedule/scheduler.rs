//! Recurrence scheduler: reconciles a reminder with the notification sink.
//!
//! # Responsibility
//! - Project a reminder's offsets onto concrete daily occurrences.
//! - Issue schedule/cancel calls for create, update and delete paths.
//!
//! # Invariants
//! - Stateless: the sink is never read back and no slot bookkeeping is kept.
//! - Precondition failures are reported before the first sink call.
//! - A failing sink call is logged and reported; the batch continues.
//! - Rescheduling cancels the whole identifier range, then schedules the
//!   current list. It is never a diff.

use crate::model::reminder::{first_invalid_offset, Reminder, ReminderId};
use crate::notify::{NotificationSink, ScheduledNotification, SinkError};
use crate::schedule::identifier::{identifier, OccurrenceId, SLOT_CAPACITY};
use crate::schedule::resolver::{next_fire, ResolveError};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Fatal precondition failures of a scheduling call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Reminder has not been persisted yet, so it has no identifier range.
    MissingIdentity,
    CapacityExceeded {
        reminder_id: ReminderId,
        count: usize,
        capacity: u32,
    },
    InvalidOffset {
        reminder_id: ReminderId,
        slot: usize,
        value: f64,
    },
    /// Id is negative or too large for its identifier range.
    IdentifierOutOfRange(ReminderId),
    Unresolvable {
        reminder_id: ReminderId,
        slot: usize,
        source: ResolveError,
    },
}

impl Display for ScheduleError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingIdentity => write!(f, "reminder has no assigned id"),
            Self::CapacityExceeded {
                reminder_id,
                count,
                capacity,
            } => write!(
                f,
                "reminder {reminder_id} has {count} time offsets; capacity is {capacity}"
            ),
            Self::InvalidOffset {
                reminder_id,
                slot,
                value,
            } => write!(
                f,
                "reminder {reminder_id} slot {slot}: time offset {value} is outside [0, 24)"
            ),
            Self::IdentifierOutOfRange(id) => {
                write!(f, "reminder id {id} has no valid notification identifier range")
            }
            Self::Unresolvable {
                reminder_id,
                slot,
                source,
            } => write!(f, "reminder {reminder_id} slot {slot}: {source}"),
        }
    }
}

impl Error for ScheduleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Unresolvable { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// One sink call that failed inside a batch.
#[derive(Debug)]
pub struct SinkFailure {
    pub occurrence: OccurrenceId,
    pub error: SinkError,
}

/// Outcome of a best-effort `schedule_all` batch.
#[derive(Debug)]
pub struct ScheduleReport {
    pub reminder_id: ReminderId,
    pub scheduled: Vec<ScheduledNotification>,
    pub failures: Vec<SinkFailure>,
}

impl ScheduleReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Outcome of a `cancel_all` sweep over the identifier range.
#[derive(Debug)]
pub struct CancelReport {
    pub reminder_id: ReminderId,
    pub attempted: u32,
    pub failures: Vec<SinkFailure>,
}

impl CancelReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug)]
pub struct RescheduleReport {
    pub cancel: CancelReport,
    pub schedule: ScheduleReport,
}

impl RescheduleReport {
    pub fn is_complete(&self) -> bool {
        self.cancel.is_complete() && self.schedule.is_complete()
    }
}

/// Drives a [`NotificationSink`] from reminder state in a fixed timezone.
pub struct RecurrenceScheduler<S: NotificationSink> {
    sink: S,
    timezone: Tz,
}

impl<S: NotificationSink> RecurrenceScheduler<S> {
    pub fn new(sink: S, timezone: Tz) -> Self {
        Self { sink, timezone }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Checks offset count and range without an identity.
    ///
    /// Lets callers reject a reminder before the store assigns it an id.
    pub fn check_offsets(&self, reminder: &Reminder) -> ScheduleResult<()> {
        let reminder_id = reminder.id.unwrap_or_default();
        check_times(reminder_id, &reminder.times)
    }

    /// Resolves every occurrence of `reminder` relative to `now`.
    ///
    /// Pure with respect to the sink; `schedule_all_at` issues exactly this
    /// plan.
    pub fn plan_at(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> ScheduleResult<Vec<ScheduledNotification>> {
        let reminder_id = require_identity(reminder)?;
        identifier(reminder_id, SLOT_CAPACITY - 1)
            .ok_or(ScheduleError::IdentifierOutOfRange(reminder_id))?;
        check_times(reminder_id, &reminder.times)?;

        let now = now.with_timezone(&self.timezone);
        reminder
            .times
            .iter()
            .enumerate()
            .map(|(slot, &offset)| -> ScheduleResult<ScheduledNotification> {
                let id = occurrence_id(reminder_id, slot)?;
                let resolved =
                    next_fire(offset, &now).map_err(|source| ScheduleError::Unresolvable {
                        reminder_id,
                        slot,
                        source,
                    })?;
                Ok(ScheduledNotification {
                    id,
                    title: reminder.title.clone(),
                    body: reminder.body.clone(),
                    first_fire: resolved.first_fire,
                    daily_at: resolved.daily_at,
                    repeat_daily: true,
                })
            })
            .collect()
    }

    pub fn schedule_all(&self, reminder: &Reminder) -> ScheduleResult<ScheduleReport> {
        self.schedule_all_at(reminder, Utc::now())
    }

    /// Schedules one daily repeating notification per offset.
    ///
    /// # Errors
    /// - `MissingIdentity`, `CapacityExceeded`, `InvalidOffset` before any
    ///   sink call is made.
    /// - Sink failures are not errors; they are listed in the report.
    pub fn schedule_all_at(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> ScheduleResult<ScheduleReport> {
        let started_at = Instant::now();
        let plan = self.log_rejection("schedule_all", reminder, self.plan_at(reminder, now))?;
        let reminder_id = require_identity(reminder)?;

        let report = self.issue(reminder_id, plan);
        info!(
            "event=schedule_all module=scheduler status={} reminder_id={} scheduled={} failed={} duration_ms={}",
            batch_status(report.is_complete()),
            reminder_id,
            report.scheduled.len(),
            report.failures.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    /// Cancels every identifier in the reminder's range.
    ///
    /// All `SLOT_CAPACITY` slots are cancelled, including ones that were
    /// never scheduled; the sink treats those as no-ops.
    pub fn cancel_all(&self, reminder: &Reminder) -> ScheduleResult<CancelReport> {
        let reminder_id = self.log_rejection("cancel_all", reminder, require_identity(reminder))?;
        self.cancel_reminder(reminder_id)
    }

    /// Same sweep as `cancel_all`, for callers holding only the id.
    pub fn cancel_reminder(&self, reminder_id: ReminderId) -> ScheduleResult<CancelReport> {
        let started_at = Instant::now();
        let report = self.cancel_range(reminder_id)?;
        info!(
            "event=cancel_all module=scheduler status={} reminder_id={} attempted={} failed={} duration_ms={}",
            batch_status(report.is_complete()),
            reminder_id,
            report.attempted,
            report.failures.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    pub fn reschedule_all(&self, reminder: &Reminder) -> ScheduleResult<RescheduleReport> {
        self.reschedule_all_at(reminder, Utc::now())
    }

    /// Cancels the whole identifier range, then schedules the current list.
    ///
    /// The new plan is resolved first, so an invalid reminder leaves the
    /// previously scheduled set untouched.
    pub fn reschedule_all_at(
        &self,
        reminder: &Reminder,
        now: DateTime<Utc>,
    ) -> ScheduleResult<RescheduleReport> {
        let started_at = Instant::now();
        let plan = self.log_rejection("reschedule_all", reminder, self.plan_at(reminder, now))?;
        let reminder_id = require_identity(reminder)?;

        let cancel = self.cancel_range(reminder_id)?;
        let schedule = self.issue(reminder_id, plan);
        let report = RescheduleReport { cancel, schedule };
        info!(
            "event=reschedule_all module=scheduler status={} reminder_id={} cancel_failed={} scheduled={} schedule_failed={} duration_ms={}",
            batch_status(report.is_complete()),
            reminder_id,
            report.cancel.failures.len(),
            report.schedule.scheduled.len(),
            report.schedule.failures.len(),
            started_at.elapsed().as_millis()
        );
        Ok(report)
    }

    fn issue(&self, reminder_id: ReminderId, plan: Vec<ScheduledNotification>) -> ScheduleReport {
        let mut report = ScheduleReport {
            reminder_id,
            scheduled: Vec::with_capacity(plan.len()),
            failures: Vec::new(),
        };

        for notification in plan {
            match self.sink.schedule(&notification) {
                Ok(()) => {
                    debug!(
                        "event=occurrence_schedule module=scheduler status=ok occurrence_id={} first_fire={} daily_at={}",
                        notification.id,
                        notification.first_fire.to_rfc3339(),
                        notification.daily_at
                    );
                    report.scheduled.push(notification);
                }
                Err(error) => {
                    warn!(
                        "event=occurrence_schedule module=scheduler status=error occurrence_id={} error={}",
                        notification.id, error
                    );
                    report.failures.push(SinkFailure {
                        occurrence: notification.id,
                        error,
                    });
                }
            }
        }

        report
    }

    fn cancel_range(&self, reminder_id: ReminderId) -> ScheduleResult<CancelReport> {
        let start = identifier(reminder_id, 0)
            .ok_or(ScheduleError::IdentifierOutOfRange(reminder_id))?;
        // Last slot must exist so the sweep never stops halfway.
        identifier(reminder_id, SLOT_CAPACITY - 1)
            .ok_or(ScheduleError::IdentifierOutOfRange(reminder_id))?;

        let mut failures = Vec::new();
        for occurrence in start..start + i64::from(SLOT_CAPACITY) {
            if let Err(error) = self.sink.cancel(occurrence) {
                warn!(
                    "event=occurrence_cancel module=scheduler status=error occurrence_id={} error={}",
                    occurrence, error
                );
                failures.push(SinkFailure { occurrence, error });
            }
        }

        Ok(CancelReport {
            reminder_id,
            attempted: SLOT_CAPACITY,
            failures,
        })
    }

    fn log_rejection<T>(
        &self,
        event: &'static str,
        reminder: &Reminder,
        result: ScheduleResult<T>,
    ) -> ScheduleResult<T> {
        if let Err(err) = &result {
            warn!(
                "event={event} module=scheduler status=rejected reminder_id={} error={}",
                reminder
                    .id
                    .map_or_else(|| "none".to_string(), |id| id.to_string()),
                err
            );
        }
        result
    }
}

fn require_identity(reminder: &Reminder) -> ScheduleResult<ReminderId> {
    reminder.id.ok_or(ScheduleError::MissingIdentity)
}

fn check_times(reminder_id: ReminderId, times: &[f64]) -> ScheduleResult<()> {
    if times.len() > SLOT_CAPACITY as usize {
        return Err(ScheduleError::CapacityExceeded {
            reminder_id,
            count: times.len(),
            capacity: SLOT_CAPACITY,
        });
    }
    if let Some((slot, value)) = first_invalid_offset(times) {
        return Err(ScheduleError::InvalidOffset {
            reminder_id,
            slot,
            value,
        });
    }
    Ok(())
}

fn occurrence_id(reminder_id: ReminderId, slot: usize) -> ScheduleResult<OccurrenceId> {
    u32::try_from(slot)
        .ok()
        .and_then(|slot| identifier(reminder_id, slot))
        .ok_or(ScheduleError::IdentifierOutOfRange(reminder_id))
}

fn batch_status(complete: bool) -> &'static str {
    if complete {
        "ok"
    } else {
        "partial"
    }
}
