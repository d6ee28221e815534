//! Recurring notification scheduling engine.
//!
//! - `identifier`: occurrence identifier space per reminder.
//! - `resolver`: fractional hour to next timezone-correct fire instant.
//! - `scheduler`: create/update/delete reconciliation against a sink.

pub mod identifier;
pub mod resolver;
pub mod scheduler;

pub use identifier::{decompose, identifier, identifier_range, OccurrenceId, SLOT_CAPACITY};
pub use resolver::{next_fire, split_offset, FireTime, ResolveError, ResolvedFire};
pub use scheduler::{
    CancelReport, RecurrenceScheduler, RescheduleReport, ScheduleError, ScheduleReport,
    ScheduleResult, SinkFailure,
};
