//! Core logic for Chime, a daily recurring reminder scheduler.
//! This crate owns the scheduling invariants: occurrence identifiers,
//! timezone-correct fire instants, and store/sink reconciliation.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod notify;
pub mod repo;
pub mod schedule;
pub mod service;

pub use config::{ChimeConfig, ConfigError};
pub use logging::{default_log_level, init_from_config, init_logging, logging_status, LoggingError};
pub use model::reminder::{Reminder, ReminderId, ReminderValidationError};
pub use notify::{
    InMemorySink, NotificationSink, ScheduledNotification, SinkError, SqliteNotificationSink,
};
pub use repo::reminder_repo::{ReminderStore, SqliteReminderStore, StoreError, StoreResult};
pub use schedule::{
    decompose, identifier, next_fire, CancelReport, FireTime, OccurrenceId, RecurrenceScheduler,
    RescheduleReport, ScheduleError, ScheduleReport, SinkFailure, SLOT_CAPACITY,
};
pub use service::reminder_service::{
    CreatedReminder, ReminderService, ResyncReport, ServiceError, ServiceResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
