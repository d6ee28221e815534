mod common;

use chime_core::db::open_db_in_memory;
use chime_core::{
    FireTime, InMemorySink, NotificationSink, ScheduledNotification, SqliteNotificationSink,
};
use chrono::{DateTime, Timelike, Utc};
use chrono_tz::America::Chicago;
use chrono_tz::Asia::Kolkata;
use chrono_tz::Tz;
use common::{local, utc};

fn notification(id: i64, title: &str, first_fire: DateTime<Tz>) -> ScheduledNotification {
    ScheduledNotification {
        id,
        title: title.to_string(),
        body: "body".to_string(),
        daily_at: FireTime {
            hour: first_fire.hour(),
            minute: first_fire.minute(),
        },
        first_fire,
        repeat_daily: true,
    }
}

#[test]
fn sqlite_sink_round_trips_pending_notifications() {
    let conn = open_db_in_memory().unwrap();
    let sink = SqliteNotificationSink::new(&conn);
    let chicago = notification(700, "Walk", local(&Chicago, 2024, 1, 1, 22, 30));
    let kolkata = notification(701, "Tea", local(&Kolkata, 2024, 1, 2, 16, 45));

    sink.schedule(&kolkata).unwrap();
    sink.schedule(&chicago).unwrap();

    assert_eq!(sink.pending().unwrap(), vec![chicago.clone(), kolkata]);
    assert_eq!(sink.get(700).unwrap(), Some(chicago));
}

#[test]
fn sqlite_sink_schedule_replaces_existing_identifier() {
    let conn = open_db_in_memory().unwrap();
    let sink = SqliteNotificationSink::new(&conn);
    sink.schedule(&notification(5, "Old", local(&Chicago, 2024, 1, 1, 8, 0)))
        .unwrap();

    let replacement = notification(5, "New", local(&Chicago, 2024, 1, 1, 9, 15));
    sink.schedule(&replacement).unwrap();

    assert_eq!(sink.pending().unwrap(), vec![replacement]);
}

#[test]
fn sqlite_sink_cancel_of_absent_identifier_is_noop() {
    let conn = open_db_in_memory().unwrap();
    let sink = SqliteNotificationSink::new(&conn);
    sink.schedule(&notification(1, "Keep", local(&Chicago, 2024, 1, 1, 8, 0)))
        .unwrap();

    sink.cancel(2).unwrap();
    sink.cancel(2).unwrap();

    assert_eq!(sink.pending().unwrap().len(), 1);
    sink.cancel(1).unwrap();
    assert!(sink.pending().unwrap().is_empty());
}

#[test]
fn sqlite_sink_preserves_instant_across_timezones() {
    let conn = open_db_in_memory().unwrap();
    let sink = SqliteNotificationSink::new(&conn);
    let fire = local(&Kolkata, 2024, 3, 1, 6, 30);

    sink.schedule(&notification(9, "Yoga", fire)).unwrap();

    let loaded = sink.get(9).unwrap().unwrap();
    assert_eq!(loaded.first_fire.timezone(), Kolkata);
    assert_eq!(loaded.first_fire.with_timezone(&Utc), utc(2024, 3, 1, 1, 0));
}

#[test]
fn in_memory_sink_is_idempotent() {
    let sink = InMemorySink::new();
    let first = notification(3, "A", local(&Chicago, 2024, 1, 1, 8, 0));
    let second = notification(3, "B", local(&Chicago, 2024, 1, 1, 9, 0));

    sink.schedule(&first).unwrap();
    sink.schedule(&second).unwrap();
    sink.cancel(4).unwrap();

    assert_eq!(sink.len(), 1);
    assert_eq!(sink.get(3), Some(second));

    sink.cancel(3).unwrap();
    sink.cancel(3).unwrap();
    assert!(sink.is_empty());
    assert!(!sink.is_scheduled(3));
}
