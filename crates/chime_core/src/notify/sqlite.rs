//! SQLite-backed notification sink.
//!
//! # Responsibility
//! - Persist the pending occurrence set in `scheduled_notifications` so a
//!   delivery daemon (or the CLI) can read it across processes.
//!
//! # Invariants
//! - One row per occurrence identifier; scheduling upserts.
//! - `first_fire_at` is epoch milliseconds; `timezone` is the IANA name the
//!   instant was resolved in.

use super::{NotificationSink, ScheduledNotification, SinkError};
use crate::schedule::identifier::OccurrenceId;
use crate::schedule::resolver::FireTime;
use chrono::TimeZone;
use chrono_tz::Tz;
use rusqlite::{params, Connection, Row};

const PENDING_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    first_fire_at,
    timezone,
    fire_hour,
    fire_minute,
    repeat_daily
FROM scheduled_notifications";

pub struct SqliteNotificationSink<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationSink<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    /// Pending notifications ordered by identifier.
    pub fn pending(&self) -> Result<Vec<ScheduledNotification>, SinkError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PENDING_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut pending = Vec::new();
        while let Some(row) = rows.next()? {
            pending.push(parse_notification_row(row)?);
        }
        Ok(pending)
    }

    pub fn get(&self, id: OccurrenceId) -> Result<Option<ScheduledNotification>, SinkError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PENDING_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query([id])?;
        match rows.next()? {
            Some(row) => Ok(Some(parse_notification_row(row)?)),
            None => Ok(None),
        }
    }
}

impl NotificationSink for SqliteNotificationSink<'_> {
    fn schedule(&self, notification: &ScheduledNotification) -> Result<(), SinkError> {
        self.conn.execute(
            "INSERT INTO scheduled_notifications (
                id,
                title,
                body,
                first_fire_at,
                timezone,
                fire_hour,
                fire_minute,
                repeat_daily
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                body = excluded.body,
                first_fire_at = excluded.first_fire_at,
                timezone = excluded.timezone,
                fire_hour = excluded.fire_hour,
                fire_minute = excluded.fire_minute,
                repeat_daily = excluded.repeat_daily,
                scheduled_at = (strftime('%s', 'now') * 1000);",
            params![
                notification.id,
                notification.title.as_str(),
                notification.body.as_str(),
                notification.first_fire.timestamp_millis(),
                notification.first_fire.timezone().name(),
                notification.daily_at.hour,
                notification.daily_at.minute,
                notification.repeat_daily,
            ],
        )?;
        Ok(())
    }

    fn cancel(&self, id: OccurrenceId) -> Result<(), SinkError> {
        self.conn
            .execute("DELETE FROM scheduled_notifications WHERE id = ?1;", [id])?;
        Ok(())
    }
}

fn parse_notification_row(row: &Row<'_>) -> Result<ScheduledNotification, SinkError> {
    let id: OccurrenceId = row.get("id")?;

    let tz_name: String = row.get("timezone")?;
    let tz: Tz = tz_name.parse().map_err(|err| {
        SinkError::InvalidData(format!(
            "unknown timezone `{tz_name}` for notification {id}: {err}"
        ))
    })?;

    let fire_at_ms: i64 = row.get("first_fire_at")?;
    let first_fire = tz.timestamp_millis_opt(fire_at_ms).single().ok_or_else(|| {
        SinkError::InvalidData(format!(
            "invalid first_fire_at `{fire_at_ms}` for notification {id}"
        ))
    })?;

    Ok(ScheduledNotification {
        id,
        title: row.get("title")?,
        body: row.get("body")?,
        first_fire,
        daily_at: FireTime {
            hour: row.get("fire_hour")?,
            minute: row.get("fire_minute")?,
        },
        repeat_daily: row.get("repeat_daily")?,
    })
}
