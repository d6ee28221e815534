//! Reminder store contract and SQLite implementation.
//!
//! # Invariants
//! - The store is the only place ids are assigned; ids are never reused.
//! - `times` round-trips with order and exact float values preserved.
//! - `list_all` is ordered by id ascending.

use crate::db::DbError;
use crate::model::reminder::{Reminder, ReminderId, ReminderValidationError};
use rusqlite::{params, Connection, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

const REMINDER_SELECT_SQL: &str = "SELECT
    id,
    title,
    body,
    times_json
FROM reminders";

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug)]
pub enum StoreError {
    Validation(ReminderValidationError),
    Db(DbError),
    NotFound(ReminderId),
    /// Update called on a reminder that was never persisted.
    MissingIdentity,
    /// Insert called on a reminder that already has an id.
    IdentityAlreadyAssigned(ReminderId),
    InvalidData(String),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "reminder not found: {id}"),
            Self::MissingIdentity => write!(f, "reminder has no assigned id"),
            Self::IdentityAlreadyAssigned(id) => {
                write!(f, "reminder already persisted with id {id}")
            }
            Self::InvalidData(message) => write!(f, "invalid persisted reminder data: {message}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::NotFound(_)
            | Self::MissingIdentity
            | Self::IdentityAlreadyAssigned(_)
            | Self::InvalidData(_) => None,
        }
    }
}

impl From<ReminderValidationError> for StoreError {
    fn from(value: ReminderValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Durable record of reminders; owns identity.
pub trait ReminderStore {
    /// Persists a new reminder and returns its assigned id.
    fn insert(&self, reminder: &Reminder) -> StoreResult<ReminderId>;
    /// Replaces title, body and offsets of an existing reminder.
    fn update(&self, reminder: &Reminder) -> StoreResult<()>;
    fn remove(&self, id: ReminderId) -> StoreResult<()>;
    fn get(&self, id: ReminderId) -> StoreResult<Option<Reminder>>;
    fn list_all(&self) -> StoreResult<Vec<Reminder>>;
}

impl<R: ReminderStore + ?Sized> ReminderStore for &R {
    fn insert(&self, reminder: &Reminder) -> StoreResult<ReminderId> {
        (**self).insert(reminder)
    }

    fn update(&self, reminder: &Reminder) -> StoreResult<()> {
        (**self).update(reminder)
    }

    fn remove(&self, id: ReminderId) -> StoreResult<()> {
        (**self).remove(id)
    }

    fn get(&self, id: ReminderId) -> StoreResult<Option<Reminder>> {
        (**self).get(id)
    }

    fn list_all(&self) -> StoreResult<Vec<Reminder>> {
        (**self).list_all()
    }
}

/// SQLite-backed reminder store.
pub struct SqliteReminderStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReminderStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl ReminderStore for SqliteReminderStore<'_> {
    fn insert(&self, reminder: &Reminder) -> StoreResult<ReminderId> {
        if let Some(id) = reminder.id {
            return Err(StoreError::IdentityAlreadyAssigned(id));
        }
        reminder.validate()?;

        self.conn.execute(
            "INSERT INTO reminders (title, body, times_json) VALUES (?1, ?2, ?3);",
            params![
                reminder.title.as_str(),
                reminder.body.as_str(),
                encode_times(&reminder.times)?,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update(&self, reminder: &Reminder) -> StoreResult<()> {
        let id = reminder.id.ok_or(StoreError::MissingIdentity)?;
        reminder.validate()?;

        let changed = self.conn.execute(
            "UPDATE reminders
             SET
                title = ?1,
                body = ?2,
                times_json = ?3,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?4;",
            params![
                reminder.title.as_str(),
                reminder.body.as_str(),
                encode_times(&reminder.times)?,
                id,
            ],
        )?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn remove(&self, id: ReminderId) -> StoreResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM reminders WHERE id = ?1;", [id])?;

        if changed == 0 {
            return Err(StoreError::NotFound(id));
        }

        Ok(())
    }

    fn get(&self, id: ReminderId) -> StoreResult<Option<Reminder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REMINDER_SELECT_SQL} WHERE id = ?1;"))?;

        let mut rows = stmt.query([id])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_reminder_row(row)?));
        }

        Ok(None)
    }

    fn list_all(&self) -> StoreResult<Vec<Reminder>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{REMINDER_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut reminders = Vec::new();

        while let Some(row) = rows.next()? {
            reminders.push(parse_reminder_row(row)?);
        }

        Ok(reminders)
    }
}

fn parse_reminder_row(row: &Row<'_>) -> StoreResult<Reminder> {
    let id: ReminderId = row.get("id")?;
    let times_json: String = row.get("times_json")?;
    let times = serde_json::from_str::<Vec<f64>>(&times_json).map_err(|err| {
        StoreError::InvalidData(format!(
            "invalid times_json `{times_json}` for reminder {id}: {err}"
        ))
    })?;

    let reminder = Reminder {
        id: Some(id),
        title: row.get("title")?,
        body: row.get("body")?,
        times,
    };
    reminder.validate().map_err(|err| {
        StoreError::InvalidData(format!("reminder {id} fails validation: {err}"))
    })?;
    Ok(reminder)
}

fn encode_times(times: &[f64]) -> StoreResult<String> {
    serde_json::to_string(times)
        .map_err(|err| StoreError::InvalidData(format!("cannot encode time offsets: {err}")))
}
