//! Reminder domain model.
//!
//! # Responsibility
//! - Define the persisted reminder record and its write-time validation.
//!
//! # Invariants
//! - `id` is `None` until the store assigns it and immutable afterwards.
//! - `times` keeps caller order; duplicates and unsorted lists are allowed.
//! - Every offset is a finite fractional hour in `[0, 24)`.

use crate::schedule::identifier::SLOT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Store-assigned integer identity of a reminder.
pub type ReminderId = i64;

/// A text reminder that fires daily at each of its time-of-day offsets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ReminderId>,
    pub title: String,
    pub body: String,
    /// Fractional hours, `22.5` meaning 22:30. Position is the slot index.
    pub times: Vec<f64>,
}

impl Reminder {
    /// Creates an unpersisted reminder (no id yet).
    pub fn new(title: impl Into<String>, body: impl Into<String>, times: Vec<f64>) -> Self {
        Self {
            id: None,
            title: title.into(),
            body: body.into(),
            times,
        }
    }

    /// Returns this reminder carrying a store-assigned id.
    pub fn with_id(mut self, id: ReminderId) -> Self {
        self.id = Some(id);
        self
    }

    /// Checks the invariants every persisted reminder must hold.
    ///
    /// # Errors
    /// - `EmptyTitle` when the title is blank after trimming.
    /// - `InvalidOffset` for the first offset outside `[0, 24)` or non-finite.
    /// - `TooManyOffsets` when the list cannot fit one identifier range.
    pub fn validate(&self) -> Result<(), ReminderValidationError> {
        if self.title.trim().is_empty() {
            return Err(ReminderValidationError::EmptyTitle);
        }
        if let Some((slot, value)) = first_invalid_offset(&self.times) {
            return Err(ReminderValidationError::InvalidOffset { slot, value });
        }
        if self.times.len() > SLOT_CAPACITY as usize {
            return Err(ReminderValidationError::TooManyOffsets {
                count: self.times.len(),
                capacity: SLOT_CAPACITY,
            });
        }
        Ok(())
    }
}

/// Returns whether `value` is a usable fractional hour.
pub fn is_valid_offset(value: f64) -> bool {
    value.is_finite() && (0.0..24.0).contains(&value)
}

/// Finds the first offset that is not a valid fractional hour.
pub fn first_invalid_offset(times: &[f64]) -> Option<(usize, f64)> {
    times
        .iter()
        .copied()
        .enumerate()
        .find(|(_, value)| !is_valid_offset(*value))
}

/// Write-time validation failures for [`Reminder`].
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderValidationError {
    EmptyTitle,
    InvalidOffset { slot: usize, value: f64 },
    TooManyOffsets { count: usize, capacity: u32 },
}

impl Display for ReminderValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "reminder title must not be empty"),
            Self::InvalidOffset { slot, value } => write!(
                f,
                "time offset {value} at slot {slot} is outside [0, 24)"
            ),
            Self::TooManyOffsets { count, capacity } => write!(
                f,
                "reminder has {count} time offsets; at most {capacity} are supported"
            ),
        }
    }
}

impl Error for ReminderValidationError {}

#[cfg(test)]
mod tests {
    use super::{is_valid_offset, Reminder, ReminderValidationError};
    use crate::schedule::identifier::SLOT_CAPACITY;

    #[test]
    fn offset_range_is_half_open() {
        assert!(is_valid_offset(0.0));
        assert!(is_valid_offset(23.999));
        assert!(!is_valid_offset(24.0));
        assert!(!is_valid_offset(-0.5));
        assert!(!is_valid_offset(f64::NAN));
        assert!(!is_valid_offset(f64::INFINITY));
    }

    #[test]
    fn validate_accepts_unsorted_duplicates_and_empty_lists() {
        Reminder::new("water", "", vec![22.5, 8.0, 8.0])
            .validate()
            .expect("unsorted duplicates are allowed");
        Reminder::new("water", "", Vec::new())
            .validate()
            .expect("empty offsets are allowed");
    }

    #[test]
    fn validate_rejects_blank_title() {
        let err = Reminder::new("   ", "body", vec![9.0])
            .validate()
            .expect_err("blank title must fail");
        assert_eq!(err, ReminderValidationError::EmptyTitle);
    }

    #[test]
    fn validate_reports_first_bad_slot() {
        let err = Reminder::new("meds", "", vec![9.0, 25.0, -1.0])
            .validate()
            .expect_err("out of range offset must fail");
        assert_eq!(
            err,
            ReminderValidationError::InvalidOffset {
                slot: 1,
                value: 25.0
            }
        );
    }

    #[test]
    fn validate_caps_offset_count() {
        let times = vec![12.0; SLOT_CAPACITY as usize + 1];
        let err = Reminder::new("many", "", times)
            .validate()
            .expect_err("over capacity must fail");
        assert!(matches!(err, ReminderValidationError::TooManyOffsets { .. }));
    }
}
