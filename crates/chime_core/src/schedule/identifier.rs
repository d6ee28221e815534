//! Occurrence identifier allocation.
//!
//! Every reminder owns the identifier range
//! `[id * SLOT_CAPACITY, id * SLOT_CAPACITY + SLOT_CAPACITY)`; slot `n` of the
//! reminder maps to `id * SLOT_CAPACITY + n`. Ranges of distinct non-negative
//! ids are disjoint, so identifiers never collide across reminders.
//!
//! `SLOT_CAPACITY` is a protocol constant. Changing it while notifications are
//! already scheduled remaps every identifier and orphans the old ones.

use crate::model::reminder::ReminderId;
use std::ops::Range;

/// Identifier space reserved per reminder.
pub const SLOT_CAPACITY: u32 = 100;

/// Sink-facing identifier of one recurring daily occurrence.
pub type OccurrenceId = i64;

/// Maps `(reminder_id, slot)` to its occurrence identifier.
///
/// Returns `None` for negative ids, `slot >= SLOT_CAPACITY`, or when the
/// multiplication would overflow.
pub fn identifier(reminder_id: ReminderId, slot: u32) -> Option<OccurrenceId> {
    if reminder_id < 0 || slot >= SLOT_CAPACITY {
        return None;
    }
    reminder_id
        .checked_mul(i64::from(SLOT_CAPACITY))?
        .checked_add(i64::from(slot))
}

/// Splits an occurrence identifier back into `(reminder_id, slot)`.
pub fn decompose(occurrence: OccurrenceId) -> (ReminderId, u32) {
    let capacity = i64::from(SLOT_CAPACITY);
    // rem_euclid is always in [0, capacity), so the narrowing is lossless.
    (
        occurrence.div_euclid(capacity),
        occurrence.rem_euclid(capacity) as u32,
    )
}

/// Full identifier range owned by `reminder_id`.
pub fn identifier_range(reminder_id: ReminderId) -> Option<Range<OccurrenceId>> {
    let start = identifier(reminder_id, 0)?;
    let end = start.checked_add(i64::from(SLOT_CAPACITY))?;
    Some(start..end)
}

#[cfg(test)]
mod tests {
    use super::{decompose, identifier, identifier_range, SLOT_CAPACITY};

    #[test]
    fn identifier_packs_id_and_slot() {
        assert_eq!(identifier(0, 0), Some(0));
        assert_eq!(identifier(7, 3), Some(7 * i64::from(SLOT_CAPACITY) + 3));
    }

    #[test]
    fn identifier_rejects_out_of_range_inputs() {
        assert_eq!(identifier(1, SLOT_CAPACITY), None);
        assert_eq!(identifier(-1, 0), None);
        assert_eq!(identifier(i64::MAX, 0), None);
    }

    #[test]
    fn range_covers_every_slot() {
        let range = identifier_range(4).expect("small id has a range");
        assert_eq!(range.start, identifier(4, 0).expect("slot 0"));
        assert_eq!(
            range.end - 1,
            identifier(4, SLOT_CAPACITY - 1).expect("last slot")
        );
        assert_eq!(decompose(range.end), (5, 0));
    }
}
