//! Domain model for recurring daily reminders.
//!
//! # Invariants
//! - A reminder's identity is assigned by the store exactly once.
//! - Occurrences are derived values and are never persisted here.

pub mod reminder;
