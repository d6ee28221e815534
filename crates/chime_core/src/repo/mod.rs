//! Reminder persistence.
//!
//! # Responsibility
//! - Define the store contract the service drives.
//! - Keep SQL and offset serialization inside the persistence boundary.
//!
//! # Invariants
//! - Writes run `Reminder::validate()` before SQL mutations.
//! - Reads reject rows that would fail validation instead of masking them.

pub mod reminder_repo;
