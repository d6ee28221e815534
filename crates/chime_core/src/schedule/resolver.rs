//! Time-of-day to next-fire instant resolution.
//!
//! # Responsibility
//! - Turn a fractional-hour offset into the next wall-clock instant, in the
//!   timezone of the reference `now`, at which that time of day occurs.
//!
//! # Invariants
//! - Pure: no clock reads, no shared state. Safe to call from any thread.
//! - Minutes are rounded, not truncated; a rounded `60` rolls into the next
//!   hour and, past 23, into the next calendar day.
//! - Day rollover advances the calendar date and re-derives the wall-clock
//!   time there, so DST transitions never shift the local fire time.
//! - Ambiguous local times (clocks falling back) resolve to the earlier
//!   instant. Skipped local times (clocks springing forward) are read with
//!   the offset in force before the gap, landing just after it.

use crate::model::reminder::is_valid_offset;
use chrono::{DateTime, Days, LocalResult, NaiveDate, Offset, TimeDelta, TimeZone};
use std::error::Error;
use std::fmt::{Display, Formatter};

const MINUTES_PER_HOUR: f64 = 60.0;
// Longer than any real DST gap, so the probe lands before the transition.
const GAP_LOOKBEHIND_HOURS: i64 = 3;

/// Wall-clock hour and minute at which an occurrence repeats every day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FireTime {
    pub hour: u32,
    pub minute: u32,
}

impl Display for FireTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// First fire instant plus the daily repetition rule handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFire<Tz: TimeZone> {
    pub first_fire: DateTime<Tz>,
    pub daily_at: FireTime,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// Offset is not a finite fractional hour in `[0, 24)`.
    InvalidOffset(f64),
    /// No instant exists for the wall-clock time on the given date.
    Unresolvable { date: NaiveDate, at: FireTime },
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidOffset(value) => write!(f, "time offset {value} is outside [0, 24)"),
            Self::Unresolvable { date, at } => {
                write!(f, "cannot resolve {at} on {date} in the target timezone")
            }
        }
    }
}

impl Error for ResolveError {}

/// Splits a fractional hour into its daily fire time.
///
/// The second value is the number of calendar days the rounding carried
/// into (`1` only for offsets that round up to 24:00).
pub fn split_offset(offset: f64) -> Result<(FireTime, u64), ResolveError> {
    if !is_valid_offset(offset) {
        return Err(ResolveError::InvalidOffset(offset));
    }

    let whole_hours = offset.floor();
    // Both casts are bounded: whole_hours in [0, 23], rounded minutes in [0, 60].
    let mut hour = whole_hours as u32;
    let mut minute = ((offset - whole_hours) * MINUTES_PER_HOUR).round() as u32;

    if minute >= 60 {
        minute = 0;
        hour += 1;
    }
    let carry_days = if hour >= 24 {
        hour -= 24;
        1
    } else {
        0
    };

    Ok((FireTime { hour, minute }, carry_days))
}

/// Resolves the next instant strictly after `now` at which `offset` occurs.
///
/// The timezone is taken from `now`, so callers pick the target zone by
/// converting their clock reading into it.
pub fn next_fire<Tz: TimeZone>(
    offset: f64,
    now: &DateTime<Tz>,
) -> Result<ResolvedFire<Tz>, ResolveError> {
    let (daily_at, carry_days) = split_offset(offset)?;
    let tz = now.timezone();

    let mut date = now
        .date_naive()
        .checked_add_days(Days::new(carry_days))
        .ok_or(ResolveError::Unresolvable {
            date: now.date_naive(),
            at: daily_at,
        })?;
    let mut first_fire = localize(&tz, date, daily_at)?;

    if first_fire <= *now {
        date = date.succ_opt().ok_or(ResolveError::Unresolvable { date, at: daily_at })?;
        first_fire = localize(&tz, date, daily_at)?;
    }

    Ok(ResolvedFire {
        first_fire,
        daily_at,
    })
}

fn localize<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
    at: FireTime,
) -> Result<DateTime<Tz>, ResolveError> {
    let unresolvable = || ResolveError::Unresolvable { date, at };
    let naive = date
        .and_hms_opt(at.hour, at.minute, 0)
        .ok_or_else(unresolvable)?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(resolved) => Ok(resolved),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => {
            let before_gap = naive
                .checked_sub_signed(TimeDelta::hours(GAP_LOOKBEHIND_HOURS))
                .ok_or_else(unresolvable)?;
            let offset = tz
                .offset_from_local_datetime(&before_gap)
                .earliest()
                .ok_or_else(unresolvable)?
                .fix();
            let utc = naive
                .checked_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc())))
                .ok_or_else(unresolvable)?;
            Ok(tz.from_utc_datetime(&utc))
        }
    }
}
