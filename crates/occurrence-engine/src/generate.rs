//! Occurrence generation: canonical recurrence + date window → sorted dates.
//!
//! Output is always ascending, free of duplicates, contained in the window
//! and at most `cap` long. Generation walks forward and stops as soon as it
//! has one date more than the cap, so runtime is bounded by the cap rather
//! than by the window length.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::Serialize;

use crate::calendar::{date_key, parse_date_key, Calendar};
use crate::error::{EngineError, Result};
use crate::recurrence::{Ordinal, Recurrence};

/// Default maximum number of dates returned by one generation.
pub const DEFAULT_CAP: usize = 90;

// ── Window ──────────────────────────────────────────────────────────────────

/// Inclusive civil-date window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Window {
    start: NaiveDate,
    end: NaiveDate,
}

impl Window {
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidWindow`] if `start` is after `end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(EngineError::InvalidWindow(format!(
                "start {} is after end {}",
                date_key(start),
                date_key(end)
            )));
        }
        Ok(Self { start, end })
    }

    /// Build a window from two date keys.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidDateKey`] if either key is malformed, or
    /// [`EngineError::InvalidWindow`] if start is after end.
    pub fn from_keys(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_date_key(start)?, parse_date_key(end)?)
    }

    /// A window covering exactly one day.
    pub fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// `[start, start + days]`. Negative `days` are treated as zero.
    pub fn starting_at(calendar: &Calendar, start: NaiveDate, days: i64) -> Self {
        Self {
            start,
            end: calendar.add_days(start, days.max(0)),
        }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

// ── Output ──────────────────────────────────────────────────────────────────

/// One date an event falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Occurrence {
    pub date: NaiveDate,
    /// `false` for placeholder dates that no understood pattern produced.
    pub is_confident: bool,
}

impl Occurrence {
    pub fn date_key(&self) -> String {
        date_key(self.date)
    }
}

/// Generated occurrences plus how the generation went.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Generation {
    pub occurrences: Vec<Occurrence>,
    /// `false` when the recurrence is `Opaque` or `Unknown`.
    pub is_confident: bool,
    /// More than `cap` dates matched and the tail was dropped.
    pub cap_exceeded: bool,
}

// ── generate ────────────────────────────────────────────────────────────────

/// Expand `recurrence` over `window`, returning at most `cap` occurrences.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, Weekday};
/// use occurrence_engine::calendar::{Calendar, WeekStartDay};
/// use occurrence_engine::generate::{generate, Window};
/// use occurrence_engine::recurrence::Recurrence;
///
/// let cal = Calendar::from_timezone_name("America/New_York", WeekStartDay::Monday).unwrap();
/// let window = Window::from_keys("2026-01-24", "2026-02-23").unwrap();
/// let saturdays = generate(&cal, &Recurrence::Weekly { weekday: Weekday::Sat }, &window, 90);
/// assert_eq!(saturdays.len(), 5);
/// assert_eq!(saturdays[0].date_key(), "2026-01-24");
/// ```
pub fn generate(
    calendar: &Calendar,
    recurrence: &Recurrence,
    window: &Window,
    cap: usize,
) -> Vec<Occurrence> {
    generate_report(calendar, recurrence, window, cap).occurrences
}

/// Like [`generate`], but also reports confidence and truncation.
pub fn generate_report(
    calendar: &Calendar,
    recurrence: &Recurrence,
    window: &Window,
    cap: usize,
) -> Generation {
    let limit = cap.saturating_add(1);

    let mut dates = match recurrence {
        Recurrence::OneTime { date } => {
            if window.contains(*date) {
                vec![*date]
            } else {
                Vec::new()
            }
        }
        Recurrence::Weekly { weekday } => {
            let first = first_on_or_after(calendar, window.start, *weekday);
            stepped(calendar, first, 7, window, limit)
        }
        Recurrence::Biweekly { weekday, anchor } => {
            let mut first = first_on_or_after(calendar, window.start, *weekday);
            if calendar.week_offset(*anchor, first).rem_euclid(2) != 0 {
                first = calendar.add_days(first, 7);
            }
            stepped(calendar, first, 14, window, limit)
        }
        Recurrence::MonthlyOrdinal { weekday, ordinals } => {
            monthly(calendar, *weekday, ordinals.iter().copied(), window, limit)
        }
        Recurrence::CustomDates { dates } => dates
            .iter()
            .copied()
            .filter(|d| window.contains(*d))
            .collect(),
        Recurrence::Opaque { .. } | Recurrence::Unknown => {
            return Generation {
                occurrences: Vec::new(),
                is_confident: false,
                cap_exceeded: false,
            };
        }
    };

    dates.sort_unstable();
    dates.dedup();
    let cap_exceeded = dates.len() > cap;
    dates.truncate(cap);

    Generation {
        occurrences: dates
            .into_iter()
            .map(|date| Occurrence {
                date,
                is_confident: true,
            })
            .collect(),
        is_confident: true,
        cap_exceeded,
    }
}

// ── Per-variant walkers ─────────────────────────────────────────────────────

/// The first date on or after `from` that falls on `weekday`.
fn first_on_or_after(calendar: &Calendar, from: NaiveDate, weekday: Weekday) -> NaiveDate {
    let ahead = (weekday.num_days_from_monday() as i64
        - calendar.weekday_of(from).num_days_from_monday() as i64)
        .rem_euclid(7);
    calendar.add_days(from, ahead)
}

/// `first, first + step, ...` while inside the window, up to `limit` dates.
fn stepped(
    calendar: &Calendar,
    first: NaiveDate,
    step: i64,
    window: &Window,
    limit: usize,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = first;
    while current <= window.end && dates.len() < limit {
        dates.push(current);
        current = calendar.add_days(current, step);
    }
    dates
}

fn monthly(
    calendar: &Calendar,
    weekday: Weekday,
    ordinals: impl Iterator<Item = Ordinal> + Clone,
    window: &Window,
    limit: usize,
) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let last_month = (window.end.year(), window.end.month());
    let (mut year, mut month) = (window.start.year(), window.start.month());

    while (year, month) <= last_month && dates.len() < limit {
        // "4th" and "last" can name the same day; keep each month sorted and unique.
        let mut in_month: Vec<NaiveDate> = ordinals
            .clone()
            .filter_map(|ordinal| nth_weekday_in_month(calendar, year, month, weekday, ordinal))
            .filter(|d| window.contains(*d))
            .collect();
        in_month.sort_unstable();
        in_month.dedup();
        dates.extend(in_month);

        (year, month) = next_month(year, month);
    }
    dates
}

/// The `ordinal` occurrence of `weekday` in the given month, or `None` when
/// the month has no such occurrence (e.g. a 5th Friday in a four-Friday month).
fn nth_weekday_in_month(
    calendar: &Calendar,
    year: i32,
    month: u32,
    weekday: Weekday,
    ordinal: Ordinal,
) -> Option<NaiveDate> {
    let position = ordinal.position() as i64;
    let target = if position > 0 {
        // Forward from the first of the month
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let diff = (weekday.num_days_from_monday() as i64
            - calendar.weekday_of(first).num_days_from_monday() as i64)
            .rem_euclid(7);
        calendar.add_days(first, diff + 7 * (position - 1))
    } else {
        // Backward from the last of the month
        let (ny, nm) = next_month(year, month);
        let last = NaiveDate::from_ymd_opt(ny, nm, 1)?.pred_opt()?;
        let diff = (calendar.weekday_of(last).num_days_from_monday() as i64
            - weekday.num_days_from_monday() as i64)
            .rem_euclid(7);
        calendar.add_days(last, -diff)
    };

    // Never roll over into an adjacent month.
    (target.year() == year && target.month() == month).then_some(target)
}

fn next_month(year: i32, month: u32) -> (i32, u32) {
    if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
