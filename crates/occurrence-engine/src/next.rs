//! "When is this next happening": the soonest occurrence on or after a
//! reference date, looking at most one year ahead.

use chrono::NaiveDate;
use serde::Serialize;

use crate::calendar::Calendar;
use crate::generate::{generate, Occurrence, Window};
use crate::recurrence::Recurrence;

/// Default lookahead for [`next_occurrence`], in days.
pub const LOOKAHEAD_DAYS: i64 = 365;

/// Result of a next-occurrence lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NextOccurrence {
    Scheduled { occurrence: Occurrence },
    /// Nothing within the lookahead: an ambiguous pattern, a one-time date
    /// already past, or explicit dates that have all been used up.
    NoneKnown,
}

impl NextOccurrence {
    pub fn occurrence(&self) -> Option<Occurrence> {
        match self {
            Self::Scheduled { occurrence } => Some(*occurrence),
            Self::NoneKnown => None,
        }
    }

    pub fn is_confident(&self) -> bool {
        matches!(self, Self::Scheduled { .. })
    }

    /// The found occurrence, or `reference` marked as not confident for
    /// callers that must display some date.
    pub fn or_placeholder(self, reference: NaiveDate) -> Occurrence {
        self.occurrence().unwrap_or_else(|| placeholder(reference))
    }
}

/// A displayable stand-in date that no pattern produced.
pub fn placeholder(reference: NaiveDate) -> Occurrence {
    Occurrence {
        date: reference,
        is_confident: false,
    }
}

/// The soonest occurrence in `[reference, reference + 365 days]`.
///
/// # Examples
///
/// ```
/// use chrono::{NaiveDate, Weekday};
/// use occurrence_engine::calendar::{Calendar, WeekStartDay};
/// use occurrence_engine::next::next_occurrence;
/// use occurrence_engine::recurrence::Recurrence;
///
/// let cal = Calendar::from_timezone_name("America/New_York", WeekStartDay::Monday).unwrap();
/// let thursday = NaiveDate::from_ymd_opt(2026, 1, 22).unwrap();
/// let next = next_occurrence(&cal, &Recurrence::Weekly { weekday: Weekday::Sat }, thursday);
/// assert_eq!(next.occurrence().unwrap().date_key(), "2026-01-24");
/// ```
pub fn next_occurrence(
    calendar: &Calendar,
    recurrence: &Recurrence,
    reference: NaiveDate,
) -> NextOccurrence {
    next_occurrence_within(calendar, recurrence, reference, LOOKAHEAD_DAYS)
}

/// The soonest occurrence in `[reference, reference + lookahead_days]`.
pub fn next_occurrence_within(
    calendar: &Calendar,
    recurrence: &Recurrence,
    reference: NaiveDate,
    lookahead_days: i64,
) -> NextOccurrence {
    let window = Window::starting_at(calendar, reference, lookahead_days);
    match generate(calendar, recurrence, &window, 1).first() {
        Some(occurrence) => NextOccurrence::Scheduled {
            occurrence: *occurrence,
        },
        None => NextOccurrence::NoneKnown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::WeekStartDay;
    use crate::recurrence::Ordinal;
    use chrono::Weekday;

    fn cal() -> Calendar {
        Calendar::from_timezone_name("America/New_York", WeekStartDay::Monday).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_next_includes_reference_day() {
        let rec = Recurrence::Weekly {
            weekday: Weekday::Sat,
        };
        let next = next_occurrence(&cal(), &rec, d(2026, 1, 24));
        assert_eq!(next.occurrence().map(|o| o.date), Some(d(2026, 1, 24)));
        assert!(next.is_confident());
    }

    #[test]
    fn test_next_one_time_in_past_is_none_known() {
        let rec = Recurrence::OneTime { date: d(2025, 12, 31) };
        let next = next_occurrence(&cal(), &rec, d(2026, 1, 1));
        assert_eq!(next, NextOccurrence::NoneKnown);
        assert!(!next.is_confident());
    }

    #[test]
    fn test_next_one_time_beyond_a_year_is_none_known() {
        let rec = Recurrence::OneTime { date: d(2027, 6, 1) };
        assert_eq!(
            next_occurrence(&cal(), &rec, d(2026, 1, 1)),
            NextOccurrence::NoneKnown
        );
    }

    #[test]
    fn test_next_rare_fifth_ordinal_found_months_ahead() {
        // After Jan 29 2027, the next 5th Friday is April 30 2027.
        let rec = Recurrence::MonthlyOrdinal {
            weekday: Weekday::Fri,
            ordinals: [Ordinal::Fifth].into_iter().collect(),
        };
        let next = next_occurrence(&cal(), &rec, d(2027, 1, 30));
        assert_eq!(next.occurrence().map(|o| o.date), Some(d(2027, 4, 30)));
    }

    #[test]
    fn test_next_unknown_has_no_occurrence() {
        let next = next_occurrence(&cal(), &Recurrence::Unknown, d(2026, 1, 1));
        assert_eq!(next, NextOccurrence::NoneKnown);
    }

    #[test]
    fn test_or_placeholder_marks_not_confident() {
        let reference = d(2026, 1, 1);
        let occurrence = NextOccurrence::NoneKnown.or_placeholder(reference);
        assert_eq!(occurrence.date, reference);
        assert!(!occurrence.is_confident);
    }

    #[test]
    fn test_next_within_short_lookahead() {
        let rec = Recurrence::Weekly {
            weekday: Weekday::Sat,
        };
        // Thursday + 1 day lookahead does not reach Saturday
        assert_eq!(
            next_occurrence_within(&cal(), &rec, d(2026, 1, 22), 1),
            NextOccurrence::NoneKnown
        );
    }

    #[test]
    fn test_next_within_unbounded_lookahead_does_not_overflow() {
        let rec = Recurrence::MonthlyOrdinal {
            weekday: Weekday::Fri,
            ordinals: [Ordinal::Fifth].into_iter().collect(),
        };
        let next = next_occurrence_within(&cal(), &rec, d(2027, 1, 30), i64::MAX);
        assert_eq!(next.occurrence().map(|o| o.date), Some(d(2027, 4, 30)));
        assert_eq!(
            next_occurrence_within(&cal(), &Recurrence::Unknown, d(2027, 1, 30), i64::MAX),
            NextOccurrence::NoneKnown
        );
    }
}
