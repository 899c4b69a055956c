//! Short, stable labels for canonical recurrences.
//!
//! Labels depend only on the recurrence: no locale, no clock, no window.

use std::collections::BTreeSet;

use crate::calendar::weekday_name;
use crate::recurrence::{Ordinal, Recurrence};

pub const ONE_TIME: &str = "One-time";
pub const SEASONAL: &str = "Seasonal — check venue";
pub const UNKNOWN: &str = "Schedule unknown";

/// Human-readable label for a recurrence.
///
/// # Examples
///
/// ```
/// use chrono::Weekday;
/// use occurrence_engine::humanize::humanize;
/// use occurrence_engine::recurrence::{Ordinal, Recurrence};
///
/// assert_eq!(humanize(&Recurrence::Weekly { weekday: Weekday::Sat }), "Every Saturday");
///
/// let pair = Recurrence::MonthlyOrdinal {
///     weekday: Weekday::Thu,
///     ordinals: [Ordinal::First, Ordinal::Third].into_iter().collect(),
/// };
/// assert_eq!(humanize(&pair), "1st & 3rd Thursday");
/// ```
pub fn humanize(recurrence: &Recurrence) -> String {
    match recurrence {
        Recurrence::OneTime { .. } => ONE_TIME.to_string(),
        Recurrence::Weekly { weekday } => format!("Every {}", weekday_name(*weekday)),
        Recurrence::Biweekly { weekday, .. } => {
            format!("Every other {}", weekday_name(*weekday))
        }
        Recurrence::MonthlyOrdinal { weekday, ordinals } => {
            let day = weekday_name(*weekday);
            let labels: Vec<&str> = ordinals.iter().map(|o| ordinal_label(*o)).collect();
            match labels.as_slice() {
                [] => UNKNOWN.to_string(),
                [_] if ordinals.contains(&Ordinal::Last) => format!("Last {day} of the month"),
                [only] => format!("{only} {day} of the month"),
                many => format!("{} {day}", many.join(" & ")),
            }
        }
        Recurrence::CustomDates { dates } => match dates.iter().collect::<BTreeSet<_>>().len() {
            0 => UNKNOWN.to_string(),
            1 => ONE_TIME.to_string(),
            n => format!("{n} dates"),
        },
        Recurrence::Opaque { label_hint } if label_hint.eq_ignore_ascii_case("seasonal") => {
            SEASONAL.to_string()
        }
        Recurrence::Opaque { .. } | Recurrence::Unknown => UNKNOWN.to_string(),
    }
}

/// `"1st"`, `"2nd"`, `"3rd"`, `"4th"`, `"5th"` or `"last"`.
pub fn ordinal_label(ordinal: Ordinal) -> &'static str {
    match ordinal {
        Ordinal::First => "1st",
        Ordinal::Second => "2nd",
        Ordinal::Third => "3rd",
        Ordinal::Fourth => "4th",
        Ordinal::Fifth => "5th",
        Ordinal::Last => "last",
    }
}
