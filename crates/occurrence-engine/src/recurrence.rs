//! Recurrence data model: the raw descriptor read from storage, the canonical
//! recurrence the interpreter derives from it, and the diagnostics collected
//! along the way.

use std::collections::BTreeSet;

use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

// ── Descriptor ──────────────────────────────────────────────────────────────

/// Typed recurrence input: the three stored schedule fields plus optional
/// explicit dates.
///
/// When both `anchor_date` and `weekday` are set, the anchor is expected to
/// fall on that weekday. The engine does not enforce this; see
/// [`Diagnostic::WeekdayMismatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceDescriptor {
    pub anchor_date: Option<NaiveDate>,
    pub weekday: Option<Weekday>,
    #[serde(default)]
    pub rule: String,
    pub custom_dates: Option<Vec<NaiveDate>>,
}

/// Descriptor exactly as persisted: every field is an unvalidated string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDescriptor {
    pub anchor_date: Option<String>,
    pub weekday: Option<String>,
    pub rule: Option<String>,
    pub custom_dates: Option<Vec<String>>,
}

// ── Canonical recurrence ────────────────────────────────────────────────────

/// Position of a weekday within its month.
///
/// `Last` is resolved per month at generation time: it is the final
/// occurrence of the weekday, which may be the 4th or the 5th.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ordinal {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Last,
}

impl Ordinal {
    /// Map an RRULE-style position (`1..=5`, `-1`) to an ordinal.
    pub fn from_position(n: i32) -> Option<Self> {
        match n {
            1 => Some(Self::First),
            2 => Some(Self::Second),
            3 => Some(Self::Third),
            4 => Some(Self::Fourth),
            5 => Some(Self::Fifth),
            -1 => Some(Self::Last),
            _ => None,
        }
    }

    /// RRULE-style position: `1..=5` counting forward, `-1` for `Last`.
    pub fn position(self) -> i32 {
        match self {
            Self::First => 1,
            Self::Second => 2,
            Self::Third => 3,
            Self::Fourth => 4,
            Self::Fifth => 5,
            Self::Last => -1,
        }
    }
}

/// The canonical form of "when does this event happen".
///
/// Constructed once by [`crate::interpret::interpret`] and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Recurrence {
    OneTime {
        date: NaiveDate,
    },
    Weekly {
        weekday: Weekday,
    },
    MonthlyOrdinal {
        weekday: Weekday,
        ordinals: BTreeSet<Ordinal>,
    },
    /// Every other `weekday`, with "on" weeks counted from `anchor`'s week.
    Biweekly {
        weekday: Weekday,
        anchor: NaiveDate,
    },
    /// Sorted, deduplicated explicit dates.
    CustomDates {
        dates: Vec<NaiveDate>,
    },
    /// Recognizably not a pattern the engine expands (e.g. `"seasonal"`).
    Opaque {
        label_hint: String,
    },
    Unknown,
}

impl Recurrence {
    /// Whether the generator can produce dates for this recurrence.
    pub fn is_expandable(&self) -> bool {
        !matches!(self, Self::Opaque { .. } | Self::Unknown)
    }

    pub fn confidence(&self) -> Confidence {
        if self.is_expandable() {
            Confidence::Confident
        } else {
            Confidence::Ambiguous
        }
    }
}

/// Whether the interpreter fully understood a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Confident,
    /// Interpretation fell through to `Opaque` or `Unknown`.
    Ambiguous,
}

// ── Interpretation result ───────────────────────────────────────────────────

/// Something the interpreter noticed that callers may want to surface or log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// An RRULE named several weekdays; only `kept` is expanded.
    DroppedWeekdays { kept: Weekday, dropped: Vec<Weekday> },
    /// `anchor_date` does not fall on `weekday`.
    WeekdayMismatch {
        anchor_date: NaiveDate,
        anchor_weekday: Weekday,
        weekday: Weekday,
    },
    InvalidAnchorDate { value: String },
    InvalidWeekday { value: String },
    InvalidCustomDate { value: String },
    /// An RRULE BYDAY position outside `1..=5` / `-1`.
    UnsupportedOrdinal { position: i32 },
    /// The RRULE's BYDAY weekday differs from the descriptor's `weekday`.
    RuleWeekdayMismatch {
        rule_weekday: Weekday,
        weekday: Weekday,
    },
}

/// A canonical recurrence plus the diagnostics gathered while deriving it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub recurrence: Recurrence,
    pub diagnostics: Vec<Diagnostic>,
}

impl Interpretation {
    pub fn confidence(&self) -> Confidence {
        self.recurrence.confidence()
    }
}
