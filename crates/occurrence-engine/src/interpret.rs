//! Recurrence interpretation: raw schedule fields → one canonical [`Recurrence`].
//!
//! # Design Principle
//!
//! Historical rule strings come in many spellings. Every spelling the
//! interpreter recognizes maps to exactly one variant; anything else becomes
//! [`Recurrence::Opaque`] or [`Recurrence::Unknown`]. The interpreter never
//! guesses a weekday from the anchor date and never lets an anchor date turn
//! a recurring rule into a one-time event.
//!
//! # Priority (first match wins)
//!
//! 1. non-empty custom dates → `CustomDates`
//! 2. empty / `none` rule with an anchor → `OneTime`
//! 3. ordinal token (`1st`, `last`, `1st/3rd`, ...) → `MonthlyOrdinal` (needs a weekday)
//! 4. `FREQ=...` RRULE subset → `MonthlyOrdinal` / `Weekly` / `Biweekly`
//! 5. `weekly` or empty rule with a weekday → `Weekly`
//! 6. `biweekly` → `Biweekly` (needs a weekday and an anchor)
//! 7. `seasonal` or any other non-empty rule → `Opaque`
//! 8. otherwise → `Unknown`

use std::collections::BTreeSet;

use chrono::{Datelike, Weekday};
use rrule::{Frequency, NWeekday, RRule, Unvalidated};

use crate::calendar::{parse_date_key, parse_weekday};
use crate::recurrence::{
    Diagnostic, Interpretation, Ordinal, RawDescriptor, Recurrence, RecurrenceDescriptor,
};

/// Interpret a typed descriptor.
///
/// Never fails: input that cannot be understood yields `Opaque` or `Unknown`.
///
/// # Examples
///
/// ```
/// use chrono::Weekday;
/// use occurrence_engine::interpret::interpret;
/// use occurrence_engine::recurrence::{Recurrence, RecurrenceDescriptor};
///
/// let descriptor = RecurrenceDescriptor {
///     weekday: Some(Weekday::Sat),
///     rule: "weekly".to_string(),
///     ..Default::default()
/// };
/// let result = interpret(&descriptor);
/// assert_eq!(result.recurrence, Recurrence::Weekly { weekday: Weekday::Sat });
/// ```
pub fn interpret(descriptor: &RecurrenceDescriptor) -> Interpretation {
    let mut diagnostics = Vec::new();

    if let (Some(anchor_date), Some(weekday)) = (descriptor.anchor_date, descriptor.weekday) {
        let anchor_weekday = anchor_date.weekday();
        if anchor_weekday != weekday {
            diagnostics.push(Diagnostic::WeekdayMismatch {
                anchor_date,
                anchor_weekday,
                weekday,
            });
        }
    }

    let recurrence = resolve(descriptor, &mut diagnostics);
    for diagnostic in &diagnostics {
        report(diagnostic);
    }

    Interpretation {
        recurrence,
        diagnostics,
    }
}

/// Interpret a descriptor whose fields are still the stored strings.
///
/// Fields that fail to parse are treated as absent and reported as
/// diagnostics; they never abort interpretation.
pub fn interpret_raw(raw: &RawDescriptor) -> Interpretation {
    let mut diagnostics = Vec::new();

    let anchor_date = non_blank(raw.anchor_date.as_deref()).and_then(|value| {
        parse_date_key(value)
            .map_err(|_| {
                diagnostics.push(Diagnostic::InvalidAnchorDate {
                    value: value.to_string(),
                })
            })
            .ok()
    });

    let weekday = non_blank(raw.weekday.as_deref()).and_then(|value| {
        let parsed = parse_weekday(value);
        if parsed.is_none() {
            diagnostics.push(Diagnostic::InvalidWeekday {
                value: value.to_string(),
            });
        }
        parsed
    });

    let custom_dates = raw.custom_dates.as_ref().map(|values| {
        values
            .iter()
            .filter_map(|value| match parse_date_key(value.trim()) {
                Ok(date) => Some(date),
                Err(_) => {
                    diagnostics.push(Diagnostic::InvalidCustomDate {
                        value: value.clone(),
                    });
                    None
                }
            })
            .collect()
    });

    for diagnostic in &diagnostics {
        report(diagnostic);
    }

    let descriptor = RecurrenceDescriptor {
        anchor_date,
        weekday,
        rule: raw.rule.clone().unwrap_or_default(),
        custom_dates,
    };

    let mut interpretation = interpret(&descriptor);
    diagnostics.append(&mut interpretation.diagnostics);
    interpretation.diagnostics = diagnostics;
    interpretation
}

// ── Resolution ──────────────────────────────────────────────────────────────

/// What a rule string says on its own, before weekday/anchor are consulted.
#[derive(Debug)]
enum RuleToken {
    Blank,
    NoRecurrence,
    Weekly,
    Biweekly,
    Ordinals(BTreeSet<Ordinal>),
    RRule(RRule<Unvalidated>),
    Seasonal,
    Unrecognized(String),
}

fn resolve(descriptor: &RecurrenceDescriptor, diagnostics: &mut Vec<Diagnostic>) -> Recurrence {
    if let Some(dates) = descriptor.custom_dates.as_ref().filter(|d| !d.is_empty()) {
        let mut dates = dates.clone();
        dates.sort_unstable();
        dates.dedup();
        return Recurrence::CustomDates { dates };
    }

    let token = classify_rule(&descriptor.rule);
    let weekday = descriptor.weekday;
    let anchor = descriptor.anchor_date;

    if let (RuleToken::Blank | RuleToken::NoRecurrence, Some(date)) = (&token, anchor) {
        return Recurrence::OneTime { date };
    }

    match token {
        RuleToken::Ordinals(ordinals) => match weekday {
            Some(weekday) => Recurrence::MonthlyOrdinal { weekday, ordinals },
            None => Recurrence::Unknown,
        },
        RuleToken::RRule(rule) => from_rrule(&rule, &descriptor.rule, descriptor, diagnostics),
        RuleToken::Weekly | RuleToken::Blank => match weekday {
            Some(weekday) => Recurrence::Weekly { weekday },
            None => Recurrence::Unknown,
        },
        RuleToken::Biweekly => match (weekday, anchor) {
            (Some(weekday), Some(anchor)) => Recurrence::Biweekly { weekday, anchor },
            _ => Recurrence::Unknown,
        },
        RuleToken::Seasonal => Recurrence::Opaque {
            label_hint: "seasonal".to_string(),
        },
        RuleToken::Unrecognized(text) => Recurrence::Opaque { label_hint: text },
        RuleToken::NoRecurrence => Recurrence::Unknown,
    }
}

fn classify_rule(rule: &str) -> RuleToken {
    let trimmed = rule.trim();
    if trimmed.is_empty() {
        return RuleToken::Blank;
    }

    let normalized = normalize_rule(trimmed);
    match normalized.as_str() {
        "none" | "no" | "once" | "one-time" | "one time" => return RuleToken::NoRecurrence,
        "weekly" | "every week" | "each week" => return RuleToken::Weekly,
        "biweekly" | "bi-weekly" | "every other week" | "every 2 weeks" | "fortnightly" => {
            return RuleToken::Biweekly
        }
        "seasonal" => return RuleToken::Seasonal,
        _ => {}
    }

    if let Some(ordinals) = parse_ordinal_list(&normalized) {
        return RuleToken::Ordinals(ordinals);
    }

    if looks_like_rrule(trimmed) {
        if let Some(rule) = parse_rrule(trimmed) {
            return RuleToken::RRule(rule);
        }
    }

    RuleToken::Unrecognized(trimmed.to_string())
}

/// Lowercase and collapse internal whitespace.
fn normalize_rule(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Parse `"1st"`, `"last"`, `"1st/3rd"`, `"2nd & 4th"`, `"first and third"`, ...
fn parse_ordinal_list(s: &str) -> Option<BTreeSet<Ordinal>> {
    let s = s.strip_suffix(" of the month").unwrap_or(s);
    let unified = s.replace(" and ", "/").replace(['&', ','], "/");

    let mut ordinals = BTreeSet::new();
    for part in unified.split('/') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        ordinals.insert(parse_ordinal(part)?);
    }

    if ordinals.is_empty() {
        None
    } else {
        Some(ordinals)
    }
}

/// Parse an ordinal: "first"→First, ..., "last"→Last.
fn parse_ordinal(s: &str) -> Option<Ordinal> {
    match s {
        "first" | "1st" => Some(Ordinal::First),
        "second" | "2nd" => Some(Ordinal::Second),
        "third" | "3rd" => Some(Ordinal::Third),
        "fourth" | "4th" => Some(Ordinal::Fourth),
        "fifth" | "5th" => Some(Ordinal::Fifth),
        "last" => Some(Ordinal::Last),
        _ => None,
    }
}

// ── RRULE subset ────────────────────────────────────────────────────────────

fn looks_like_rrule(s: &str) -> bool {
    let upper = s.to_uppercase();
    upper.starts_with("FREQ=") || upper.starts_with("RRULE:")
}

fn parse_rrule(s: &str) -> Option<RRule<Unvalidated>> {
    let upper = s.trim().to_uppercase();
    let body = upper.strip_prefix("RRULE:").unwrap_or(&upper);
    body.parse::<RRule<Unvalidated>>().ok()
}

fn from_rrule(
    rule: &RRule<Unvalidated>,
    text: &str,
    descriptor: &RecurrenceDescriptor,
    diagnostics: &mut Vec<Diagnostic>,
) -> Recurrence {
    let opaque = || Recurrence::Opaque {
        label_hint: text.trim().to_string(),
    };

    // Bounded series have no canonical form; expanding them forever would misreport.
    if rule.get_count().is_some() || rule.get_until().is_some() {
        return opaque();
    }

    let recurrence = match rule.get_freq() {
        Frequency::Monthly if rule.get_interval() == 1 => {
            monthly_from_rrule(rule, diagnostics).unwrap_or_else(opaque)
        }
        Frequency::Weekly => {
            weekly_from_rrule(rule, descriptor, diagnostics).unwrap_or_else(opaque)
        }
        _ => opaque(),
    };

    // BYDAY drives expansion; a disagreeing weekday field is only reported.
    if let (Some(weekday), Some(rule_weekday)) = (descriptor.weekday, pattern_weekday(&recurrence))
    {
        if weekday != rule_weekday {
            diagnostics.push(Diagnostic::RuleWeekdayMismatch {
                rule_weekday,
                weekday,
            });
        }
    }
    recurrence
}

fn pattern_weekday(recurrence: &Recurrence) -> Option<Weekday> {
    match recurrence {
        Recurrence::Weekly { weekday }
        | Recurrence::Biweekly { weekday, .. }
        | Recurrence::MonthlyOrdinal { weekday, .. } => Some(*weekday),
        _ => None,
    }
}

/// `FREQ=MONTHLY;BYDAY=1TH,3TH`, `FREQ=MONTHLY;BYDAY=TU;BYSETPOS=3`, or
/// `FREQ=MONTHLY;BYDAY=TU` (every Tuesday).
fn monthly_from_rrule(
    rule: &RRule<Unvalidated>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Recurrence> {
    let by_weekday = rule.get_by_weekday();
    if by_weekday.is_empty() {
        return None;
    }

    let all_nth = by_weekday.iter().all(|d| matches!(d, NWeekday::Nth(..)));
    let all_every = by_weekday.iter().all(|d| matches!(d, NWeekday::Every(_)));

    if all_nth {
        let pairs: Vec<(i32, Weekday)> = by_weekday
            .iter()
            .filter_map(|d| match d {
                NWeekday::Nth(n, wd) => Some((i32::from(*n), *wd)),
                NWeekday::Every(_) => None,
            })
            .collect();
        let weekday = keep_first_weekday(pairs.iter().map(|(_, wd)| *wd), diagnostics)?;
        let ordinals = collect_ordinals(
            pairs
                .iter()
                .filter(|(_, wd)| *wd == weekday)
                .map(|(n, _)| *n),
            diagnostics,
        )?;
        return Some(Recurrence::MonthlyOrdinal { weekday, ordinals });
    }

    if all_every {
        let weekdays = by_weekday.iter().filter_map(|d| match d {
            NWeekday::Every(wd) => Some(*wd),
            NWeekday::Nth(..) => None,
        });
        let weekday = keep_first_weekday(weekdays, diagnostics)?;
        let set_pos = rule.get_by_set_pos();
        if set_pos.is_empty() {
            return Some(Recurrence::Weekly { weekday });
        }
        let ordinals = collect_ordinals(set_pos.iter().copied(), diagnostics)?;
        return Some(Recurrence::MonthlyOrdinal { weekday, ordinals });
    }

    None
}

/// `FREQ=WEEKLY[;BYDAY=SA]` and `FREQ=WEEKLY;INTERVAL=2[;BYDAY=SA]`.
fn weekly_from_rrule(
    rule: &RRule<Unvalidated>,
    descriptor: &RecurrenceDescriptor,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Recurrence> {
    let mut weekdays = Vec::new();
    for day in rule.get_by_weekday() {
        match day {
            NWeekday::Every(wd) => weekdays.push(*wd),
            NWeekday::Nth(..) => return None,
        }
    }

    let weekday = if weekdays.is_empty() {
        match descriptor.weekday {
            Some(weekday) => weekday,
            // A weekly pattern with no weekday anywhere, like a bare "weekly".
            None => return matches!(rule.get_interval(), 1 | 2).then_some(Recurrence::Unknown),
        }
    } else {
        keep_first_weekday(weekdays.into_iter(), diagnostics)?
    };

    match rule.get_interval() {
        1 => Some(Recurrence::Weekly { weekday }),
        2 => descriptor
            .anchor_date
            .map(|anchor| Recurrence::Biweekly { weekday, anchor })
            .or(Some(Recurrence::Unknown)),
        _ => None,
    }
}

/// First distinct weekday in order of appearance; the rest are reported.
fn keep_first_weekday(
    weekdays: impl Iterator<Item = Weekday>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<Weekday> {
    let mut distinct: Vec<Weekday> = Vec::new();
    for wd in weekdays {
        if !distinct.contains(&wd) {
            distinct.push(wd);
        }
    }

    let (&kept, dropped) = distinct.split_first()?;
    if !dropped.is_empty() {
        diagnostics.push(Diagnostic::DroppedWeekdays {
            kept,
            dropped: dropped.to_vec(),
        });
    }
    Some(kept)
}

fn collect_ordinals(
    positions: impl Iterator<Item = i32>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Option<BTreeSet<Ordinal>> {
    let mut ordinals = BTreeSet::new();
    for position in positions {
        match Ordinal::from_position(position) {
            Some(ordinal) => {
                ordinals.insert(ordinal);
            }
            None => diagnostics.push(Diagnostic::UnsupportedOrdinal { position }),
        }
    }
    if ordinals.is_empty() {
        None
    } else {
        Some(ordinals)
    }
}

// ── Internal helpers ────────────────────────────────────────────────────────

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn report(diagnostic: &Diagnostic) {
    match diagnostic {
        Diagnostic::DroppedWeekdays { kept, dropped } => tracing::warn!(
            kept = ?kept,
            dropped = ?dropped,
            "monthly rule names several weekdays; expanding only the first"
        ),
        Diagnostic::WeekdayMismatch {
            anchor_date,
            anchor_weekday,
            weekday,
        } => tracing::warn!(
            %anchor_date,
            anchor_weekday = ?anchor_weekday,
            weekday = ?weekday,
            "anchor date does not fall on the event weekday"
        ),
        Diagnostic::InvalidAnchorDate { value } => {
            tracing::warn!(value = %value, "ignoring unparseable anchor date")
        }
        Diagnostic::InvalidWeekday { value } => {
            tracing::warn!(value = %value, "ignoring unrecognized weekday")
        }
        Diagnostic::InvalidCustomDate { value } => {
            tracing::warn!(value = %value, "ignoring unparseable custom date")
        }
        Diagnostic::UnsupportedOrdinal { position } => {
            tracing::warn!(position, "ignoring unsupported monthly position")
        }
        Diagnostic::RuleWeekdayMismatch {
            rule_weekday,
            weekday,
        } => tracing::warn!(
            rule_weekday = ?rule_weekday,
            weekday = ?weekday,
            "rule weekday differs from the event weekday; expanding the rule weekday"
        ),
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
