//! Per-date override merging.
//!
//! Overrides are owned and persisted elsewhere; this module only layers a
//! supplied map over generated occurrences. The merge never adds a date the
//! generator did not produce and never removes one: a cancelled occurrence
//! stays in the output, flagged.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar::Calendar;
use crate::generate::{generate, Occurrence, Window};
use crate::recurrence::Recurrence;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideStatus {
    #[default]
    Normal,
    Cancelled,
}

/// A stored exception for one date of one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccurrenceOverride {
    pub date: NaiveDate,
    #[serde(default)]
    pub status: OverrideStatus,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

impl OccurrenceOverride {
    fn changes_fields(&self) -> bool {
        self.start_time.is_some() || self.notes.is_some() || self.cover_image_url.is_some()
    }
}

/// Overrides keyed by the date they apply to.
pub type OverrideMap = HashMap<NaiveDate, OccurrenceOverride>;

/// The event-level values an override can replace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseFields {
    pub start_time: Option<String>,
    pub notes: Option<String>,
    pub cover_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OccurrenceStatus {
    Scheduled,
    /// At least one field was replaced by an override.
    Modified,
    Cancelled,
}

/// An occurrence as it should be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveOccurrence {
    pub date: NaiveDate,
    pub is_confident: bool,
    pub is_cancelled: bool,
    pub status: OccurrenceStatus,
    pub display_start_time: Option<String>,
    pub notes: Option<String>,
    pub cover_image_url: Option<String>,
}

/// Build an [`OverrideMap`] from a list. A later entry for the same date
/// replaces an earlier one.
pub fn index_overrides(overrides: impl IntoIterator<Item = OccurrenceOverride>) -> OverrideMap {
    let mut map = OverrideMap::new();
    for entry in overrides {
        let date = entry.date;
        if map.insert(date, entry).is_some() {
            tracing::warn!(%date, "duplicate override for date; keeping the later one");
        }
    }
    map
}

/// Layer `overrides` over `occurrences`.
///
/// The output has exactly one entry per input occurrence, in input order.
/// Override fields that are set replace the base field; unset ones fall
/// through to `base`.
pub fn merge_overrides(
    occurrences: &[Occurrence],
    overrides: &OverrideMap,
    base: &BaseFields,
) -> Vec<EffectiveOccurrence> {
    let merged: Vec<EffectiveOccurrence> = occurrences
        .iter()
        .map(|occurrence| merge_one(occurrence, overrides.get(&occurrence.date), base))
        .collect();

    let unmatched = overrides
        .keys()
        .filter(|date| !occurrences.iter().any(|o| o.date == **date))
        .count();
    if unmatched > 0 {
        tracing::debug!(unmatched, "overrides for dates outside the generated set");
    }

    merged
}

/// Resolve one selected date (e.g. from a `?date=` link).
///
/// Returns `None` when the event does not occur on `date`.
pub fn effective_on(
    calendar: &Calendar,
    recurrence: &Recurrence,
    date: NaiveDate,
    overrides: &OverrideMap,
    base: &BaseFields,
) -> Option<EffectiveOccurrence> {
    let occurrences = generate(calendar, recurrence, &Window::single(date), 1);
    let occurrence = occurrences.first()?;
    Some(merge_one(occurrence, overrides.get(&occurrence.date), base))
}

fn merge_one(
    occurrence: &Occurrence,
    entry: Option<&OccurrenceOverride>,
    base: &BaseFields,
) -> EffectiveOccurrence {
    let Some(entry) = entry else {
        return EffectiveOccurrence {
            date: occurrence.date,
            is_confident: occurrence.is_confident,
            is_cancelled: false,
            status: OccurrenceStatus::Scheduled,
            display_start_time: base.start_time.clone(),
            notes: base.notes.clone(),
            cover_image_url: base.cover_image_url.clone(),
        };
    };

    let is_cancelled = entry.status == OverrideStatus::Cancelled;
    let status = if is_cancelled {
        OccurrenceStatus::Cancelled
    } else if entry.changes_fields() {
        OccurrenceStatus::Modified
    } else {
        OccurrenceStatus::Scheduled
    };

    EffectiveOccurrence {
        date: occurrence.date,
        is_confident: occurrence.is_confident,
        is_cancelled,
        status,
        display_start_time: entry
            .start_time
            .clone()
            .or_else(|| base.start_time.clone()),
        notes: entry.notes.clone().or_else(|| base.notes.clone()),
        cover_image_url: entry
            .cover_image_url
            .clone()
            .or_else(|| base.cover_image_url.clone()),
    }
}
