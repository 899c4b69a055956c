//! # occurrence-engine
//!
//! Deterministic recurrence interpretation and occurrence expansion for
//! community event listings.
//!
//! Stored schedules are sparse and historically inconsistent: an anchor date,
//! a weekday label, a free-text or RRULE-like rule, and sometimes a list of
//! explicit dates. This crate turns those fields into one canonical
//! recurrence, expands it into the civil dates it falls on within a window,
//! and layers per-date overrides (cancellations, time/notes/image edits) on
//! top. Everything is evaluated in one fixed civil timezone.
//!
//! All functions are pure: the only clock read is [`Calendar::today`], and
//! every other entry point takes its reference date explicitly.
//!
//! ## Modules
//!
//! - [`calendar`]: civil-date primitives: today, add days, weekday, date keys
//! - [`recurrence`]: descriptors, canonical recurrence, diagnostics
//! - [`interpret`]: raw schedule fields → canonical recurrence
//! - [`generate`]: canonical recurrence + window → sorted occurrences
//! - [`next`]: soonest occurrence on or after a reference date
//! - [`overrides`]: per-date override merging
//! - [`humanize`]: short stable labels ("Every Monday", "1st & 3rd Thursday")
//! - [`config`]: engine configuration
//! - [`engine`]: configured facade over the above
//! - [`error`]: error types

pub mod calendar;
pub mod config;
pub mod engine;
pub mod error;
pub mod generate;
pub mod humanize;
pub mod interpret;
pub mod next;
pub mod overrides;
pub mod recurrence;

pub use calendar::{date_key, parse_date_key, parse_weekday, Calendar, WeekStartDay};
pub use config::EngineConfig;
pub use engine::OccurrenceEngine;
pub use error::EngineError;
pub use generate::{generate, generate_report, Generation, Occurrence, Window, DEFAULT_CAP};
pub use humanize::humanize;
pub use interpret::{interpret, interpret_raw};
pub use next::{next_occurrence, next_occurrence_within, NextOccurrence};
pub use overrides::{
    effective_on, index_overrides, merge_overrides, BaseFields, EffectiveOccurrence,
    OccurrenceOverride, OccurrenceStatus, OverrideMap, OverrideStatus,
};
pub use recurrence::{
    Confidence, Diagnostic, Interpretation, Ordinal, RawDescriptor, Recurrence,
    RecurrenceDescriptor,
};
