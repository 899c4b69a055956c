//! A configured engine: one calendar plus the listing/lookahead settings, with
//! the operations the listing, detail and admin surfaces call.

use chrono::NaiveDate;

use crate::calendar::Calendar;
use crate::config::EngineConfig;
use crate::error::Result;
use crate::generate::{generate_report, Generation, Window};
use crate::humanize::humanize;
use crate::interpret::{interpret, interpret_raw};
use crate::next::{next_occurrence_within, NextOccurrence};
use crate::overrides::{effective_on, merge_overrides, BaseFields, EffectiveOccurrence, OverrideMap};
use crate::recurrence::{Interpretation, RawDescriptor, Recurrence, RecurrenceDescriptor};

#[derive(Debug, Clone)]
pub struct OccurrenceEngine {
    calendar: Calendar,
    config: EngineConfig,
}

impl OccurrenceEngine {
    /// # Errors
    ///
    /// Returns an error if `config` fails [`EngineConfig::validate`].
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let calendar = Calendar::from_timezone_name(&config.timezone, config.week_start)?;
        Ok(Self { calendar, config })
    }

    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Today in the configured timezone (reads the system clock).
    pub fn today(&self) -> NaiveDate {
        self.calendar.today()
    }

    pub fn interpret(&self, descriptor: &RecurrenceDescriptor) -> Interpretation {
        interpret(descriptor)
    }

    pub fn interpret_raw(&self, raw: &RawDescriptor) -> Interpretation {
        interpret_raw(raw)
    }

    pub fn label(&self, recurrence: &Recurrence) -> String {
        humanize(recurrence)
    }

    /// Expand over an explicit window with the configured cap.
    pub fn generate(&self, recurrence: &Recurrence, window: &Window) -> Generation {
        let generation = generate_report(&self.calendar, recurrence, window, self.config.cap);
        if generation.cap_exceeded {
            tracing::debug!(
                cap = self.config.cap,
                start = %window.start(),
                end = %window.end(),
                "occurrence list truncated at cap"
            );
        }
        generation
    }

    /// Expand over the listing window `[reference, reference + display_days]`.
    pub fn upcoming(&self, recurrence: &Recurrence, reference: NaiveDate) -> Generation {
        let window = Window::starting_at(&self.calendar, reference, self.config.display_days);
        self.generate(recurrence, &window)
    }

    pub fn next_occurrence(&self, recurrence: &Recurrence, reference: NaiveDate) -> NextOccurrence {
        next_occurrence_within(
            &self.calendar,
            recurrence,
            reference,
            self.config.lookahead_days,
        )
    }

    /// Upcoming occurrences with overrides applied.
    pub fn upcoming_effective(
        &self,
        recurrence: &Recurrence,
        reference: NaiveDate,
        overrides: &OverrideMap,
        base: &BaseFields,
    ) -> Vec<EffectiveOccurrence> {
        let generation = self.upcoming(recurrence, reference);
        merge_overrides(&generation.occurrences, overrides, base)
    }

    /// The effective occurrence on one selected date, if the event occurs then.
    pub fn occurrence_on(
        &self,
        recurrence: &Recurrence,
        date: NaiveDate,
        overrides: &OverrideMap,
        base: &BaseFields,
    ) -> Option<EffectiveOccurrence> {
        effective_on(&self.calendar, recurrence, date, overrides, base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overrides::{index_overrides, OccurrenceOverride, OverrideStatus};
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn engine() -> OccurrenceEngine {
        OccurrenceEngine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn test_new_rejects_bad_timezone() {
        let config = EngineConfig {
            timezone: "Nowhere/Special".to_string(),
            ..EngineConfig::default()
        };
        assert!(OccurrenceEngine::new(config).is_err());
    }

    #[test]
    fn test_new_rejects_unbounded_day_counts() {
        let config = EngineConfig {
            lookahead_days: i64::MAX,
            ..EngineConfig::default()
        };
        assert!(matches!(
            OccurrenceEngine::new(config),
            Err(crate::error::EngineError::InvalidConfig(_))
        ));
        let config = EngineConfig {
            display_days: 100_000_000_000,
            ..EngineConfig::default()
        };
        assert!(OccurrenceEngine::new(config).is_err());
    }

    #[test]
    fn test_interpret_typed_descriptor() {
        let engine = engine();
        let interpretation = engine.interpret(&RecurrenceDescriptor {
            anchor_date: Some(d(2026, 1, 3)),
            weekday: Some(Weekday::Sat),
            rule: "every other week".to_string(),
            custom_dates: None,
        });
        assert_eq!(engine.label(&interpretation.recurrence), "Every other Saturday");
        let generation = engine.generate(
            &interpretation.recurrence,
            &Window::from_keys("2026-01-01", "2026-01-31").unwrap(),
        );
        let dates: Vec<_> = generation.occurrences.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![d(2026, 1, 3), d(2026, 1, 17), d(2026, 1, 31)]);
    }

    #[test]
    fn test_upcoming_uses_display_window() {
        let rec = Recurrence::Weekly {
            weekday: Weekday::Sat,
        };
        let generation = engine().upcoming(&rec, d(2026, 1, 1));
        // Jan 1 .. Apr 1 2026 holds 13 Saturdays (Jan 3 .. Mar 28)
        assert_eq!(generation.occurrences.len(), 13);
        assert_eq!(generation.occurrences[12].date, d(2026, 3, 28));
        assert!(!generation.cap_exceeded);
    }

    #[test]
    fn test_configured_cap_applies() {
        let engine = OccurrenceEngine::new(EngineConfig {
            cap: 3,
            ..EngineConfig::default()
        })
        .unwrap();
        let rec = Recurrence::Weekly {
            weekday: Weekday::Sat,
        };
        let generation = engine.upcoming(&rec, d(2026, 1, 1));
        assert_eq!(generation.occurrences.len(), 3);
        assert!(generation.cap_exceeded);
    }

    #[test]
    fn test_upcoming_effective_keeps_cancelled_rows() {
        let rec = Recurrence::Weekly {
            weekday: Weekday::Sat,
        };
        let overrides = index_overrides([OccurrenceOverride {
            date: d(2026, 1, 10),
            status: OverrideStatus::Cancelled,
            start_time: None,
            notes: Some("Venue closed".to_string()),
            cover_image_url: None,
        }]);
        let effective =
            engine().upcoming_effective(&rec, d(2026, 1, 1), &overrides, &BaseFields::default());
        assert_eq!(effective.len(), 13);
        assert_eq!(effective.iter().filter(|e| e.is_cancelled).count(), 1);
        assert_eq!(effective[1].notes.as_deref(), Some("Venue closed"));
    }

    #[test]
    fn test_end_to_end_raw_descriptor() {
        let engine = engine();
        let raw = RawDescriptor {
            anchor_date: None,
            weekday: Some("Thursday".to_string()),
            rule: Some("1st/3rd".to_string()),
            custom_dates: None,
        };
        let interpretation = engine.interpret_raw(&raw);
        assert_eq!(engine.label(&interpretation.recurrence), "1st & 3rd Thursday");
        let next = engine.next_occurrence(&interpretation.recurrence, d(2026, 1, 2));
        assert_eq!(next.occurrence().map(|o| o.date), Some(d(2026, 1, 15)));
    }
}
