//! Civil-date primitives anchored to a single fixed timezone.
//!
//! Every computation that touches an instant goes through local noon of the
//! civil date, never local midnight. A DST transition moves noon by at most an
//! hour, so the civil date re-derived from a noon instant is always the
//! intended one; midnight arithmetic can land on the previous or next day.
//!
//! The only live-clock read in the crate is [`Calendar::today`]. Everything
//! else takes its reference instant or date explicitly.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

// ── Configurable week start ─────────────────────────────────────────────────

/// Which day begins a week when counting week offsets between two dates.
///
/// Only matters for biweekly parity when the series anchor falls on a
/// different weekday than the pattern weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStartDay {
    /// ISO 8601 standard (Monday = day 0 of the week).
    #[default]
    Monday,
    /// US/Canada convention (Sunday = day 0 of the week).
    Sunday,
}

/// How many days `weekday` is from the week-start day.
pub(crate) fn days_from_week_start(weekday: Weekday, week_start: WeekStartDay) -> i64 {
    match week_start {
        WeekStartDay::Monday => weekday.num_days_from_monday() as i64,
        WeekStartDay::Sunday => weekday.num_days_from_sunday() as i64,
    }
}

// ── Calendar ────────────────────────────────────────────────────────────────

/// Civil calendar for one fixed IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    tz: Tz,
    week_start: WeekStartDay,
}

impl Calendar {
    /// Build a calendar for an already-parsed timezone.
    pub fn new(tz: Tz, week_start: WeekStartDay) -> Self {
        Self { tz, week_start }
    }

    /// Build a calendar from an IANA timezone name (e.g. `"America/New_York"`).
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] if the name is not a known IANA zone.
    pub fn from_timezone_name(name: &str, week_start: WeekStartDay) -> Result<Self> {
        Ok(Self::new(parse_timezone(name)?, week_start))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn week_start(&self) -> WeekStartDay {
        self.week_start
    }

    /// The civil date in this calendar's timezone at the current instant.
    ///
    /// This is the single place the crate reads the system clock. Library
    /// callers that need reproducible output should use [`Calendar::today_at`].
    pub fn today(&self) -> NaiveDate {
        self.today_at(Utc::now())
    }

    /// The civil date in this calendar's timezone at instant `now`.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::{NaiveDate, TimeZone, Utc};
    /// use occurrence_engine::calendar::{Calendar, WeekStartDay};
    ///
    /// let cal = Calendar::from_timezone_name("America/New_York", WeekStartDay::Monday).unwrap();
    /// // 03:30 UTC on Jan 25 is still the evening of Jan 24 in New York.
    /// let now = Utc.with_ymd_and_hms(2026, 1, 25, 3, 30, 0).unwrap();
    /// assert_eq!(cal.today_at(now), NaiveDate::from_ymd_opt(2026, 1, 24).unwrap());
    /// ```
    pub fn today_at(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.tz).date_naive()
    }

    /// Add `days` (possibly negative) to `date`.
    ///
    /// The addition is performed on the noon instant of `date` in this
    /// timezone and the civil date is re-derived from the result. Results
    /// past the representable range saturate at `NaiveDate::MIN`/`MAX`.
    pub fn add_days(&self, date: NaiveDate, days: i64) -> NaiveDate {
        let shifted = Duration::try_days(days).and_then(|delta| match self.noon(date) {
            Some(anchor) => anchor
                .checked_add_signed(delta)
                .map(|instant| instant.date_naive()),
            None => date.checked_add_signed(delta),
        });
        shifted.unwrap_or(if days < 0 {
            NaiveDate::MIN
        } else {
            NaiveDate::MAX
        })
    }

    /// Day of the week of `date`, read from its noon instant.
    pub fn weekday_of(&self, date: NaiveDate) -> Weekday {
        match self.noon(date) {
            Some(anchor) => anchor.weekday(),
            None => date.weekday(),
        }
    }

    /// First day of the week containing `date`.
    pub fn start_of_week(&self, date: NaiveDate) -> NaiveDate {
        let back = days_from_week_start(self.weekday_of(date), self.week_start);
        self.add_days(date, -back)
    }

    /// Signed number of whole weeks from the week containing `from` to the
    /// week containing `to`.
    pub fn week_offset(&self, from: NaiveDate, to: NaiveDate) -> i64 {
        let days = (self.start_of_week(to) - self.start_of_week(from)).num_days();
        days.div_euclid(7)
    }

    /// Local noon of `date`. `None` only for zones that skip noon entirely.
    fn noon(&self, date: NaiveDate) -> Option<DateTime<Tz>> {
        let naive = date.and_hms_opt(12, 0, 0)?;
        self.tz.from_local_datetime(&naive).earliest()
    }
}

// ── Date keys ───────────────────────────────────────────────────────────────

/// Serialize a civil date as its `YYYY-MM-DD` date key.
pub fn date_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Parse a `YYYY-MM-DD` date key.
///
/// The input must be exactly four digits, a dash, two digits, a dash and two
/// digits, and must name a real calendar day.
///
/// # Errors
///
/// Returns [`EngineError::InvalidDateKey`] for malformed or calendar-invalid
/// input (e.g. `"2026-04-31"`).
///
/// # Examples
///
/// ```
/// use occurrence_engine::calendar::{date_key, parse_date_key};
///
/// let date = parse_date_key("2026-01-24").unwrap();
/// assert_eq!(date_key(date), "2026-01-24");
/// assert!(parse_date_key("2026-1-24").is_err());
/// assert!(parse_date_key("2026-04-31").is_err());
/// ```
pub fn parse_date_key(s: &str) -> Result<NaiveDate> {
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(EngineError::InvalidDateKey(format!("'{s}'")));
    }

    let year: i32 = s[0..4]
        .parse()
        .map_err(|_| EngineError::InvalidDateKey(format!("'{s}'")))?;
    let month: u32 = s[5..7]
        .parse()
        .map_err(|_| EngineError::InvalidDateKey(format!("'{s}'")))?;
    let day: u32 = s[8..10]
        .parse()
        .map_err(|_| EngineError::InvalidDateKey(format!("'{s}'")))?;

    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| EngineError::InvalidDateKey(format!("'{s}': no such calendar day")))
}

// ── Parsing helpers ─────────────────────────────────────────────────────────

/// Parse an IANA timezone string into `Tz`.
pub(crate) fn parse_timezone(s: &str) -> Result<Tz> {
    s.parse::<Tz>()
        .map_err(|_| EngineError::InvalidTimezone(format!("'{s}'")))
}

/// Parse a weekday name (case-insensitive, supports full, abbreviated and plural).
pub fn parse_weekday(s: &str) -> Option<Weekday> {
    let s = s.trim().to_lowercase();
    let s = s
        .strip_suffix('s')
        .filter(|r| r.ends_with("day"))
        .unwrap_or(s.as_str());
    match s {
        "monday" | "mon" => Some(Weekday::Mon),
        "tuesday" | "tue" | "tues" => Some(Weekday::Tue),
        "wednesday" | "wed" => Some(Weekday::Wed),
        "thursday" | "thu" | "thur" | "thurs" => Some(Weekday::Thu),
        "friday" | "fri" => Some(Weekday::Fri),
        "saturday" | "sat" => Some(Weekday::Sat),
        "sunday" | "sun" => Some(Weekday::Sun),
        _ => None,
    }
}

/// Full English name of a weekday, independent of locale.
pub fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ny() -> Calendar {
        Calendar::from_timezone_name("America/New_York", WeekStartDay::Monday).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_today_at_uses_local_date() {
        // 02:00 UTC on Mar 9 is 22:00 EDT on Mar 8
        let now = Utc.with_ymd_and_hms(2026, 3, 9, 2, 0, 0).unwrap();
        assert_eq!(ny().today_at(now), d(2026, 3, 8));
    }

    #[test]
    fn test_today_at_utc_midday() {
        let now = Utc.with_ymd_and_hms(2026, 7, 4, 16, 0, 0).unwrap();
        assert_eq!(ny().today_at(now), d(2026, 7, 4));
    }

    #[test]
    fn test_add_days_across_spring_forward() {
        // US spring forward: March 8, 2026
        assert_eq!(ny().add_days(d(2026, 3, 7), 1), d(2026, 3, 8));
        assert_eq!(ny().add_days(d(2026, 3, 7), 2), d(2026, 3, 9));
    }

    #[test]
    fn test_add_days_across_fall_back() {
        // US fall back: November 1, 2026
        assert_eq!(ny().add_days(d(2026, 10, 31), 1), d(2026, 11, 1));
        assert_eq!(ny().add_days(d(2026, 10, 31), 2), d(2026, 11, 2));
    }

    #[test]
    fn test_add_days_negative_and_year_boundary() {
        assert_eq!(ny().add_days(d(2026, 1, 1), -1), d(2025, 12, 31));
        assert_eq!(ny().add_days(d(2025, 12, 31), 365), d(2026, 12, 31));
    }

    #[test]
    fn test_add_days_many_transitions_no_drift() {
        let cal = ny();
        let start = d(2026, 1, 1);
        for n in 0..800 {
            assert_eq!(cal.add_days(start, n), start + Duration::days(n), "n = {n}");
        }
    }

    #[test]
    fn test_add_days_saturates_out_of_range() {
        let start = d(2026, 1, 1);
        assert_eq!(ny().add_days(start, i64::MAX), NaiveDate::MAX);
        assert_eq!(ny().add_days(start, 100_000_000_000), NaiveDate::MAX);
        assert_eq!(ny().add_days(start, i64::MIN), NaiveDate::MIN);
        assert_eq!(ny().add_days(NaiveDate::MAX, 1), NaiveDate::MAX);
    }

    #[test]
    fn test_add_days_in_zone_that_skipped_a_day() {
        // Samoa skipped December 30, 2011 entirely.
        let cal = Calendar::from_timezone_name("Pacific/Apia", WeekStartDay::Monday).unwrap();
        assert_eq!(cal.add_days(d(2026, 5, 1), 1), d(2026, 5, 2));
    }

    #[test]
    fn test_weekday_of() {
        assert_eq!(ny().weekday_of(d(2026, 1, 24)), Weekday::Sat);
        assert_eq!(ny().weekday_of(d(2026, 3, 8)), Weekday::Sun);
        assert_eq!(ny().weekday_of(d(2027, 2, 26)), Weekday::Fri);
    }

    #[test]
    fn test_start_of_week_monday_and_sunday() {
        let sat = d(2026, 1, 24);
        assert_eq!(ny().start_of_week(sat), d(2026, 1, 19));
        let sunday_cal = Calendar::new(ny().timezone(), WeekStartDay::Sunday);
        assert_eq!(sunday_cal.start_of_week(sat), d(2026, 1, 18));
    }

    #[test]
    fn test_week_offset_signed() {
        let cal = ny();
        assert_eq!(cal.week_offset(d(2026, 1, 3), d(2026, 1, 17)), 2);
        assert_eq!(cal.week_offset(d(2026, 1, 17), d(2026, 1, 3)), -2);
        assert_eq!(cal.week_offset(d(2026, 1, 5), d(2026, 1, 11)), 0);
    }

    #[test]
    fn test_date_key_zero_pads() {
        assert_eq!(date_key(d(2026, 2, 3)), "2026-02-03");
    }

    #[test]
    fn test_parse_date_key_valid() {
        assert_eq!(parse_date_key("2028-02-29").unwrap(), d(2028, 2, 29));
    }

    #[test]
    fn test_parse_date_key_rejects_bad_grouping() {
        for bad in ["2026-1-24", "26-01-24", "2026/01/24", "2026-01-24T00:00", "", "abcd-ef-gh"] {
            let err = parse_date_key(bad).unwrap_err();
            assert!(err.to_string().contains("Invalid date key"), "got: {err}");
        }
    }

    #[test]
    fn test_parse_date_key_rejects_calendar_invalid() {
        assert!(parse_date_key("2026-04-31").is_err());
        assert!(parse_date_key("2027-02-29").is_err());
        assert!(parse_date_key("2026-13-01").is_err());
        assert!(parse_date_key("2026-00-10").is_err());
    }

    #[test]
    fn test_parse_weekday_variants() {
        assert_eq!(parse_weekday("Saturday"), Some(Weekday::Sat));
        assert_eq!(parse_weekday(" thurs "), Some(Weekday::Thu));
        assert_eq!(parse_weekday("Mondays"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("weekday"), None);
        assert_eq!(parse_weekday(""), None);
    }

    #[test]
    fn test_weekday_name_full() {
        assert_eq!(weekday_name(Weekday::Thu), "Thursday");
    }

    #[test]
    fn test_invalid_timezone_returns_error() {
        let err = Calendar::from_timezone_name("Invalid/Zone", WeekStartDay::Monday).unwrap_err();
        assert!(err.to_string().contains("Invalid timezone"), "got: {err}");
    }
}
