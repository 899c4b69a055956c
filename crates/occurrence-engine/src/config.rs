//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::calendar::{parse_timezone, WeekStartDay};
use crate::error::{EngineError, Result};
use crate::generate::DEFAULT_CAP;
use crate::next::LOOKAHEAD_DAYS;

/// The civil timezone events are listed in unless configured otherwise.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Default listing window length, in days.
pub const DEFAULT_DISPLAY_DAYS: i64 = 90;

/// Upper bound for `display_days` and `lookahead_days` (about ten years).
pub const MAX_WINDOW_DAYS: i64 = 3660;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// IANA name of the single civil timezone all dates are interpreted in.
    pub timezone: String,
    /// Maximum number of occurrences one generation returns.
    pub cap: usize,
    /// Length of the listing window used by `upcoming`.
    pub display_days: i64,
    /// How far ahead the next-occurrence lookup searches.
    pub lookahead_days: i64,
    pub week_start: WeekStartDay,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            timezone: DEFAULT_TIMEZONE.to_string(),
            cap: DEFAULT_CAP,
            display_days: DEFAULT_DISPLAY_DAYS,
            lookahead_days: LOOKAHEAD_DAYS,
            week_start: WeekStartDay::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] for malformed JSON or values that
    /// fail [`EngineConfig::validate`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns [`EngineError::InvalidTimezone`] for an unknown zone, or
    /// [`EngineError::InvalidConfig`] for a zero cap or day counts outside
    /// `1..=MAX_WINDOW_DAYS`.
    pub fn validate(&self) -> Result<()> {
        parse_timezone(&self.timezone)?;
        if self.cap == 0 {
            return Err(EngineError::InvalidConfig("cap must be positive".to_string()));
        }
        check_day_count("display_days", self.display_days)?;
        check_day_count("lookahead_days", self.lookahead_days)?;
        Ok(())
    }
}

fn check_day_count(field: &str, days: i64) -> Result<()> {
    if !(1..=MAX_WINDOW_DAYS).contains(&days) {
        return Err(EngineError::InvalidConfig(format!(
            "{field} must be between 1 and {MAX_WINDOW_DAYS}, got {days}"
        )));
    }
    Ok(())
}
