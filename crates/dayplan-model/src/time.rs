//! Clock times and day time windows
//!
//! Times travel on the wire as `"HH:MM"` strings.

use crate::error::ModelError;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

const WIRE_FORMAT: &str = "%H:%M";

/// Time of day with minute precision
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Create from hour and minute
    ///
    /// # Errors
    /// Returns error if hour > 23 or minute > 59
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, ModelError> {
        NaiveTime::from_hms_opt(hour, minute, 0)
            .map(Self)
            .ok_or_else(|| ModelError::InvalidTimeOfDay(format!("{hour:02}:{minute:02}")))
    }

    /// Hour component
    #[inline]
    #[must_use]
    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    /// Minute component
    #[inline]
    #[must_use]
    pub fn minute(&self) -> u32 {
        self.0.minute()
    }

    /// Minutes since midnight
    #[inline]
    #[must_use]
    pub fn minutes_since_midnight(&self) -> u32 {
        self.0.hour() * 60 + self.0.minute()
    }
}

impl Display for TimeOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(WIRE_FORMAT))
    }
}

impl FromStr for TimeOfDay {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), WIRE_FORMAT)
            .map(Self)
            .map_err(|_| ModelError::InvalidTimeOfDay(s.to_string()))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Start and end of the planned day
///
/// # Invariants
/// Windows built through [`TimeWindow::new`] always have `start < end`.
/// Windows received from the server are taken as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Day start
    pub start: TimeOfDay,
    /// Day end
    pub end: TimeOfDay,
}

impl TimeWindow {
    /// Create validated window
    ///
    /// # Errors
    /// Returns error if `start` is not strictly before `end`
    pub fn new(start: TimeOfDay, end: TimeOfDay) -> Result<Self, ModelError> {
        if start >= end {
            return Err(ModelError::InvertedTimeWindow {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Parse both ends from `"HH:MM"` strings
    ///
    /// # Errors
    /// Returns error if either time is malformed or the window is inverted
    pub fn parse(start: &str, end: &str) -> Result<Self, ModelError> {
        Self::new(start.parse()?, end.parse()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn time_of_day_parse_and_display() {
        let t: TimeOfDay = "08:05".parse().unwrap();
        assert_eq!(t.hour(), 8);
        assert_eq!(t.minute(), 5);
        assert_eq!(t.to_string(), "08:05");
    }

    #[test]
    fn time_of_day_rejects_garbage() {
        assert!("8am".parse::<TimeOfDay>().is_err());
        assert!("24:00".parse::<TimeOfDay>().is_err());
        assert!(TimeOfDay::from_hm(12, 60).is_err());
    }

    #[test]
    fn time_of_day_wire_format() {
        let t = TimeOfDay::from_hm(18, 0).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"18:00\"");
        let back: TimeOfDay = serde_json::from_str("\"18:00\"").unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn time_window_rejects_inverted() {
        assert!(TimeWindow::parse("18:00", "08:00").is_err());
        assert!(TimeWindow::parse("09:00", "09:00").is_err());
    }

    proptest! {
        #[test]
        fn prop_display_parse_roundtrip(hour in 0u32..24, minute in 0u32..60) {
            let t = TimeOfDay::from_hm(hour, minute).unwrap();
            let parsed: TimeOfDay = t.to_string().parse().unwrap();
            prop_assert_eq!(parsed, t);
        }
    }
}
