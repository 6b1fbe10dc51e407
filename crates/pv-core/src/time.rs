use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

/// A span of in-game time, counted in turns (one turn is one second).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimeDuration(i64);

impl TimeDuration {
    /// The marker for effects that never expire.
    pub const PERMANENT: Self = Self(i64::MAX);
    /// No time at all.
    pub const ZERO: Self = Self(0);

    /// A duration of `n` turns.
    pub const fn from_turns(n: i64) -> Self {
        Self(n)
    }

    /// A duration of `n` minutes.
    pub const fn from_minutes(n: i64) -> Self {
        Self(n.saturating_mul(60))
    }

    /// A duration of `n` hours.
    pub const fn from_hours(n: i64) -> Self {
        Self(n.saturating_mul(3600))
    }

    /// A duration of `n` days.
    pub const fn from_days(n: i64) -> Self {
        Self(n.saturating_mul(86_400))
    }

    /// Number of turns.
    pub fn turns(self) -> i64 {
        self.0
    }

    /// Whether this is the permanent marker.
    pub fn is_permanent(self) -> bool {
        self == Self::PERMANENT
    }

    /// Number of turns in one named unit (`"m"`, `"hours"`, ...).
    pub fn unit_turns(unit: &str) -> Option<i64> {
        let turns = match unit {
            "t" | "turn" | "turns" | "s" | "sec" | "second" | "seconds" => 1,
            "m" | "min" | "minute" | "minutes" => 60,
            "h" | "hour" | "hours" => 3600,
            "d" | "day" | "days" => 86_400,
            "w" | "week" | "weeks" => 604_800,
            _ => return None,
        };
        Some(turns)
    }

    /// Parse `"PERMANENT"`, a bare number of turns, or unit pairs such as
    /// `"1 h 30 m"` and `"2days"`.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let trimmed = text.trim();
        if trimmed == "PERMANENT" {
            return Ok(Self::PERMANENT);
        }
        if let Ok(turns) = trimmed.parse::<i64>() {
            return Ok(Self(turns));
        }

        let invalid = || CoreError::InvalidDuration(text.to_string());
        let mut total: i64 = 0;
        let mut rest = trimmed;
        if rest.is_empty() {
            return Err(invalid());
        }
        while !rest.is_empty() {
            let digits_end = rest
                .char_indices()
                .find(|(i, c)| !(c.is_ascii_digit() || (*i == 0 && *c == '-')))
                .map(|(i, _)| i)
                .unwrap_or(rest.len());
            let amount: i64 = rest[..digits_end].parse().map_err(|_| invalid())?;
            rest = rest[digits_end..].trim_start();
            let unit_end = rest
                .find(|c: char| c.is_whitespace() || c.is_ascii_digit())
                .unwrap_or(rest.len());
            let unit = Self::unit_turns(&rest[..unit_end]).ok_or_else(invalid)?;
            total = total.saturating_add(amount.saturating_mul(unit));
            rest = rest[unit_end..].trim_start();
        }
        Ok(Self(total))
    }
}

impl fmt::Display for TimeDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_permanent() {
            return write!(f, "PERMANENT");
        }
        let t = self.0;
        if t != 0 && t % 86_400 == 0 {
            write!(f, "{} d", t / 86_400)
        } else if t != 0 && t % 3600 == 0 {
            write!(f, "{} h", t / 3600)
        } else if t != 0 && t % 60 == 0 {
            write!(f, "{} m", t / 60)
        } else {
            write!(f, "{t} t")
        }
    }
}

/// An absolute point in game time: turns since the start of the game.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TimePoint(i64);

impl TimePoint {
    /// A point `turns` after the start of the game.
    pub const fn from_turn(turns: i64) -> Self {
        Self(turns)
    }

    /// Turns since the start of the game.
    pub fn turn(self) -> i64 {
        self.0
    }

    /// Whole days since the start of the game.
    pub fn days(self) -> i64 {
        self.0 / 86_400
    }

    /// Whether the hour of day falls in daylight (06:00 to 20:00).
    pub fn is_day(self) -> bool {
        let hour = (self.0.rem_euclid(86_400)) / 3600;
        (6..20).contains(&hour)
    }
}

impl Add<TimeDuration> for TimePoint {
    type Output = Self;

    fn add(self, rhs: TimeDuration) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sub for TimePoint {
    type Output = TimeDuration;

    fn sub(self, rhs: Self) -> TimeDuration {
        TimeDuration(self.0.saturating_sub(rhs.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_unit_pairs() {
        assert_eq!(TimeDuration::parse("5 m"), Ok(TimeDuration::from_minutes(5)));
        assert_eq!(
            TimeDuration::parse("1 h 30 m"),
            Ok(TimeDuration::from_minutes(90))
        );
        assert_eq!(TimeDuration::parse("2days"), Ok(TimeDuration::from_days(2)));
        assert_eq!(TimeDuration::parse("12"), Ok(TimeDuration::from_turns(12)));
    }

    #[test]
    fn parse_permanent() {
        assert!(TimeDuration::parse("PERMANENT").unwrap().is_permanent());
    }

    #[test]
    fn parse_rejects_unknown_units() {
        assert!(TimeDuration::parse("3 fortnights").is_err());
        assert!(TimeDuration::parse("").is_err());
        assert!(TimeDuration::parse("m").is_err());
    }

    #[test]
    fn display_picks_largest_unit() {
        assert_eq!(TimeDuration::from_hours(2).to_string(), "2 h");
        assert_eq!(TimeDuration::from_turns(61).to_string(), "61 t");
        assert_eq!(TimeDuration::from_days(1).to_string(), "1 d");
    }

    #[test]
    fn point_arithmetic() {
        let start = TimePoint::from_turn(100);
        let later = start + TimeDuration::from_minutes(1);
        assert_eq!(later.turn(), 160);
        assert_eq!(later - start, TimeDuration::from_turns(60));
    }

    #[test]
    fn daylight() {
        assert!(!TimePoint::from_turn(0).is_day());
        assert!(TimePoint::from_turn(12 * 3600).is_day());
    }

    proptest::proptest! {
        #[test]
        fn displayed_durations_parse_back(turns in 0i64..1_000_000_000) {
            let d = TimeDuration::from_turns(turns);
            proptest::prop_assert_eq!(TimeDuration::parse(&d.to_string()), Ok(d));
        }
    }
}
