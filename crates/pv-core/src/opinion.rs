use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// How an NPC feels about the other speaker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Opinion {
    /// Trust in the other speaker.
    pub trust: i32,
    /// Fear of the other speaker.
    pub fear: i32,
    /// How valuable the other speaker is considered.
    pub value: i32,
    /// Anger towards the other speaker.
    pub anger: i32,
}

impl Opinion {
    /// Create an opinion from its four fields.
    pub fn new(trust: i32, fear: i32, value: i32, anger: i32) -> Self {
        Self {
            trust,
            fear,
            value,
            anger,
        }
    }

    /// Whether every field is zero.
    pub fn is_zero(&self) -> bool {
        *self == Self::default()
    }

    /// Treat each field as a divisor of `mission_value`.
    ///
    /// A zero field contributes nothing.
    pub fn scaled_by(&self, mission_value: i32) -> Self {
        let scale = |f: i32| if f != 0 { mission_value / f } else { 0 };
        Self {
            trust: scale(self.trust),
            fear: scale(self.fear),
            value: scale(self.value),
            anger: scale(self.anger),
        }
    }
}

impl Add for Opinion {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            trust: self.trust.saturating_add(rhs.trust),
            fear: self.fear.saturating_add(rhs.fear),
            value: self.value.saturating_add(rhs.value),
            anger: self.anger.saturating_add(rhs.anger),
        }
    }
}

impl AddAssign for Opinion {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

/// Convert a mission's cash value into favor points.
///
/// The square root of the value in whole currency units, rounded.
pub fn cash_to_favor(cash: i64) -> i32 {
    if cash <= 0 {
        return 0;
    }
    (cash as f64 / 100.0).sqrt().round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_skips_zero_fields() {
        let delta = Opinion::new(2, 0, -5, 0).scaled_by(10);
        assert_eq!(delta, Opinion::new(5, 0, -2, 0));
    }

    #[test]
    fn add_assign_sums_fields() {
        let mut op = Opinion::new(1, 1, 1, 1);
        op += Opinion::new(1, -1, 2, 0);
        assert_eq!(op, Opinion::new(2, 0, 3, 1));
    }

    #[test]
    fn favor_is_square_root_of_units() {
        assert_eq!(cash_to_favor(10_000), 10);
        assert_eq!(cash_to_favor(250_000), 50);
        assert_eq!(cash_to_favor(0), 0);
        assert_eq!(cash_to_favor(-400), 0);
    }

    #[test]
    fn is_zero() {
        assert!(Opinion::default().is_zero());
        assert!(!Opinion::new(0, 0, 0, 1).is_zero());
    }
}
