use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Microseconds in one day.
pub const MICROS_PER_DAY: u64 = 86_400_000_000;

/// Logical clock reading in microseconds.
///
/// The ledger never reads a wall clock itself: every operation receives the
/// current `Timestamp` from its caller, which keeps settlement deterministic.
/// Deadlines such as the unstaking unlock time are stored as `Timestamp`s.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    pub const fn from_micros(micros: u64) -> Self {
        Self(micros)
    }

    /// Duration of `days` whole days, saturating at the maximum.
    pub const fn from_days(days: u64) -> Self {
        Self(days.saturating_mul(MICROS_PER_DAY))
    }

    /// The zero timestamp (genesis).
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Read the wall clock. Only front ends should call this.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_micros() as u64;
        Self(micros)
    }

    pub const fn as_micros(&self) -> u64 {
        self.0
    }

    /// Add a duration in microseconds, saturating at the maximum.
    pub const fn saturating_add_micros(&self, micros: u64) -> Self {
        Self(self.0.saturating_add(micros))
    }

    /// Returns `true` once `self` has reached `deadline`.
    pub fn has_reached(&self, deadline: Timestamp) -> bool {
        *self >= deadline
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({}us)", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn days_convert_to_micros() {
        assert_eq!(Timestamp::from_days(1).as_micros(), 86_400_000_000);
        assert_eq!(Timestamp::from_days(0), Timestamp::zero());
        assert_eq!(Timestamp::from_days(u64::MAX).as_micros(), u64::MAX);
    }

    #[test]
    fn has_reached_is_inclusive() {
        let deadline = Timestamp::from_micros(100);
        assert!(!Timestamp::from_micros(99).has_reached(deadline));
        assert!(Timestamp::from_micros(100).has_reached(deadline));
        assert!(Timestamp::from_micros(101).has_reached(deadline));
    }

    #[test]
    fn add_saturates() {
        let t = Timestamp::from_micros(u64::MAX - 1);
        assert_eq!(t.saturating_add_micros(10).as_micros(), u64::MAX);
    }

    #[test]
    fn now_produces_reasonable_timestamp() {
        // Should be after 2020-01-01.
        assert!(Timestamp::now().as_micros() > 1_577_836_800_000_000);
    }

    #[test]
    fn serde_is_transparent() {
        let t = Timestamp::from_micros(42);
        assert_eq!(serde_json::to_string(&t).unwrap(), "42");
    }
}
