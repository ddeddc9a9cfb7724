use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

const NANOS_PER_SECOND: i64 = 1_000_000_000;
const SECONDS_PER_DAY: i64 = 86_400;

/// Instant on the global simulation clock, in nanoseconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimTime(pub i64);

/// Signed span of simulation time, in nanoseconds.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SimDuration(pub i64);

impl SimTime {
    pub const ZERO: Self = Self(0);

    pub const fn from_ns(ns: i64) -> Self {
        Self(ns)
    }

    pub const fn as_ns(self) -> i64 {
        self.0
    }

    /// Time elapsed since the clock origin.
    pub const fn since_origin(self) -> SimDuration {
        SimDuration(self.0)
    }
}

impl SimDuration {
    pub const ZERO: Self = Self(0);

    pub const fn from_ns(ns: i64) -> Self {
        Self(ns)
    }

    /// Saturates at the `i64` nanosecond range like the arithmetic impls.
    pub const fn seconds(s: i64) -> Self {
        Self(s.saturating_mul(NANOS_PER_SECOND))
    }

    pub fn seconds_f64(s: f64) -> Self {
        Self((s * NANOS_PER_SECOND as f64).round() as i64)
    }

    pub const fn hours(h: i64) -> Self {
        Self::seconds(h.saturating_mul(3_600))
    }

    pub const fn days(d: i64) -> Self {
        Self::seconds(d.saturating_mul(SECONDS_PER_DAY))
    }

    pub fn days_f64(d: f64) -> Self {
        Self::seconds_f64(d * SECONDS_PER_DAY as f64)
    }

    /// Julian years (365.25 days).
    pub fn years(y: i64) -> Self {
        Self::days_f64(y as f64 * 365.25)
    }

    pub const fn as_ns(self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / NANOS_PER_SECOND as f64
    }

    pub fn as_days_f64(self) -> f64 {
        self.as_secs_f64() / SECONDS_PER_DAY as f64
    }
}

impl Add<SimDuration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: SimDuration) -> SimTime {
        SimTime(self.0.saturating_add(rhs.0))
    }
}

impl Sub<SimDuration> for SimTime {
    type Output = SimTime;

    fn sub(self, rhs: SimDuration) -> SimTime {
        SimTime(self.0.saturating_sub(rhs.0))
    }
}

impl Sub for SimTime {
    type Output = SimDuration;

    fn sub(self, rhs: SimTime) -> SimDuration {
        SimDuration(self.0.saturating_sub(rhs.0))
    }
}

impl Add for SimDuration {
    type Output = SimDuration;

    fn add(self, rhs: SimDuration) -> SimDuration {
        SimDuration(self.0.saturating_add(rhs.0))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t+{:.3}s", self.since_origin().as_secs_f64())
    }
}

impl fmt::Display for SimDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s", self.as_secs_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_constructors_agree() {
        assert_eq!(SimDuration::hours(24), SimDuration::days(1));
        assert_eq!(SimDuration::seconds(90), SimDuration::seconds_f64(90.0));
        assert_eq!(SimDuration::days_f64(0.5), SimDuration::hours(12));
    }

    #[test]
    fn year_is_julian() {
        let y = SimDuration::years(1);
        assert!((y.as_days_f64() - 365.25).abs() < 1e-9);
    }

    #[test]
    fn time_arithmetic() {
        let epoch = SimTime::from_ns(1_000);
        let later = epoch + SimDuration::from_ns(500);
        assert_eq!(later.as_ns(), 1_500);
        assert_eq!(later - epoch, SimDuration::from_ns(500));
        assert_eq!(later - SimDuration::from_ns(1_500), SimTime::ZERO);
    }

    #[test]
    fn arithmetic_saturates() {
        let t = SimTime(i64::MAX) + SimDuration::seconds(1);
        assert_eq!(t.as_ns(), i64::MAX);
    }

    #[test]
    fn large_constructors_saturate() {
        assert_eq!(SimDuration::days(200_000), SimDuration::from_ns(i64::MAX));
        assert_eq!(SimDuration::hours(i64::MIN), SimDuration::from_ns(i64::MIN));
        assert_eq!(SimDuration::seconds(-3), SimDuration::from_ns(-3_000_000_000));
    }

    #[test]
    fn serializes_as_nanoseconds() {
        let json = serde_json::to_string(&SimDuration::seconds(2)).unwrap();
        assert_eq!(json, "2000000000");
    }
}
