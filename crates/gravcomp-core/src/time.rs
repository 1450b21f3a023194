use std::fmt;
use std::ops::Add;
use std::time::Duration;

// ---------------------------------------------------------------------------
// ControlTime
// ---------------------------------------------------------------------------

/// Integer-nanosecond control clock.
///
/// Passed to every controller update. Kept as a `u64` nanosecond count so that
/// long-running loops do not drift through floating-point accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct ControlTime {
    nanos: u64,
}

impl ControlTime {
    /// Time zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { nanos: 0 }
    }

    /// Create a `ControlTime` from seconds. Negative inputs clamp to zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn from_secs(secs: f64) -> Self {
        Self {
            nanos: (secs * 1_000_000_000.0) as u64,
        }
    }

    /// Elapsed time since zero.
    #[must_use]
    pub const fn to_duration(&self) -> Duration {
        Duration::from_nanos(self.nanos)
    }
}

// -- Operator impls --

impl Add<Duration> for ControlTime {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        let delta = u64::try_from(rhs.as_nanos()).unwrap_or(u64::MAX);
        Self {
            nanos: self.nanos.saturating_add(delta),
        }
    }
}

impl fmt::Display for ControlTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total_secs = self.nanos / 1_000_000_000;
        let remaining_nanos = self.nanos % 1_000_000_000;
        let millis = remaining_nanos / 1_000_000;
        let micros = (remaining_nanos % 1_000_000) / 1_000;
        write!(f, "{total_secs}.{millis:03}{micros:03}s")
    }
}

// ---------------------------------------------------------------------------
// LoopClock
// ---------------------------------------------------------------------------

/// Fixed-period tick source for a control loop.
///
/// Every call to [`tick`](Self::tick) advances the time by one period and
/// returns the `(time, period)` pair a controller update expects.
#[derive(Debug, Clone)]
pub struct LoopClock {
    time: ControlTime,
    period: Duration,
    ticks: u64,
}

impl LoopClock {
    /// Create a clock ticking every `period`.
    #[must_use]
    pub const fn new(period: Duration) -> Self {
        Self {
            time: ControlTime::new(),
            period,
            ticks: 0,
        }
    }

    /// Create a clock from a rate in Hz. Returns `None` for non-positive or
    /// non-finite rates.
    #[must_use]
    pub fn from_rate_hz(rate_hz: f64) -> Option<Self> {
        if !rate_hz.is_finite() || rate_hz <= 0.0 {
            return None;
        }
        Some(Self::new(Duration::from_secs_f64(1.0 / rate_hz)))
    }

    /// Advance by one period.
    pub fn tick(&mut self) -> (ControlTime, Duration) {
        self.time = self.time + self.period;
        self.ticks += 1;
        (self.time, self.period)
    }

    /// Current time.
    #[must_use]
    pub const fn time(&self) -> ControlTime {
        self.time
    }

    /// Tick period.
    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }

    /// Number of ticks dispensed so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // ---- ControlTime ----

    #[test]
    fn control_time_new_is_zero() {
        assert_eq!(ControlTime::new().to_duration(), Duration::ZERO);
        assert_eq!(ControlTime::new(), ControlTime::default());
    }

    #[test]
    fn control_time_from_secs() {
        let t = ControlTime::from_secs(2.5);
        assert_eq!(t.to_duration(), Duration::from_millis(2_500));
        assert_eq!(ControlTime::from_secs(-1.0), ControlTime::new());
    }

    #[test]
    fn control_time_add_duration_saturates() {
        let t = ControlTime::from_secs(1.0) + Duration::from_nanos(500);
        assert_eq!(t.to_duration(), Duration::from_nanos(1_000_000_500));
        let end = ControlTime::from_secs(1.0) + Duration::MAX;
        assert_eq!(end.to_duration(), Duration::from_nanos(u64::MAX));
    }

    #[test]
    fn control_time_display() {
        let t = ControlTime::new() + Duration::from_nanos(1_234_567_000);
        assert_eq!(t.to_string(), "1.234567s");
    }

    // ---- LoopClock ----

    #[test]
    fn loop_clock_ticks_by_period() {
        let mut clock = LoopClock::new(Duration::from_millis(1));
        let (t1, p1) = clock.tick();
        let (t2, _) = clock.tick();
        assert_eq!(p1, Duration::from_millis(1));
        assert_eq!(t1.to_duration(), Duration::from_millis(1));
        assert_eq!(t2.to_duration(), Duration::from_millis(2));
        assert_eq!(clock.ticks(), 2);
        assert_eq!(clock.time(), t2);
    }

    #[test]
    fn loop_clock_from_rate() {
        let clock = LoopClock::from_rate_hz(500.0).unwrap();
        assert_eq!(clock.period(), Duration::from_millis(2));
    }

    #[test]
    fn loop_clock_rejects_bad_rate() {
        assert!(LoopClock::from_rate_hz(0.0).is_none());
        assert!(LoopClock::from_rate_hz(-10.0).is_none());
        assert!(LoopClock::from_rate_hz(f64::NAN).is_none());
    }
}
