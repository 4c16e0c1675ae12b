use std::time::Duration;
use std::time::SystemTime;

/// A source of wall-clock time.
///
/// Any `Fn() -> SystemTime` closure is a clock, which makes it easy to pin time
/// in tests.
pub trait ClockSource: Send + Sync {
    fn now(&self) -> SystemTime;
}

/// The operating system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    #[inline]
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }
}

impl<F> ClockSource for F
where
    F: Fn() -> SystemTime + Send + Sync,
{
    #[inline]
    fn now(&self) -> SystemTime {
        self()
    }
}

/// Compares the current time against the sale start instant.
#[derive(Clone, Copy, Debug)]
pub struct ClockGate;

impl ClockGate {
    /// Returns `true` once `now` has reached `start_time`.
    ///
    /// The start instant itself counts as open.
    #[inline]
    pub fn is_open(now: SystemTime, start_time: SystemTime) -> bool {
        now >= start_time
    }

    /// How long until the gate opens, or `None` if it is already open.
    pub fn opens_in(now: SystemTime, start_time: SystemTime) -> Option<Duration> {
        match start_time.duration_since(now) {
            Ok(remaining) if !remaining.is_zero() => Some(remaining),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_opens_at_the_exact_start_instant() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);

        assert!(!ClockGate::is_open(start - Duration::from_nanos(1), start));
        assert!(ClockGate::is_open(start, start));
        assert!(ClockGate::is_open(start + Duration::from_secs(1), start));
    }

    #[test]
    fn test_opens_in() {
        let start = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000);

        assert_eq!(
            ClockGate::opens_in(start - Duration::from_secs(30), start),
            Some(Duration::from_secs(30))
        );
        assert_eq!(ClockGate::opens_in(start, start), None);
        assert_eq!(ClockGate::opens_in(start + Duration::from_secs(5), start), None);
    }

    #[test]
    fn test_closure_clock() {
        let pinned = SystemTime::UNIX_EPOCH + Duration::from_secs(42);
        let clock = move || pinned;

        assert_eq!(ClockSource::now(&clock), pinned);
    }
}
