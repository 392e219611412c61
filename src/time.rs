//! Time abstraction traits for platform-agnostic frame timing.
//!
//! The animation loop never reads a global clock. Hosts hand the
//! [`Visualizer`](crate::Visualizer) a [`TimeSource`]: a browser frame
//! callback, an embassy timer, or [`StdClock`] on desktop.

/// Trait for abstracting time sources.
pub trait TimeSource<I: TimeInstant> {
    /// Returns the current time instant.
    fn now(&self) -> I;
}

/// Trait abstraction for duration types.
pub trait TimeDuration: Copy + PartialEq {
    /// Zero duration constant.
    const ZERO: Self;

    /// Converts duration to milliseconds.
    fn as_millis(&self) -> u64;

    /// Creates duration from milliseconds.
    fn from_millis(millis: u64) -> Self;
}

/// Trait abstraction for instant types.
pub trait TimeInstant: Copy {
    /// Duration type for this instant.
    type Duration: TimeDuration;

    /// Calculates duration since an earlier instant.
    ///
    /// Implementations saturate to zero if `earlier` is actually later.
    fn duration_since(&self, earlier: Self) -> Self::Duration;
}

#[cfg(feature = "std")]
mod std_clock {
    use super::{TimeDuration, TimeInstant, TimeSource};

    /// Millisecond duration backed by [`std::time::Duration`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct StdDuration(pub std::time::Duration);

    impl TimeDuration for StdDuration {
        const ZERO: Self = StdDuration(std::time::Duration::ZERO);

        fn as_millis(&self) -> u64 {
            self.0.as_millis() as u64
        }

        fn from_millis(millis: u64) -> Self {
            StdDuration(std::time::Duration::from_millis(millis))
        }
    }

    /// Monotonic instant backed by [`std::time::Instant`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
    pub struct StdInstant(pub std::time::Instant);

    impl TimeInstant for StdInstant {
        type Duration = StdDuration;

        fn duration_since(&self, earlier: Self) -> Self::Duration {
            StdDuration(self.0.saturating_duration_since(earlier.0))
        }
    }

    /// Wall clock time source.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct StdClock;

    impl TimeSource<StdInstant> for StdClock {
        fn now(&self) -> StdInstant {
            StdInstant(std::time::Instant::now())
        }
    }
}

#[cfg(feature = "std")]
pub use std_clock::{StdClock, StdDuration, StdInstant};
