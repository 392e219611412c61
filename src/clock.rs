//! Looping animation clock.

use crate::time::{TimeDuration, TimeInstant};

/// Result of advancing the clock by one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick<D> {
    /// Elapsed time within the current loop.
    pub elapsed: D,
    /// The loop restarted on this tick.
    pub wrapped: bool,
}

/// Elapsed-time clock for one visualizer.
///
/// The first tick after creation or [`reset`](Self::reset) pins the start
/// time to that tick. Once more than `duration` has elapsed the clock
/// restarts at the current instant, so the scanline loops instead of
/// running off the end.
#[derive(Clone, Copy)]
pub struct AnimationClock<I: TimeInstant> {
    start: Option<I>,
    elapsed: I::Duration,
    duration: I::Duration,
}

impl<I: TimeInstant> AnimationClock<I> {
    pub fn new(duration: I::Duration) -> Self {
        Self {
            start: None,
            elapsed: I::Duration::ZERO,
            duration,
        }
    }

    /// Advances the clock to `now`.
    pub fn tick(&mut self, now: I) -> Tick<I::Duration> {
        let start = *self.start.get_or_insert(now);
        let mut elapsed = now.duration_since(start);
        let mut wrapped = false;

        if elapsed.as_millis() > self.duration.as_millis() {
            elapsed = I::Duration::ZERO;
            self.start = Some(now);
            wrapped = true;
        }

        self.elapsed = elapsed;
        Tick { elapsed, wrapped }
    }

    /// Zeroes the clock; the next tick starts a fresh loop.
    pub fn reset(&mut self) {
        self.start = None;
        self.elapsed = I::Duration::ZERO;
    }

    /// Changes the loop length. Takes effect on the next tick.
    pub fn set_duration(&mut self, duration: I::Duration) {
        self.duration = duration;
    }

    pub fn duration(&self) -> I::Duration {
        self.duration
    }

    pub fn elapsed(&self) -> I::Duration {
        self.elapsed
    }

    /// Whether the clock has been ticked since the last reset.
    pub fn is_started(&self) -> bool {
        self.start.is_some()
    }

    /// Fraction of the loop completed, in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        let duration = self.duration.as_millis();
        if duration == 0 {
            return 0.0;
        }
        (self.elapsed.as_millis() as f32 / duration as f32).clamp(0.0, 1.0)
    }

    /// Maps elapsed time onto `[0, total_time]`.
    pub fn abstract_time(&self, total_time: f32) -> f32 {
        self.progress() * total_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct Ms(u64);

    impl TimeDuration for Ms {
        const ZERO: Self = Ms(0);

        fn as_millis(&self) -> u64 {
            self.0
        }

        fn from_millis(millis: u64) -> Self {
            Ms(millis)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    struct At(u64);

    impl TimeInstant for At {
        type Duration = Ms;

        fn duration_since(&self, earlier: Self) -> Ms {
            Ms(self.0.saturating_sub(earlier.0))
        }
    }

    #[test]
    fn first_tick_pins_start() {
        let mut clock = AnimationClock::<At>::new(Ms(1000));
        assert!(!clock.is_started());

        let tick = clock.tick(At(5000));
        assert_eq!(tick.elapsed, Ms(0));
        assert!(!tick.wrapped);
        assert!(clock.is_started());

        let tick = clock.tick(At(5250));
        assert_eq!(tick.elapsed, Ms(250));
        assert_eq!(clock.abstract_time(20.0), 5.0);
    }

    #[test]
    fn wraps_after_duration_exceeded() {
        let mut clock = AnimationClock::<At>::new(Ms(1000));
        clock.tick(At(0));

        // Exactly the duration is still inside the loop.
        let tick = clock.tick(At(1000));
        assert_eq!(tick.elapsed, Ms(1000));
        assert!(!tick.wrapped);

        let tick = clock.tick(At(1001));
        assert_eq!(tick.elapsed, Ms(0));
        assert!(tick.wrapped);
        assert_eq!(clock.abstract_time(22.0), 0.0);

        // The loop restarted at 1001.
        let tick = clock.tick(At(1101));
        assert_eq!(tick.elapsed, Ms(100));
    }

    #[test]
    fn reset_restarts_from_next_tick() {
        let mut clock = AnimationClock::<At>::new(Ms(1000));
        clock.tick(At(0));
        clock.tick(At(600));
        clock.reset();
        assert_eq!(clock.elapsed(), Ms(0));

        let tick = clock.tick(At(900));
        assert_eq!(tick.elapsed, Ms(0));
    }

    #[test]
    fn zero_duration_reports_no_progress() {
        let mut clock = AnimationClock::<At>::new(Ms(0));
        clock.tick(At(0));
        assert_eq!(clock.progress(), 0.0);
    }
}
