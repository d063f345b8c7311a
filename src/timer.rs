use std::{
    cell::Cell,
    rc::Rc,
    time::{Duration, Instant},
};

use crate::config::TimerMode;

const TIMER_DEC_PER_SECOND: u64 = 60;
const TIMER_PERIOD: Duration = Duration::from_nanos(1_000_000_000 / TIMER_DEC_PER_SECOND);

/// Monotonic time source for the 60 Hz timers.
pub trait Clock {
    /// Time elapsed since the clock was created.
    fn now(&self) -> Duration;
}

pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
}

/// Logical clock advanced by the host. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    /// Advances by `n` whole timer periods.
    pub fn advance_ticks(&self, n: u32) {
        self.advance(TIMER_PERIOD * n);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.elapsed.get()
    }
}

#[derive(Debug, Default)]
pub struct Timer {
    pub count: u8,
}

impl Timer {
    pub fn new(init_count: u8) -> Self {
        Self { count: init_count }
    }

    pub fn set(&mut self, value: u8) {
        self.count = value;
    }

    pub fn decrement_by(&mut self, n: u64) {
        self.count = self.count.saturating_sub(n.min(u8::MAX as u64) as u8);
    }
}

#[derive(Debug)]
pub struct Timers {
    pub delay: Timer,
    pub sound: Timer,
    mode: TimerMode,
    last_updated: Duration,
}

impl Timers {
    pub fn new(mode: TimerMode, now: Duration) -> Self {
        Self {
            delay: Timer::new(0),
            sound: Timer::new(0),
            mode,
            last_updated: now,
        }
    }

    pub fn reset(&mut self, now: Duration) {
        self.delay.set(0);
        self.sound.set(0);
        self.last_updated = now;
    }

    /// Called once per engine step. Returns how many periods were applied.
    pub fn sync(&mut self, now: Duration) -> u64 {
        let periods = match self.mode {
            TimerMode::PerStep => 1,
            TimerMode::WallClock => {
                let elapsed = now.saturating_sub(self.last_updated);
                let periods = (elapsed.as_nanos() / TIMER_PERIOD.as_nanos()) as u64;
                // keep the remainder so slow hosts do not drift
                self.last_updated += TIMER_PERIOD * periods as u32;
                periods
            }
        };
        if periods > 0 {
            self.delay.decrement_by(periods);
            self.sound.decrement_by(periods);
        }
        periods
    }

    pub fn is_sound_active(&self) -> bool {
        self.sound.count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_clock_counts_whole_periods() {
        let clock = ManualClock::new();
        let mut timers = Timers::new(TimerMode::WallClock, clock.now());
        timers.delay.set(10);
        timers.sound.set(2);

        clock.advance(Duration::from_millis(10));
        assert_eq!(timers.sync(clock.now()), 0);
        assert_eq!(timers.delay.count, 10);

        // 10ms carried over + 30ms = 40ms -> two periods
        clock.advance(Duration::from_millis(30));
        assert_eq!(timers.sync(clock.now()), 2);
        assert_eq!(timers.delay.count, 8);
        assert_eq!(timers.sound.count, 0);
        assert!(!timers.is_sound_active());
    }

    #[test]
    fn many_syncs_without_time_do_nothing() {
        let clock = ManualClock::new();
        let mut timers = Timers::new(TimerMode::WallClock, clock.now());
        timers.delay.set(5);

        for _ in 0..1000 {
            timers.sync(clock.now());
        }
        assert_eq!(timers.delay.count, 5);
    }

    #[test]
    fn timers_never_go_below_zero() {
        let clock = ManualClock::new();
        let mut timers = Timers::new(TimerMode::WallClock, clock.now());
        timers.delay.set(3);

        clock.advance(Duration::from_secs(60));
        timers.sync(clock.now());
        assert_eq!(timers.delay.count, 0);
    }

    #[test]
    fn per_step_mode_ignores_clock() {
        let mut timers = Timers::new(TimerMode::PerStep, Duration::ZERO);
        timers.sound.set(2);

        timers.sync(Duration::ZERO);
        assert_eq!(timers.sound.count, 1);
        assert!(timers.is_sound_active());
        timers.sync(Duration::ZERO);
        timers.sync(Duration::ZERO);
        assert_eq!(timers.sound.count, 0);
    }
}
