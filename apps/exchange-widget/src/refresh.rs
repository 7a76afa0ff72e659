use std::sync::Arc;
use std::time::Duration;

use vdom_core::Clock;

/// Tracks when the next periodic rate refresh is due.
pub struct RefreshSchedule<C: Clock> {
    clock: Arc<C>,
    interval: Duration,
    last: C::Instant,
}

impl<C: Clock> RefreshSchedule<C> {
    pub fn new(clock: Arc<C>, interval: Duration) -> Self {
        let last = clock.now();
        Self {
            clock,
            interval,
            last,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_due(&self) -> bool {
        self.elapsed() >= self.interval
    }

    /// Time left until the next refresh; zero once due.
    pub fn remaining(&self) -> Duration {
        self.interval.saturating_sub(self.elapsed())
    }

    /// Restarts the interval from now.
    pub fn mark(&mut self) {
        self.last = self.clock.now();
    }

    fn elapsed(&self) -> Duration {
        Duration::from_millis(self.clock.elapsed_millis(self.last))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use super::*;

    #[derive(Default)]
    struct ManualClock {
        millis: AtomicU64,
    }

    impl ManualClock {
        fn advance(&self, millis: u64) {
            self.millis.fetch_add(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        type Instant = u64;

        fn now(&self) -> u64 {
            self.millis.load(Ordering::SeqCst)
        }

        fn elapsed_millis(&self, since: u64) -> u64 {
            self.now().saturating_sub(since)
        }
    }

    #[test]
    fn refresh_becomes_due_after_the_interval() {
        let clock = Arc::new(ManualClock::default());
        let mut schedule = RefreshSchedule::new(Arc::clone(&clock), Duration::from_millis(100));
        assert!(!schedule.is_due());

        clock.advance(60);
        assert_eq!(schedule.remaining(), Duration::from_millis(40));

        clock.advance(40);
        assert!(schedule.is_due());
        assert_eq!(schedule.remaining(), Duration::ZERO);

        schedule.mark();
        assert!(!schedule.is_due());
        assert_eq!(schedule.interval(), Duration::from_millis(100));
    }
}
