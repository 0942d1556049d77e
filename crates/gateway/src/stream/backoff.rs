use std::time::Duration;

use rand::Rng;

/// Exponential reconnect delay with jitter.
///
/// Attempt `n` waits a random duration between half and all of
/// `initial * 2^(n-1)`, capped at `max`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    initial: Duration,
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }

    /// Upper bound of the delay for an attempt, before jitter.
    pub fn ceiling(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        self.initial
            .checked_mul(1u32 << exponent)
            .unwrap_or(self.max)
            .min(self.max)
    }

    pub fn delay(&self, attempt: u32) -> Duration {
        let ceiling = self.ceiling(attempt);
        let floor = ceiling / 2;
        if ceiling <= floor {
            return ceiling;
        }
        rand::thread_rng().gen_range(floor..=ceiling)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ceiling_doubles_until_capped() {
        let backoff = Backoff::new(Duration::from_millis(500), Duration::from_secs(3));

        assert_eq!(backoff.ceiling(1), Duration::from_millis(500));
        assert_eq!(backoff.ceiling(2), Duration::from_millis(1000));
        assert_eq!(backoff.ceiling(3), Duration::from_millis(2000));
        assert_eq!(backoff.ceiling(4), Duration::from_secs(3));
        assert_eq!(backoff.ceiling(400), Duration::from_secs(3));
    }

    #[test]
    fn delay_stays_within_jitter_window() {
        let backoff = Backoff::new(Duration::from_millis(100), Duration::from_secs(10));

        for attempt in 1..8 {
            let delay = backoff.delay(attempt);
            let ceiling = backoff.ceiling(attempt);
            assert!(delay <= ceiling && delay >= ceiling / 2, "{delay:?} outside window");
        }
    }

    #[test]
    fn zero_initial_delay_never_sleeps() {
        let backoff = Backoff::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(backoff.delay(3), Duration::ZERO);
    }
}
