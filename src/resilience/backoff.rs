//! Exponential backoff and the sleep capability used between retries.

use std::time::Duration;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use rand::Rng;

use crate::config::RetryConfig;

/// Delay schedule: `base, base*m, base*m^2, ...`, each capped at `max`.
#[derive(Debug, Clone)]
pub struct Backoff {
    next: Duration,
    multiplier: f64,
    max: Duration,
    jitter: bool,
}

impl Backoff {
    pub fn new(base: Duration, multiplier: f64, max: Duration) -> Self {
        Self {
            next: base.min(max),
            multiplier: multiplier.max(1.0),
            max,
            jitter: false,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            jitter: config.jitter,
            ..Self::new(config.base_delay(), config.backoff_multiplier, config.max_delay())
        }
    }

    /// Delay to wait before the upcoming retry; advances the schedule.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        // saturate at `max` when the product leaves the `Duration` range
        self.next = Duration::try_from_secs_f64(self.next.as_secs_f64() * self.multiplier)
            .map_or(self.max, |scaled| scaled.min(self.max));
        if self.jitter {
            with_jitter(delay)
        } else {
            delay
        }
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        Some(self.next_delay())
    }
}

/// Apply 0 to 10% of additional random delay.
fn with_jitter(delay: Duration) -> Duration {
    let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let jitter_range = delay_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };
    Duration::from_millis(delay_ms.saturating_add(jitter))
}

/// Suspends the current task between retry attempts.
///
/// Injected so tests can observe or skip delays.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()>;
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    fn sleep(&self, duration: Duration) -> BoxFuture<'static, ()> {
        tokio::time::sleep(duration).boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_schedule_is_capped() {
        let delays: Vec<u128> = Backoff::new(
            Duration::from_millis(100),
            2.0,
            Duration::from_millis(400),
        )
        .take(5)
        .map(|d| d.as_millis())
        .collect();
        assert_eq!(delays, vec![100, 200, 400, 400, 400]);
    }

    #[test]
    fn test_base_above_max_is_capped() {
        let mut backoff = Backoff::new(Duration::from_secs(5), 2.0, Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
    }

    #[test]
    fn test_multiplier_one_is_constant() {
        let delays: Vec<_> = Backoff::new(Duration::from_millis(250), 1.0, Duration::from_secs(10))
            .take(3)
            .collect();
        assert!(delays.iter().all(|d| *d == Duration::from_millis(250)));
    }

    #[test]
    fn test_huge_multiplier_saturates_at_max() {
        let delays: Vec<u128> = Backoff::new(
            Duration::from_millis(100),
            1e30,
            Duration::from_millis(400),
        )
        .take(4)
        .map(|d| d.as_millis())
        .collect();
        assert_eq!(delays, vec![100, 400, 400, 400]);
    }

    #[test]
    fn test_unbounded_max_does_not_overflow() {
        let mut backoff = Backoff::new(Duration::from_secs(1), f64::MAX, Duration::MAX);
        assert_eq!(backoff.next_delay(), Duration::from_secs(1));
        assert_eq!(backoff.next_delay(), Duration::MAX);
        assert_eq!(backoff.next_delay(), Duration::MAX);
    }

    #[test]
    fn test_jitter_bounds() {
        let config = RetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 1000,
            jitter: true,
            ..RetryConfig::default()
        };
        let mut backoff = Backoff::from_config(&config);
        for _ in 0..20 {
            let delay = backoff.next_delay().as_millis();
            assert!((1000..1100).contains(&delay), "delay {} out of range", delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_tokio_sleeper_advances_clock() {
        let start = tokio::time::Instant::now();
        TokioSleeper.sleep(Duration::from_millis(300)).await;
        assert!(start.elapsed() >= Duration::from_millis(300));
    }
}
