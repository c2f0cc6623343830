use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::direct::NotKeyed;
use governor::state::InMemoryState;
use governor::{Quota, RateLimiter};

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Spaces outgoing calls to one per interval.
///
/// Callers await [`RequestPacer::ready`] before each request. An unpaced
/// pacer returns immediately.
#[derive(Clone)]
pub struct RequestPacer {
    limiter: Option<Arc<DirectRateLimiter>>,
    interval: Duration,
}

impl RequestPacer {
    pub fn every(interval: Duration) -> Self {
        let limiter = quota_for_interval(interval).map(|quota| Arc::new(RateLimiter::direct(quota)));
        Self { limiter, interval }
    }

    pub fn unpaced() -> Self {
        Self {
            limiter: None,
            interval: Duration::ZERO,
        }
    }

    pub const fn is_paced(&self) -> bool {
        self.limiter.is_some()
    }

    /// Waits until the next call is allowed.
    pub async fn ready(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }
}

impl std::fmt::Debug for RequestPacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPacer")
            .field("interval", &self.interval)
            .field("paced", &self.is_paced())
            .finish()
    }
}

fn quota_for_interval(interval: Duration) -> Option<Quota> {
    if interval.is_zero() {
        return None;
    }
    Quota::with_period(interval).map(|quota| quota.allow_burst(NonZeroU32::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn second_call_within_interval_is_held_back() {
        let pacer = RequestPacer::every(Duration::from_secs(60));
        pacer.ready().await;

        let second = tokio::time::timeout(Duration::from_millis(200), pacer.ready()).await;
        assert!(second.is_err(), "second call should wait for the interval");
    }

    #[tokio::test]
    async fn unpaced_pacer_never_blocks() {
        let pacer = RequestPacer::unpaced();

        assert!(!pacer.is_paced());
        for _ in 0..5 {
            tokio::time::timeout(Duration::from_millis(50), pacer.ready())
                .await
                .expect("unpaced calls never wait");
        }
    }

    #[test]
    fn zero_interval_means_unpaced() {
        assert!(!RequestPacer::every(Duration::ZERO).is_paced());
    }

    #[tokio::test]
    async fn ready_returns_immediately_for_first_call() {
        let pacer = RequestPacer::every(Duration::from_secs(30));
        tokio::time::timeout(Duration::from_millis(500), pacer.ready())
            .await
            .expect("first call should not wait");
    }
}
