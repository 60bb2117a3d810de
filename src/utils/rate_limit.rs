//! Strict request spacing for E-utilities.
//!
//! NCBI allows about 3 requests per second without an API key and 10 with one.
//! The limiter is a GCRA quota of one cell per period with a burst of one, so
//! consecutive requests are always at least one period apart, including the
//! first request after an idle stretch.

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use nonzero_ext::nonzero;
use std::sync::Arc;
use std::time::Duration;

/// Minimum spacing with an API key (10 requests per second)
pub const SPACING_WITH_API_KEY: Duration = Duration::from_millis(100);

/// Minimum spacing without an API key (about 3 requests per second)
pub const SPACING_WITHOUT_API_KEY: Duration = Duration::from_millis(340);

type DirectLimiter = Governor<NotKeyed, InMemoryState, DefaultClock>;

/// Shared minimum-interval limiter.
///
/// Clones share one state, so every holder serialises through the same slot.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Option<Arc<DirectLimiter>>,
    spacing: Duration,
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("spacing", &self.spacing)
            .field("limited", &self.inner.is_some())
            .finish()
    }
}

impl RateLimiter {
    /// Limiter enforcing `spacing` between requests; zero disables limiting
    pub fn new(spacing: Duration) -> Self {
        let inner = Quota::with_period(spacing)
            .map(|quota| Arc::new(Governor::direct(quota.allow_burst(nonzero!(1u32)))));
        Self { inner, spacing }
    }

    /// Limiter for NCBI's published ceilings
    pub fn for_api_key(has_api_key: bool) -> Self {
        Self::new(if has_api_key {
            SPACING_WITH_API_KEY
        } else {
            SPACING_WITHOUT_API_KEY
        })
    }

    /// Limiter that never waits
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn spacing(&self) -> Duration {
        self.spacing
    }

    /// Wait until the next request slot is available
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.inner {
            limiter.until_ready().await;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::for_api_key(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_spacing_selection() {
        assert_eq!(RateLimiter::for_api_key(true).spacing(), SPACING_WITH_API_KEY);
        assert_eq!(
            RateLimiter::for_api_key(false).spacing(),
            SPACING_WITHOUT_API_KEY
        );
        assert_eq!(RateLimiter::unlimited().spacing(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_requests_are_spaced() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        // first slot is immediate, the next two wait one period each
        assert!(start.elapsed() >= Duration::from_millis(95));
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let limiter = RateLimiter::new(Duration::from_millis(50));
        let other = limiter.clone();
        let start = Instant::now();
        limiter.acquire().await;
        other.acquire().await;
        assert!(start.elapsed() >= Duration::from_millis(45));
    }

    #[tokio::test]
    async fn test_unlimited_never_waits() {
        let limiter = RateLimiter::unlimited();
        let start = Instant::now();
        for _ in 0..20 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() < Duration::from_millis(50));
    }
}
