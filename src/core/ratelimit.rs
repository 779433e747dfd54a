//! Sliding-window admission control, independent of the daily quota.

use super::error::LimitError;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Endpoint category used when building scope keys for market data fetches.
pub const MARKET_DATA: &str = "market-data";

/// Scope key for a subject and endpoint category, or the shared global scope.
pub fn scope_key(subject_id: Option<&str>, category: &str) -> String {
    match subject_id {
        Some(id) => format!("subject:{id}:{category}"),
        None => format!("global:{category}"),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimit {
    pub requests_per_window: u32,
    pub window: Duration,
}

impl RateLimit {
    pub fn new(requests_per_window: u32, window: Duration) -> Self {
        Self {
            requests_per_window,
            window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Denied { retry_after: Duration },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    Fixed,
    #[default]
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Backoff,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// No retries: a denial is returned to the caller immediately.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            backoff: Backoff::Fixed,
            base_delay: Duration::ZERO,
        }
    }

    /// Wait before retry number `attempt` (0-based). Never shorter than `retry_after`.
    pub fn delay_for(&self, attempt: u32, retry_after: Duration) -> Duration {
        let backoff = match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        backoff.max(retry_after)
    }
}

/// Request timestamps for one scope, oldest first.
struct ScopeWindow {
    window: Duration,
    timestamps: VecDeque<Instant>,
}

impl ScopeWindow {
    fn new(window: Duration) -> Self {
        Self {
            window,
            timestamps: VecDeque::new(),
        }
    }

    /// Drops timestamps at or beyond the window edge.
    fn prune(&mut self, now: Instant) {
        while let Some(oldest) = self.timestamps.front() {
            if now.saturating_duration_since(*oldest) >= self.window {
                self.timestamps.pop_front();
            } else {
                break;
            }
        }
    }
}

/// Per-scope request timestamps within the trailing window. Scopes with no timestamps
/// left in their window are dropped, so idle subjects do not accumulate.
#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, ScopeWindow>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn check_and_reserve(&self, scope: &str, limit: RateLimit) -> Admission {
        self.check_and_reserve_at(scope, limit, Instant::now()).await
    }

    /// Prunes timestamps at or beyond the window edge, then admits and records `now` if
    /// the scope has room.
    pub async fn check_and_reserve_at(
        &self,
        scope: &str,
        limit: RateLimit,
        now: Instant,
    ) -> Admission {
        let mut windows = self.windows.lock().await;
        windows.retain(|_, scope_window| {
            scope_window.prune(now);
            !scope_window.timestamps.is_empty()
        });

        let scope_window = windows
            .entry(scope.to_string())
            .or_insert_with(|| ScopeWindow::new(limit.window));
        scope_window.window = limit.window;
        scope_window.prune(now);

        if scope_window.timestamps.len() < limit.requests_per_window as usize {
            scope_window.timestamps.push_back(now);
            return Admission::Allowed;
        }

        let retry_after = scope_window
            .timestamps
            .front()
            .map(|oldest| limit.window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(limit.window);
        if scope_window.timestamps.is_empty() {
            windows.remove(scope);
        }
        debug!(scope, ?retry_after, "Rate limit denied");
        Admission::Denied { retry_after }
    }

    /// Admits a request for `scope`, sleeping and re-checking on denial as allowed by
    /// `retry`. `bypass` skips the check entirely.
    pub async fn acquire(
        &self,
        scope: &str,
        limit: RateLimit,
        retry: &RetryPolicy,
        bypass: bool,
    ) -> Result<()> {
        if bypass {
            debug!(scope, "Rate limit bypassed");
            return Ok(());
        }

        let mut attempt = 0;
        loop {
            match self.check_and_reserve(scope, limit).await {
                Admission::Allowed => return Ok(()),
                Admission::Denied { retry_after } => {
                    if attempt >= retry.max_retries {
                        return Err(LimitError::RateLimited {
                            scope: scope.to_string(),
                            retry_after,
                        }
                        .into());
                    }
                    let delay = retry.delay_for(attempt, retry_after);
                    debug!(
                        "Attempt {}/{} rate limited for {}. Retrying in {:?}...",
                        attempt + 1,
                        retry.max_retries,
                        scope,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Number of reservations currently held for `scope`, without pruning.
    pub async fn in_flight(&self, scope: &str) -> usize {
        self.windows
            .lock()
            .await
            .get(scope)
            .map_or(0, |scope_window| scope_window.timestamps.len())
    }

    /// Number of scopes currently tracked.
    pub async fn tracked_scopes(&self) -> usize {
        self.windows.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::is_limit_error;

    fn limit() -> RateLimit {
        RateLimit::new(2, Duration::from_millis(1000))
    }

    #[test]
    fn test_scope_keys() {
        assert_eq!(scope_key(None, MARKET_DATA), "global:market-data");
        assert_eq!(scope_key(Some("alice"), "search"), "subject:alice:search");
    }

    #[tokio::test(start_paused = true)]
    async fn test_third_call_in_window_denied_with_retry_after() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        let ms = Duration::from_millis;

        assert_eq!(
            limiter.check_and_reserve_at("s", limit(), t0).await,
            Admission::Allowed
        );
        assert_eq!(
            limiter.check_and_reserve_at("s", limit(), t0 + ms(100)).await,
            Admission::Allowed
        );
        assert_eq!(
            limiter.check_and_reserve_at("s", limit(), t0 + ms(200)).await,
            Admission::Denied {
                retry_after: ms(800)
            }
        );
        // Denials do not take a slot.
        assert_eq!(limiter.in_flight("s").await, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_slides() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        let ms = Duration::from_millis;

        limiter.check_and_reserve_at("s", limit(), t0).await;
        limiter.check_and_reserve_at("s", limit(), t0 + ms(100)).await;

        // Exactly one window after the first call it has been pruned.
        assert_eq!(
            limiter.check_and_reserve_at("s", limit(), t0 + ms(1000)).await,
            Admission::Allowed
        );
        assert_eq!(
            limiter.check_and_reserve_at("s", limit(), t0 + ms(1050)).await,
            Admission::Denied {
                retry_after: ms(50)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_scopes_are_independent() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        for _ in 0..2 {
            limiter.check_and_reserve_at("a", limit(), t0).await;
        }
        assert!(matches!(
            limiter.check_and_reserve_at("a", limit(), t0).await,
            Admission::Denied { .. }
        ));
        assert_eq!(
            limiter.check_and_reserve_at("b", limit(), t0).await,
            Admission::Allowed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_scopes_are_dropped() {
        let limiter = RateLimiter::new();
        let t0 = Instant::now();
        let ms = Duration::from_millis;

        for subject in ["alice", "bob", "carol"] {
            let scope = scope_key(Some(subject), MARKET_DATA);
            limiter.check_and_reserve_at(&scope, limit(), t0).await;
        }
        assert_eq!(limiter.tracked_scopes().await, 3);

        // Once every window has passed, only the scope just checked remains.
        let dave = scope_key(Some("dave"), MARKET_DATA);
        limiter
            .check_and_reserve_at(&dave, limit(), t0 + ms(1000))
            .await;
        assert_eq!(limiter.tracked_scopes().await, 1);
        assert_eq!(limiter.in_flight(&dave).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_capacity_scope_is_not_kept() {
        let limiter = RateLimiter::new();
        let closed = RateLimit::new(0, Duration::from_millis(1000));
        assert_eq!(
            limiter.check_and_reserve("s", closed).await,
            Admission::Denied {
                retry_after: Duration::from_millis(1000)
            }
        );
        assert_eq!(limiter.tracked_scopes().await, 0);
    }

    #[test]
    fn test_retry_delays() {
        let ms = Duration::from_millis;
        let fixed = RetryPolicy {
            max_retries: 3,
            backoff: Backoff::Fixed,
            base_delay: ms(100),
        };
        assert_eq!(fixed.delay_for(0, ms(10)), ms(100));
        assert_eq!(fixed.delay_for(2, ms(10)), ms(100));
        assert_eq!(fixed.delay_for(0, ms(500)), ms(500));

        let exponential = RetryPolicy {
            backoff: Backoff::Exponential,
            ..fixed
        };
        assert_eq!(exponential.delay_for(0, ms(10)), ms(100));
        assert_eq!(exponential.delay_for(1, ms(10)), ms(200));
        assert_eq!(exponential.delay_for(3, ms(10)), ms(800));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_without_retry_fails_fast() {
        let limiter = RateLimiter::new();
        let policy = RetryPolicy::none();
        limiter.acquire("s", limit(), &policy, false).await.unwrap();
        limiter.acquire("s", limit(), &policy, false).await.unwrap();

        let err = limiter
            .acquire("s", limit(), &policy, false)
            .await
            .unwrap_err();
        assert!(is_limit_error(&err));
        assert!(matches!(
            err.downcast_ref::<LimitError>(),
            Some(LimitError::RateLimited { retry_after, .. })
                if *retry_after == Duration::from_millis(1000)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_acquire_retries_after_window() {
        let limiter = RateLimiter::new();
        let policy = RetryPolicy {
            max_retries: 2,
            backoff: Backoff::Fixed,
            base_delay: Duration::from_millis(10),
        };
        let start = Instant::now();
        for _ in 0..3 {
            limiter.acquire("s", limit(), &policy, false).await.unwrap();
        }
        // The third call waited for the oldest reservation to leave the window.
        assert!(start.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_bypass_skips_the_check() {
        let limiter = RateLimiter::new();
        for _ in 0..10 {
            limiter
                .acquire("s", limit(), &RetryPolicy::none(), true)
                .await
                .unwrap();
        }
        assert_eq!(limiter.in_flight("s").await, 0);
    }
}
