// src/services/rate_limit.rs
// DOCUMENTATION: Per-client limiter for credential endpoints
// PURPOSE: Slow down password guessing on /auth/login and /auth/register

use crate::errors::AppError;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

/// Stale buckets are dropped every this many checks
const PRUNE_EVERY: u64 = 1024;

/// Drop stale buckets early once this many clients are tracked
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Keyed token bucket, one bucket per client address
pub struct AuthRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    checks: AtomicU64,
}

impl AuthRateLimiter {
    pub fn new(per_minute: u32) -> Self {
        let burst = NonZeroU32::new(per_minute).unwrap_or(NonZeroU32::MIN);
        Self::with_quota(Quota::per_minute(burst))
    }

    pub fn with_quota(quota: Quota) -> Self {
        Self {
            limiter: RateLimiter::keyed(quota),
            checks: AtomicU64::new(0),
        }
    }

    /// Consume one attempt for `client`, failing with 429 when exhausted
    pub fn check(&self, client: &str) -> Result<(), AppError> {
        let n = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if n % PRUNE_EVERY == 0 || self.limiter.len() > MAX_TRACKED_CLIENTS {
            self.prune();
        }

        self.limiter.check_key(&client.to_string()).map_err(|_| {
            log::warn!("Auth rate limit exceeded for {}", client);
            AppError::RateLimitExceeded
        })
    }

    /// Forget clients whose bucket has fully refilled
    pub fn prune(&self) {
        let before = self.limiter.len();
        self.limiter.retain_recent();
        self.limiter.shrink_to_fit();
        log::debug!("Rate limiter pruned {} -> {} clients", before, self.limiter.len());
    }

    /// Number of clients currently tracked
    pub fn tracked_clients(&self) -> usize {
        self.limiter.len()
    }
}
