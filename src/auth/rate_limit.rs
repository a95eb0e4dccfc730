// Copyright 2025 Toolbridge Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Token bucket rate limiting keyed by client identifier.

use moka::sync::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Rate limiter configuration
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Maximum requests per window
    pub max_requests: u32,
    /// Time window duration
    pub window: Duration,
    /// Enable rate limiting
    pub enabled: bool,
    /// Maximum number of tracked clients
    pub max_clients: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 100,
            window: Duration::from_secs(60),
            enabled: true,
            max_clients: 100_000,
        }
    }
}

/// Token bucket using atomics, tokens scaled by 1000 for precision.
#[derive(Debug)]
struct TokenBucket {
    tokens: AtomicU64,
    capacity: f64,
    /// Tokens per second
    refill_rate: f64,
    last_refill_ms: AtomicU64,
    start_instant: Instant,
}

impl TokenBucket {
    fn new(capacity: u32, window: Duration) -> Self {
        let refill_rate = capacity as f64 / window.as_secs_f64();
        Self {
            tokens: AtomicU64::new((capacity as u64) * 1000),
            capacity: capacity as f64,
            refill_rate,
            last_refill_ms: AtomicU64::new(0),
            start_instant: Instant::now(),
        }
    }

    fn get_tokens(&self) -> f64 {
        self.tokens.load(Ordering::Relaxed) as f64 / 1000.0
    }

    fn set_tokens(&self, value: f64) {
        self.tokens
            .store((value * 1000.0) as u64, Ordering::Relaxed);
    }

    fn refill(&self) {
        let now_ms = self.start_instant.elapsed().as_millis() as u64;
        let last_ms = self.last_refill_ms.swap(now_ms, Ordering::Relaxed);
        let elapsed_secs = (now_ms.saturating_sub(last_ms)) as f64 / 1000.0;

        let current = self.get_tokens();
        let new_tokens = (current + elapsed_secs * self.refill_rate).min(self.capacity);
        self.set_tokens(new_tokens);
    }

    fn try_consume(&self) -> bool {
        self.refill();

        let current = self.get_tokens();
        if current >= 1.0 {
            self.set_tokens(current - 1.0);
            true
        } else {
            false
        }
    }

    fn remaining(&self) -> u32 {
        self.refill();
        self.get_tokens().floor() as u32
    }

    fn retry_after(&self) -> Duration {
        self.refill();

        let current = self.get_tokens();
        if current >= 1.0 {
            Duration::from_secs(0)
        } else {
            let tokens_needed = 1.0 - current;
            let seconds = tokens_needed / self.refill_rate;
            Duration::from_secs_f64(seconds)
        }
    }
}

/// Per-client token buckets held in a bounded cache so idle clients are
/// evicted instead of accumulating forever.
pub struct RateLimiter {
    config: RateLimitConfig,
    buckets: Cache<String, Arc<TokenBucket>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        // Entries idle for 10x the window get evicted.
        let ttl = config.window * 10;

        let buckets = Cache::builder()
            .max_capacity(config.max_clients)
            .time_to_idle(ttl)
            .build();

        Self { config, buckets }
    }

    /// Check if a request is allowed for the identifier (IP or API key).
    pub fn check_rate_limit(&self, identifier: &str) -> RateLimitResult {
        if !self.config.enabled {
            return RateLimitResult::Allowed {
                remaining: self.config.max_requests,
                retry_after: Duration::from_secs(0),
            };
        }

        let bucket = self.buckets.get_with(identifier.to_string(), || {
            Arc::new(TokenBucket::new(
                self.config.max_requests,
                self.config.window,
            ))
        });

        if bucket.try_consume() {
            RateLimitResult::Allowed {
                remaining: bucket.remaining(),
                retry_after: Duration::from_secs(0),
            }
        } else {
            RateLimitResult::RateLimited {
                retry_after: bucket.retry_after(),
            }
        }
    }

    pub fn client_count(&self) -> u64 {
        self.buckets.entry_count()
    }
}

/// Result of rate limit check
#[derive(Debug)]
pub enum RateLimitResult {
    Allowed {
        remaining: u32,
        retry_after: Duration,
    },
    RateLimited {
        retry_after: Duration,
    },
}

/// Extract client IP from proxy headers.
pub fn extract_client_ip(headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers.get("X-Forwarded-For") {
        if let Ok(forwarded_str) = forwarded.to_str() {
            if let Some(first_ip) = forwarded_str.split(',').next() {
                return Some(first_ip.trim().to_string());
            }
        }
    }

    if let Some(real_ip) = headers.get("X-Real-IP") {
        if let Ok(ip_str) = real_ip.to_str() {
            return Some(ip_str.to_string());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_bucket_exhausts() {
        let bucket = TokenBucket::new(10, Duration::from_secs(10));

        for _ in 0..10 {
            assert!(bucket.try_consume());
        }
        assert!(!bucket.try_consume());
    }

    #[test]
    fn test_disabled_limiter_always_allows() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 1,
            enabled: false,
            ..Default::default()
        });

        for _ in 0..5 {
            assert!(matches!(
                limiter.check_rate_limit("client"),
                RateLimitResult::Allowed { .. }
            ));
        }
    }

    #[test]
    fn test_limits_are_per_client() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 2,
            window: Duration::from_secs(60),
            ..Default::default()
        });

        assert!(matches!(
            limiter.check_rate_limit("a"),
            RateLimitResult::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_rate_limit("a"),
            RateLimitResult::Allowed { .. }
        ));
        assert!(matches!(
            limiter.check_rate_limit("a"),
            RateLimitResult::RateLimited { .. }
        ));
        // A different client has its own bucket.
        assert!(matches!(
            limiter.check_rate_limit("b"),
            RateLimitResult::Allowed { .. }
        ));
    }

    #[test]
    fn test_extract_forwarded_ip() {
        let mut headers = axum::http::HeaderMap::new();
        headers.insert("X-Forwarded-For", "1.2.3.4, 10.0.0.1".parse().unwrap());
        assert_eq!(extract_client_ip(&headers).as_deref(), Some("1.2.3.4"));
    }
}
