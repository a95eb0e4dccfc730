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

//! Read-through memoization over [`ToolCache`].

use std::future::Future;
use std::time::Duration;

use crate::cache::ToolCache;
use crate::error::ToolFailure;

/// Run `produce` through the cache: return the cached value under `key` if
/// present, otherwise execute, cache a successful non-empty result for
/// `ttl`, and return it.
///
/// Errors propagate without being cached, so a failing upstream is retried
/// on the next call. Empty results are returned but not cached either.
/// Concurrent callers missing on the same key each execute `produce`; the
/// last write wins, which is harmless because the producers are
/// deterministic for a given key.
///
/// Synchronous producers wrap as `|| async move { compute() }`.
pub async fn memoized<F, Fut>(
    cache: &ToolCache,
    key: &str,
    ttl: Duration,
    produce: F,
) -> Result<String, ToolFailure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<String, ToolFailure>>,
{
    if let Some(cached) = cache.get(key).await {
        return Ok(cached);
    }

    let value = produce().await?;
    if !value.is_empty() {
        cache.set(key, &value, ttl).await;
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let cache = ToolCache::in_memory();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        for _ in 0..2 {
            let result = memoized(&cache, "k", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("value".to_string())
            })
            .await
            .unwrap();
            assert_eq!(result, "value");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = ToolCache::in_memory();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        for _ in 0..2 {
            let result = memoized(&cache, "k", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<String, _>(ToolFailure::Timeout)
            })
            .await;
            assert!(result.is_err());
        }
        // Both calls executed because the failure was never stored.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_empty_result_not_cached() {
        let cache = ToolCache::in_memory();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_secs(60);

        for _ in 0..2 {
            let result = memoized(&cache, "k", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(String::new())
            })
            .await
            .unwrap();
            assert!(result.is_empty());
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_recomputed() {
        let cache = ToolCache::in_memory();
        let calls = AtomicUsize::new(0);
        let ttl = Duration::from_millis(10);

        for _ in 0..2 {
            memoized(&cache, "k", ttl, || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok("value".to_string())
            })
            .await
            .unwrap();
            tokio::time::sleep(Duration::from_millis(30)).await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
