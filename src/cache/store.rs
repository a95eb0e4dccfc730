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

//! TTL cache store with a Redis backend and in-memory fallback.
//!
//! Every public operation is infallible from the caller's perspective. A
//! failing Redis command degrades the call to a miss or a no-op and flips
//! the store to the in-memory backend for the rest of the process
//! lifetime. Tool execution never depends on cache health.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use redis::AsyncCommands;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// How long the initial PING probe may take before the store gives up on
/// Redis and falls back to memory.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendState {
    /// No cache operation has run yet, so no probe has happened.
    Unprobed,
    Redis,
    Memory,
}

impl BackendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendState::Unprobed => "unprobed",
            BackendState::Redis => "redis",
            BackendState::Memory => "memory",
        }
    }
}

enum Backend {
    /// Probe deferred until the first operation.
    Unprobed { redis_url: Option<String> },
    Remote(redis::aio::ConnectionManager),
    Memory,
}

struct MemoryEntry {
    value: String,
    expires_at: Instant,
}

struct Inner {
    backend: Backend,
    memory: HashMap<String, MemoryEntry>,
}

/// Counters for cache effectiveness, readable without the store lock.
#[derive(Debug, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub sets: u64,
    pub backend: BackendState,
    pub memory_entries: usize,
}

/// Shared TTL cache for tool results.
pub struct ToolCache {
    inner: Mutex<Inner>,
    hits: AtomicU64,
    misses: AtomicU64,
    sets: AtomicU64,
}

impl ToolCache {
    /// Create a store that will probe `redis_url` on first use. Pass `None`
    /// to run memory-only from the start.
    pub fn new(redis_url: Option<String>) -> Self {
        let backend = match redis_url {
            Some(url) => Backend::Unprobed {
                redis_url: Some(url),
            },
            None => Backend::Memory,
        };
        Self {
            inner: Mutex::new(Inner {
                backend,
                memory: HashMap::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            sets: AtomicU64::new(0),
        }
    }

    /// Memory-only store, used by tests and by deployments without Redis.
    pub fn in_memory() -> Self {
        Self::new(None)
    }

    /// Look up a key. Expired or missing entries and backend failures all
    /// read as `None`.
    pub async fn get(&self, key: &str) -> Option<String> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        self.ensure_probed(inner).await;

        let found = match &mut inner.backend {
            Backend::Remote(conn) => {
                let mut conn = conn.clone();
                match conn.get::<_, Option<String>>(key).await {
                    Ok(value) => value,
                    Err(err) => {
                        warn!(error = %err, "redis GET failed, falling back to memory");
                        inner.backend = Backend::Memory;
                        None
                    }
                }
            }
            Backend::Memory => Self::memory_get(&mut inner.memory, key),
            Backend::Unprobed { .. } => unreachable!("probed above"),
        };

        match found {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key, "cache hit");
                Some(value)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key, "cache miss");
                None
            }
        }
    }

    /// Store a value under `key` for `ttl`. Backend failures are swallowed
    /// after switching to memory, so the write may be silently lost once.
    pub async fn set(&self, key: &str, value: &str, ttl: Duration) {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        self.ensure_probed(inner).await;
        self.sets.fetch_add(1, Ordering::Relaxed);

        match &mut inner.backend {
            Backend::Remote(conn) => {
                let mut conn = conn.clone();
                let result: redis::RedisResult<()> =
                    conn.set_ex(key, value, ttl.as_secs()).await;
                if let Err(err) = result {
                    warn!(error = %err, "redis SETEX failed, falling back to memory");
                    inner.backend = Backend::Memory;
                }
            }
            Backend::Memory => {
                inner.memory.insert(
                    key.to_string(),
                    MemoryEntry {
                        value: value.to_string(),
                        expires_at: Instant::now() + ttl,
                    },
                );
            }
            Backend::Unprobed { .. } => unreachable!("probed above"),
        }
    }

    /// Remove a single key if present.
    pub async fn delete(&self, key: &str) {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        self.ensure_probed(inner).await;

        match &mut inner.backend {
            Backend::Remote(conn) => {
                let mut conn = conn.clone();
                let result: redis::RedisResult<()> = conn.del(key).await;
                if let Err(err) = result {
                    warn!(error = %err, "redis DEL failed, falling back to memory");
                    inner.backend = Backend::Memory;
                }
            }
            Backend::Memory => {
                inner.memory.remove(key);
            }
            Backend::Unprobed { .. } => unreachable!("probed above"),
        }
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        self.ensure_probed(inner).await;
        inner.memory.clear();

        if let Backend::Remote(conn) = &mut inner.backend {
            let mut conn = conn.clone();
            let result: redis::RedisResult<()> =
                redis::cmd("FLUSHDB").query_async(&mut conn).await;
            if let Err(err) = result {
                warn!(error = %err, "redis FLUSHDB failed, falling back to memory");
                inner.backend = Backend::Memory;
            }
        }
    }

    /// Which backend the store is currently using.
    pub async fn backend_state(&self) -> BackendState {
        let inner = self.inner.lock().await;
        match inner.backend {
            Backend::Unprobed { .. } => BackendState::Unprobed,
            Backend::Remote(_) => BackendState::Redis,
            Backend::Memory => BackendState::Memory,
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let inner = self.inner.lock().await;
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            backend: match inner.backend {
                Backend::Unprobed { .. } => BackendState::Unprobed,
                Backend::Remote(_) => BackendState::Redis,
                Backend::Memory => BackendState::Memory,
            },
            memory_entries: inner.memory.len(),
        }
    }

    /// Resolve an unprobed backend exactly once. The probe outcome is
    /// permanent: a failed probe never retries Redis.
    async fn ensure_probed(&self, inner: &mut Inner) {
        if let Backend::Unprobed { redis_url } = &inner.backend {
            let url = redis_url.clone();
            inner.backend = match url {
                Some(url) => match Self::probe_redis(&url).await {
                    Some(conn) => {
                        info!("cache backed by redis");
                        Backend::Remote(conn)
                    }
                    None => {
                        info!("redis unavailable, cache running in memory");
                        Backend::Memory
                    }
                },
                None => Backend::Memory,
            };
        }
    }

    async fn probe_redis(url: &str) -> Option<redis::aio::ConnectionManager> {
        let client = match redis::Client::open(url) {
            Ok(client) => client,
            Err(err) => {
                warn!(error = %err, "invalid redis url");
                return None;
            }
        };
        let connect = async {
            let mut conn = client.get_connection_manager().await?;
            redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
            Ok::<_, redis::RedisError>(conn)
        };
        match tokio::time::timeout(PROBE_TIMEOUT, connect).await {
            Ok(Ok(conn)) => Some(conn),
            Ok(Err(err)) => {
                warn!(error = %err, "redis probe failed");
                None
            }
            Err(_) => {
                warn!("redis probe timed out");
                None
            }
        }
    }

    /// Read from the memory map, purging the entry if its deadline passed.
    fn memory_get(memory: &mut HashMap<String, MemoryEntry>, key: &str) -> Option<String> {
        match memory.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                memory.remove(key);
                None
            }
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_then_get_round_trip() {
        let cache = ToolCache::in_memory();
        cache.set("k", "v", Duration::from_secs(60)).await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let cache = ToolCache::in_memory();
        assert_eq!(cache.get("absent").await, None);
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_miss() {
        let cache = ToolCache::in_memory();
        cache.set("k", "v", Duration::from_millis(10)).await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k").await, None);
        // Lazy purge removed the entry on that read.
        assert_eq!(cache.stats().await.memory_entries, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_entry() {
        let cache = ToolCache::in_memory();
        cache.set("k", "v", Duration::from_secs(60)).await;
        cache.delete("k").await;
        assert_eq!(cache.get("k").await, None);
    }

    #[tokio::test]
    async fn test_clear_removes_everything() {
        let cache = ToolCache::in_memory();
        cache.set("a", "1", Duration::from_secs(60)).await;
        cache.set("b", "2", Duration::from_secs(60)).await;
        cache.clear().await;
        assert_eq!(cache.get("a").await, None);
        assert_eq!(cache.get("b").await, None);
    }

    #[tokio::test]
    async fn test_stats_count_hits_and_misses() {
        let cache = ToolCache::in_memory();
        cache.set("k", "v", Duration::from_secs(60)).await;
        cache.get("k").await;
        cache.get("nope").await;
        let stats = cache.stats().await;
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.sets, 1);
        assert_eq!(stats.backend, BackendState::Memory);
    }

    #[tokio::test]
    async fn test_unreachable_redis_falls_back_to_memory() {
        let cache = ToolCache::new(Some("redis://127.0.0.1:1/".to_string()));
        assert_eq!(cache.backend_state().await, BackendState::Unprobed);
        cache.set("k", "v", Duration::from_secs(60)).await;
        assert_eq!(cache.backend_state().await, BackendState::Memory);
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }
}
