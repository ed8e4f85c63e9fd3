//! Time-boxed caching for the fetched dataset
//!
//! The dashboard refetches the worksheet on every interaction unless a
//! recent snapshot exists. This module provides that snapshot as an explicit,
//! injectable cache object rather than process-wide memoization, so the
//! pipeline stays testable without the remote source.
//!
//! # Example
//!
//! ```rust,ignore
//! use ital::cache::{CacheConfig, RefreshCache};
//!
//! let cache = RefreshCache::new(&CacheConfig::from_env());
//! let table = cache.get_or_refresh(|| fetch_table()).await?;
//! ```

use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Dataset snapshot TTL in seconds (default: 5 minutes)
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

impl CacheConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self {
            ttl_secs: std::env::var("ITAL_CACHE_TTL")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

struct Entry<T> {
    value: T,
    fetched_at: Instant,
}

/// Single-value snapshot cache with a TTL and explicit invalidation
///
/// Holds the last fetched value and its fetch timestamp. `get_or_refresh`
/// runs the supplied future only on a miss or after expiry; `invalidate`
/// backs the dashboard's "새로고침" action.
pub struct RefreshCache<T> {
    inner: Mutex<Option<Entry<T>>>,
    ttl: Duration,
}

impl<T: Clone> RefreshCache<T> {
    /// Create a cache from config
    pub fn new(config: &CacheConfig) -> Self {
        Self::with_ttl(Duration::from_secs(config.ttl_secs))
    }

    /// Create a cache with an explicit TTL
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(None),
            ttl,
        }
    }

    /// Get the cached value if it is still fresh
    pub async fn get(&self) -> Option<T> {
        let guard = self.inner.lock().await;
        match guard.as_ref() {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => Some(entry.value.clone()),
            _ => None,
        }
    }

    /// Age of the current snapshot, if any
    pub async fn age(&self) -> Option<Duration> {
        let guard = self.inner.lock().await;
        guard.as_ref().map(|entry| entry.fetched_at.elapsed())
    }

    /// Get the cached value, refreshing through `refresh_fn` on miss or expiry
    ///
    /// The refresh error passes through untouched; a failed refresh leaves
    /// any stale entry in place so a later attempt can retry.
    pub async fn get_or_refresh<F, Fut, E>(&self, refresh_fn: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
    {
        let mut guard = self.inner.lock().await;

        if let Some(entry) = guard.as_ref() {
            if entry.fetched_at.elapsed() < self.ttl {
                tracing::debug!("dataset cache hit");
                return Ok(entry.value.clone());
            }
            tracing::debug!("dataset cache expired");
        } else {
            tracing::debug!("dataset cache miss");
        }

        let value = refresh_fn().await?;
        *guard = Some(Entry {
            value: value.clone(),
            fetched_at: Instant::now(),
        });

        Ok(value)
    }

    /// Drop the current snapshot so the next access refetches
    pub async fn invalidate(&self) {
        let mut guard = self.inner.lock().await;
        *guard = None;
        tracing::info!("dataset cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_cache_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.ttl_secs, 300);
    }

    #[tokio::test]
    async fn test_miss_then_hit() {
        let cache: RefreshCache<u32> = RefreshCache::with_ttl(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        assert!(cache.get().await.is_none());

        let value = cache
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(7)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);

        // Second access must not recompute
        let value = cache
            .get_or_refresh(|| async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, ()>(99)
            })
            .await
            .unwrap();
        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_expiry_recomputes() {
        let cache: RefreshCache<u32> = RefreshCache::with_ttl(Duration::from_millis(0));

        let first = cache
            .get_or_refresh(|| async { Ok::<_, ()>(1) })
            .await
            .unwrap();
        let second = cache
            .get_or_refresh(|| async { Ok::<_, ()>(2) })
            .await
            .unwrap();

        assert_eq!(first, 1);
        assert_eq!(second, 2);
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache: RefreshCache<u32> = RefreshCache::with_ttl(Duration::from_secs(60));

        cache
            .get_or_refresh(|| async { Ok::<_, ()>(1) })
            .await
            .unwrap();
        assert_eq!(cache.get().await, Some(1));

        cache.invalidate().await;
        assert!(cache.get().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_error() {
        let cache: RefreshCache<u32> = RefreshCache::with_ttl(Duration::from_secs(60));

        let result = cache
            .get_or_refresh(|| async { Err::<u32, _>("boom") })
            .await;
        assert_eq!(result, Err("boom"));
        assert!(cache.get().await.is_none());
    }
}
