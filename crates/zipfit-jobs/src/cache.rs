//! Redis-backed analysis result cache.
//!
//! Keys are content fingerprints, so identical bytes uploaded by different
//! users share one entry. Every failure path degrades: an unreachable
//! Redis, a poisoned payload or a serialization error logs a warning and
//! behaves as a miss (`get`) or a no-op (`put`/`touch`). The cache
//! accelerates computation; it never owns data.
//!
//! ## Configuration
//!
//! Environment variables:
//! - `REDIS_ENABLED`: Set to "false" to disable caching (default: true)
//! - `REDIS_URL`: Redis connection URL (default: redis://localhost:6379)
//! - `ZIPFIT_CACHE_TTL_SECS`: Entry TTL in seconds (default: 30 days)

use std::sync::Arc;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use zipfit_core::{defaults, AnalysisCache, CachedAnalysis};

/// Analysis cache backed by Redis.
#[derive(Clone)]
pub struct RedisAnalysisCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    /// Redis connection manager (None if disabled or unreachable).
    connection: RwLock<Option<ConnectionManager>>,
    /// Entry TTL in seconds.
    ttl_seconds: u64,
    /// Cache key prefix.
    prefix: String,
}

impl RedisAnalysisCache {
    /// Create a cache from environment configuration.
    pub async fn from_env() -> Self {
        let enabled = std::env::var("REDIS_ENABLED")
            .map(|v| v != "false" && v != "0")
            .unwrap_or(true);

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| defaults::REDIS_URL.to_string());

        let ttl_seconds: u64 = std::env::var("ZIPFIT_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults::CACHE_TTL_SECS);

        let connection = if enabled {
            match redis::Client::open(redis_url.as_str()) {
                Ok(client) => match ConnectionManager::new(client).await {
                    Ok(conn) => {
                        info!(
                            subsystem = "jobs",
                            component = "cache",
                            ttl_seconds,
                            "Redis analysis cache enabled"
                        );
                        Some(conn)
                    }
                    Err(e) => {
                        warn!("Failed to connect to Redis, cache disabled: {}", e);
                        None
                    }
                },
                Err(e) => {
                    warn!("Invalid Redis URL, cache disabled: {}", e);
                    None
                }
            }
        } else {
            info!("Redis analysis cache disabled via REDIS_ENABLED=false");
            None
        };

        Self {
            inner: Arc::new(CacheInner {
                connection: RwLock::new(connection),
                ttl_seconds,
                prefix: defaults::CACHE_KEY_PREFIX.to_string(),
            }),
        }
    }

    /// Create a disabled cache (for testing or when Redis is unavailable).
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(CacheInner {
                connection: RwLock::new(None),
                ttl_seconds: defaults::CACHE_TTL_SECS,
                prefix: defaults::CACHE_KEY_PREFIX.to_string(),
            }),
        }
    }

    /// Check if caching is enabled and connected.
    pub async fn is_connected(&self) -> bool {
        self.inner.connection.read().await.is_some()
    }

    fn key(&self, fingerprint: &str) -> String {
        format!("{}{}", self.inner.prefix, fingerprint)
    }

    async fn connection(&self) -> Option<ConnectionManager> {
        self.inner.connection.read().await.clone()
    }
}

#[async_trait]
impl AnalysisCache for RedisAnalysisCache {
    async fn get(&self, fingerprint: &str) -> Option<CachedAnalysis> {
        let mut conn = self.connection().await?;
        let key = self.key(fingerprint);

        let payload: Option<String> = match conn.get(&key).await {
            Ok(value) => value,
            Err(e) => {
                warn!(fingerprint, "Cache read failed, treating as miss: {}", e);
                return None;
            }
        };

        let payload = match payload {
            Some(p) => p,
            None => {
                debug!(fingerprint, "Cache miss");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(analysis) => {
                info!(fingerprint, "Cache hit");
                Some(analysis)
            }
            Err(e) => {
                warn!(fingerprint, "Cached payload unreadable, treating as miss: {}", e);
                None
            }
        }
    }

    async fn put(&self, fingerprint: &str, analysis: &CachedAnalysis) {
        let Some(mut conn) = self.connection().await else {
            return;
        };
        let key = self.key(fingerprint);

        let payload = match serde_json::to_string(analysis) {
            Ok(p) => p,
            Err(e) => {
                warn!(fingerprint, "Failed to serialize analysis for cache: {}", e);
                return;
            }
        };

        match conn
            .set_ex::<_, _, ()>(&key, payload, self.inner.ttl_seconds)
            .await
        {
            Ok(()) => info!(fingerprint, "Cached analysis result"),
            Err(e) => warn!(fingerprint, "Cache write failed: {}", e),
        }
    }

    async fn touch(&self, fingerprint: &str) {
        let Some(mut conn) = self.connection().await else {
            return;
        };
        let key = self.key(fingerprint);

        match conn
            .expire::<_, bool>(&key, self.inner.ttl_seconds as i64)
            .await
        {
            Ok(_) => debug!(fingerprint, "Extended cache TTL"),
            Err(e) => warn!(fingerprint, "Cache TTL extension failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_prefix() {
        let cache = RedisAnalysisCache::disabled();
        assert_eq!(cache.key("abc123"), "zipfit:analysis:abc123");
    }

    #[tokio::test]
    async fn test_disabled_cache_is_a_miss_and_noop() {
        let cache = RedisAnalysisCache::disabled();
        assert!(!cache.is_connected().await);
        assert!(cache.get("abc").await.is_none());

        // put/touch must not panic without a connection.
        let analysis = CachedAnalysis {
            criteria: Default::default(),
            match_score: 0,
            eligible: false,
            ocr_quality: zipfit_core::OcrQuality::Low,
            ocr_warning: None,
            extracted_text: String::new(),
            model: "m".to_string(),
        };
        cache.put("abc", &analysis).await;
        cache.touch("abc").await;
    }
}
