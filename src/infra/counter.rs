//! Rate-limit counter stores.
//!
//! The login throttle depends on [`CounterStore`] rather than any concrete
//! backend, so tests can substitute an in-memory fake and production can
//! substitute a shared cache without code changes.
//!
//! Deployment topology matters here: [`MemoryCounterStore`] counts per
//! process and is only correct for single-instance deployments. Anything
//! behind a load balancer must use [`RedisCounterStore`] or the throttle
//! becomes trivially bypassable by round-robin distribution.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use crate::config::COUNTER_PREFIX_RATE_LIMIT;
use crate::errors::{AppError, AppResult};
use crate::infra::clock::Clock;

/// Attempt count for the current window, with the time left until the
/// window resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowCount {
    pub count: u64,
    pub resets_in: u64,
}

/// Fixed-window attempt counter, keyed by caller-supplied strings.
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Record one attempt under `key` and return the count for the current
    /// window. A fresh window starts at count 1 with the full window ahead.
    async fn increment(&self, key: &str, window_seconds: u64) -> AppResult<WindowCount>;
}

// =============================================================================
// In-memory store (single instance)
// =============================================================================

struct WindowSlot {
    expires_at: i64,
    count: u64,
}

/// Process-local counter store backed by a mutex-guarded map.
pub struct MemoryCounterStore {
    clock: Arc<dyn Clock>,
    windows: Mutex<HashMap<String, WindowSlot>>,
}

impl MemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            windows: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl CounterStore for MemoryCounterStore {
    async fn increment(&self, key: &str, window_seconds: u64) -> AppResult<WindowCount> {
        let now = self.clock.now().timestamp();
        let mut windows = self
            .windows
            .lock()
            .map_err(|_| AppError::internal("counter store lock poisoned"))?;

        // Keys are client-controlled, so expired slots must be dropped or
        // the map grows one entry per client address forever.
        windows.retain(|_, slot| slot.expires_at > now);

        let slot = windows.entry(key.to_string()).or_insert(WindowSlot {
            expires_at: now + window_seconds as i64,
            count: 0,
        });

        slot.count += 1;
        Ok(WindowCount {
            count: slot.count,
            resets_in: (slot.expires_at - now) as u64,
        })
    }
}

// =============================================================================
// Redis store (shared across instances)
// =============================================================================

/// Shared counter store backed by Redis, using key TTL as the window.
#[derive(Clone)]
pub struct RedisCounterStore {
    connection: ConnectionManager,
}

impl RedisCounterStore {
    /// Connect to Redis, returning an error instead of panicking.
    pub async fn connect(redis_url: &str) -> Result<Self, RedisError> {
        let client = Client::open(redis_url)?;
        let connection = ConnectionManager::new(client).await?;

        tracing::info!("Redis counter store connected");

        Ok(Self { connection })
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(&self, key: &str, window_seconds: u64) -> AppResult<WindowCount> {
        let key = format!("{}{}", COUNTER_PREFIX_RATE_LIMIT, key);
        let mut conn = self.connection.clone();

        let exists: bool = conn.exists(&key).await.map_err(counter_error)?;

        if !exists {
            // First attempt in window: the TTL defines the window boundary
            conn.set_ex::<_, _, ()>(&key, 1i64, window_seconds)
                .await
                .map_err(counter_error)?;
            return Ok(WindowCount {
                count: 1,
                resets_in: window_seconds,
            });
        }

        let count: i64 = conn.incr(&key, 1).await.map_err(counter_error)?;
        let ttl: i64 = conn.ttl(&key).await.map_err(counter_error)?;

        // A key without a TTL should not occur; report a full window
        let resets_in = if ttl > 0 { ttl as u64 } else { window_seconds };

        Ok(WindowCount {
            count: count as u64,
            resets_in,
        })
    }
}

/// Counter-store failures are infrastructure errors; they must stay
/// distinguishable from throttle rejections.
fn counter_error(e: RedisError) -> AppError {
    AppError::internal(format!("Counter store error: {}", e))
}
