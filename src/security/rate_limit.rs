//! Token Bucket Rate Limiting
//!
//! Global limiter applied in front of every route:
//! - one token bucket per client (peer IP)
//! - idle buckets evicted after `bucket_ttl`
//! - thread-safe concurrent access

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderValue,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use tracing::{debug, warn};

use crate::config::security::RateLimitConfig;
use crate::error::BackendError;

/// Token bucket for rate limiting
#[derive(Debug)]
pub struct TokenBucket {
    /// Maximum tokens (capacity)
    capacity: u32,
    /// Current token count
    tokens: AtomicU32,
    /// Tokens per second (refill rate)
    refill_rate: f64,
    /// Last refill timestamp (as nanos since start)
    last_refill: AtomicU64,
    /// Last time a request touched this bucket (as nanos since start)
    last_seen: AtomicU64,
    /// Start instant for timing
    start: Instant,
}

impl TokenBucket {
    /// Create a new token bucket
    pub fn new(capacity: u32, requests_per_minute: u32) -> Self {
        let refill_rate = requests_per_minute as f64 / 60.0;
        Self {
            capacity,
            tokens: AtomicU32::new(capacity),
            refill_rate,
            last_refill: AtomicU64::new(0),
            last_seen: AtomicU64::new(0),
            start: Instant::now(),
        }
    }

    fn now_nanos(&self) -> u64 {
        self.start.elapsed().as_nanos() as u64
    }

    /// Try to consume a token, returning true if successful
    pub fn try_consume(&self, count: u32) -> bool {
        self.refill();
        self.last_seen.store(self.now_nanos(), Ordering::Release);

        loop {
            let current = self.tokens.load(Ordering::Acquire);
            if current < count {
                return false;
            }

            if self.tokens
                .compare_exchange_weak(current, current - count, Ordering::AcqRel, Ordering::Relaxed)
                .is_ok()
            {
                return true;
            }
        }
    }

    /// Refill tokens based on elapsed time
    fn refill(&self) {
        let now_nanos = self.now_nanos();
        let last = self.last_refill.load(Ordering::Acquire);

        let elapsed_secs = now_nanos.saturating_sub(last) as f64 / 1_000_000_000.0;
        let new_tokens = (elapsed_secs * self.refill_rate) as u32;
        if new_tokens == 0 {
            return;
        }

        // Only advance the clock by the time that produced whole tokens so
        // fractional progress is kept for the next call.
        let consumed_nanos = (new_tokens as f64 / self.refill_rate * 1_000_000_000.0) as u64;
        let next_refill = last.saturating_add(consumed_nanos).min(now_nanos);

        if self.last_refill
            .compare_exchange(last, next_refill, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
        {
            let _ = self.tokens.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                Some(current.saturating_add(new_tokens).min(self.capacity))
            });
        }
    }

    /// Get current token count
    pub fn tokens(&self) -> u32 {
        self.refill();
        self.tokens.load(Ordering::Acquire)
    }

    /// Get time until next token is available
    pub fn time_until_token(&self) -> Duration {
        if self.tokens() > 0 {
            return Duration::ZERO;
        }
        if self.refill_rate <= 0.0 {
            return Duration::MAX;
        }
        Duration::from_secs_f64(1.0 / self.refill_rate)
    }

    /// Time since the bucket last saw a request
    pub fn idle_for(&self) -> Duration {
        let last_seen = self.last_seen.load(Ordering::Acquire);
        Duration::from_nanos(self.now_nanos().saturating_sub(last_seen))
    }

    /// Get the capacity
    pub fn capacity(&self) -> u32 {
        self.capacity
    }
}

/// Result of a rate limit check
#[derive(Debug, Clone)]
pub enum RateLimitResult {
    /// Request allowed
    Allowed {
        remaining: u32,
        limit: u32,
        reset: Duration,
    },
    /// Rate limit exceeded
    Exceeded {
        retry_after: Duration,
        limit: u32,
    },
}

/// Rate limiter managing one bucket per client
pub struct RateLimiter {
    buckets: DashMap<String, Arc<TokenBucket>>,
    config: Arc<RateLimitConfig>,
}

impl RateLimiter {
    /// Create a new rate limiter
    pub fn new(config: Arc<RateLimitConfig>) -> Self {
        Self {
            buckets: DashMap::new(),
            config,
        }
    }

    /// Get or create a bucket for a client key
    pub fn get_bucket(&self, key: &str) -> Arc<TokenBucket> {
        if let Some(bucket) = self.buckets.get(key) {
            return bucket.clone();
        }

        self.buckets
            .entry(key.to_string())
            .or_insert_with(|| {
                Arc::new(TokenBucket::new(
                    self.config.burst_size,
                    self.config.requests_per_minute,
                ))
            })
            .clone()
    }

    /// Try to acquire a permit for a request
    pub fn try_acquire(&self, key: &str) -> RateLimitResult {
        let bucket = self.get_bucket(key);
        let limit = self.config.burst_size;

        if bucket.try_consume(1) {
            RateLimitResult::Allowed {
                remaining: bucket.tokens(),
                limit,
                reset: bucket.time_until_token(),
            }
        } else {
            RateLimitResult::Exceeded {
                retry_after: bucket.time_until_token(),
                limit,
            }
        }
    }

    /// Drop buckets that have been idle longer than `bucket_ttl`
    pub fn cleanup(&self) -> usize {
        let ttl = self.config.bucket_ttl;
        let before = self.buckets.len();
        self.buckets.retain(|_, bucket| bucket.idle_for() < ttl);
        let removed = before.saturating_sub(self.buckets.len());
        debug!(
            removed,
            bucket_count = self.buckets.len(),
            "Rate limiter cleanup"
        );
        removed
    }

    /// Spawn the periodic cleanup task on the current runtime
    pub fn spawn_cleanup(self: &Arc<Self>) -> tokio::task::JoinHandle<()> {
        let limiter = Arc::clone(self);
        // tokio::time::interval panics on a zero period
        let period = self.config.cleanup_interval.max(Duration::from_millis(1));
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            // first tick completes immediately
            interval.tick().await;
            loop {
                interval.tick().await;
                limiter.cleanup();
            }
        })
    }

    /// Get the number of active buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Check if rate limiting is enabled
    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Arc::new(RateLimitConfig::default()))
    }
}

/// Identify the client a request counts against
pub fn client_key(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn header_value(value: impl ToString) -> HeaderValue {
    HeaderValue::from_str(&value.to_string()).unwrap_or_else(|_| HeaderValue::from_static("0"))
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    if !limiter.is_enabled() {
        return next.run(request).await;
    }

    let key = client_key(&request);

    match limiter.try_acquire(&key) {
        RateLimitResult::Allowed { remaining, limit, reset } => {
            let mut response = next.run(request).await;

            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", header_value(limit));
            headers.insert("x-ratelimit-remaining", header_value(remaining));
            headers.insert("x-ratelimit-reset", header_value(reset.as_secs()));

            response
        }
        RateLimitResult::Exceeded { retry_after, limit } => {
            warn!(
                client = %key,
                path = %request.uri().path(),
                "Rate limit exceeded"
            );

            let mut response = BackendError::RateLimited { retry_after }.into_response();
            let headers = response.headers_mut();
            headers.insert("x-ratelimit-limit", header_value(limit));
            headers.insert("x-ratelimit-remaining", HeaderValue::from_static("0"));
            response
        }
    }
}
