// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Sliding-window rate limiter for form submissions.
//!
//! Each client id keeps the timestamps of its admitted requests inside the
//! trailing window (15 minutes by default). A request is admitted while fewer
//! than `max_requests` timestamps remain after pruning. Rejected requests are
//! not recorded.
//!
//! State lives behind [`RateLimitStore`] so the in-process map can be swapped
//! for a shared store. Limits are per process otherwise.

use crate::config::RateLimitConfig;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Result of a rate limit check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateLimitResult {
    /// Request is allowed and was recorded
    Allowed {
        /// Requests left in the current window after this one
        remaining: u32,
    },
    /// Request is rate limited and was not recorded
    Limited {
        /// Time until the oldest request leaves the window
        retry_after: Duration,
    },
}

impl RateLimitResult {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed { .. })
    }
}

/// Backing store for per-client request windows.
///
/// `check_and_record` must be atomic per key: two concurrent calls for the
/// same id must never both observe the same pre-append count.
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Prune, then record `now` if fewer than `max_requests` remain.
    async fn check_and_record(
        &self,
        key: &str,
        now: Instant,
        window: Duration,
        max_requests: u32,
    ) -> RateLimitResult;

    /// Prune, then return how many requests are in the window.
    async fn count(&self, key: &str, now: Instant, window: Duration) -> u32;

    /// Drop clients with no request inside the window. Returns how many
    /// were removed.
    async fn evict_idle(&self, now: Instant, window: Duration) -> usize;

    /// Number of tracked clients.
    async fn client_count(&self) -> usize;
}

/// Process-local store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    windows: RwLock<HashMap<String, VecDeque<Instant>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Remove timestamps that are `window` or more in the past.
fn prune(times: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(oldest) = times.front() {
        if now.saturating_duration_since(*oldest) >= window {
            times.pop_front();
        } else {
            break;
        }
    }
}

#[async_trait]
impl RateLimitStore for InMemoryStore {
    async fn check_and_record(
        &self,
        key: &str,
        now: Instant,
        window: Duration,
        max_requests: u32,
    ) -> RateLimitResult {
        let mut windows = self.windows.write().await;
        let times = windows.entry(key.to_string()).or_default();
        prune(times, now, window);

        if times.len() >= max_requests as usize {
            let retry_after = times
                .front()
                .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
                .unwrap_or(window);
            return RateLimitResult::Limited { retry_after };
        }

        times.push_back(now);
        RateLimitResult::Allowed {
            remaining: max_requests.saturating_sub(times.len() as u32),
        }
    }

    async fn count(&self, key: &str, now: Instant, window: Duration) -> u32 {
        let mut windows = self.windows.write().await;
        match windows.get_mut(key) {
            Some(times) => {
                prune(times, now, window);
                times.len() as u32
            }
            None => 0,
        }
    }

    async fn evict_idle(&self, now: Instant, window: Duration) -> usize {
        let mut windows = self.windows.write().await;
        let before = windows.len();
        windows.retain(|_, times| {
            prune(times, now, window);
            !times.is_empty()
        });
        before - windows.len()
    }

    async fn client_count(&self) -> usize {
        self.windows.read().await.len()
    }
}

/// Thread-safe rate limiter.
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    store: Arc<dyn RateLimitStore>,
}

impl RateLimiter {
    /// Create a new rate limiter backed by an in-memory store.
    pub fn new(config: RateLimitConfig) -> Self {
        Self::with_store(config, Arc::new(InMemoryStore::new()))
    }

    /// Create a rate limiter over an existing store.
    pub fn with_store(config: RateLimitConfig, store: Arc<dyn RateLimitStore>) -> Self {
        Self { config, store }
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Check and, if admitted, record a request for `client_id`.
    pub async fn check(&self, client_id: &str) -> RateLimitResult {
        let result = self
            .store
            .check_and_record(
                client_id,
                Instant::now(),
                self.config.window_duration(),
                self.config.max_requests,
            )
            .await;
        if let RateLimitResult::Limited { retry_after } = &result {
            debug!(client_id, ?retry_after, "Client rate limit exceeded");
        }
        result
    }

    /// True when the request is rejected. Admitted requests are recorded.
    pub async fn is_rate_limited(&self, client_id: &str) -> bool {
        !self.check(client_id).await.is_allowed()
    }

    /// Requests `client_id` may still make in the current window.
    pub async fn remaining_requests(&self, client_id: &str) -> u32 {
        let used = self
            .store
            .count(client_id, Instant::now(), self.config.window_duration())
            .await;
        self.config.max_requests.saturating_sub(used)
    }

    /// Forget clients whose whole window has expired (call periodically).
    pub async fn evict_idle(&self) -> usize {
        let removed = self
            .store
            .evict_idle(Instant::now(), self.config.window_duration())
            .await;
        if removed > 0 {
            debug!(removed, "Evicted idle rate limit entries");
        }
        removed
    }

    /// Number of clients currently tracked.
    pub async fn tracked_clients(&self) -> usize {
        self.store.client_count().await
    }
}
