//! Per-client fixed-window rate limiter.
//!
//! Each client gets `max_requests` per window. The first request after a window
//! expires opens a new one, so bursts of up to twice the limit are possible at
//! a window boundary.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Above this many tracked clients, expired windows are pruned on insert.
const PRUNE_THRESHOLD: usize = 10_000;

/// Longest window honoured. Larger configured windows are clamped to this so
/// `Instant` arithmetic cannot overflow.
const MAX_WINDOW: Duration = Duration::from_secs(365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

impl RateLimitDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    clients: Mutex<HashMap<String, ClientWindow>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window: window.min(MAX_WINDOW),
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn allow(&self, client: &str) -> bool {
        self.check(client).is_allowed()
    }

    pub fn check(&self, client: &str) -> RateLimitDecision {
        self.check_at(client, Instant::now())
    }

    /// Record a request from `client` at `now` and decide whether it may proceed.
    pub fn check_at(&self, client: &str, now: Instant) -> RateLimitDecision {
        let mut clients = self
            .clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(window) = clients.get_mut(client) {
            if now < window.reset_at {
                if window.count >= self.max_requests {
                    let retry_after_secs = window
                        .reset_at
                        .saturating_duration_since(now)
                        .as_secs()
                        .max(1);
                    return RateLimitDecision::Limited { retry_after_secs };
                }
                window.count += 1;
                return RateLimitDecision::Allowed;
            }
        }

        if clients.len() >= PRUNE_THRESHOLD && !clients.contains_key(client) {
            let before = clients.len();
            clients.retain(|_, window| now < window.reset_at);
            tracing::debug!(pruned = before - clients.len(), "expired rate-limit windows pruned");
        }

        if self.max_requests == 0 {
            return RateLimitDecision::Limited {
                retry_after_secs: self.window.as_secs().max(1),
            };
        }

        clients.insert(
            client.to_string(),
            ClientWindow {
                count: 1,
                reset_at: now + self.window,
            },
        );
        RateLimitDecision::Allowed
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.clients
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}
