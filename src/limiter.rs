//! Per-client request throttling
//!
//! A sliding-window counter: each client may make at most `max_requests`
//! accepted requests within any `window`. Rejected requests are not counted.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::net::IpAddr;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Keys tracked before idle clients are swept out.
const PRUNE_THRESHOLD: usize = 1024;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed,
    /// Rejected; the oldest counted hit expires after this long.
    Limited { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }
}

pub struct RateLimiter<K = IpAddr> {
    max_requests: u32,
    window: Duration,
    hits: Mutex<HashMap<K, VecDeque<Instant>>>,
}

impl<K: Eq + Hash + Clone> RateLimiter<K> {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            hits: Mutex::new(HashMap::new()),
        }
    }

    pub fn per_minute(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60))
    }

    pub fn per_hour(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(60 * 60))
    }

    /// Human-readable limit, e.g. `5 per 60s`.
    pub fn describe(&self) -> String {
        format!("{} per {}s", self.max_requests, self.window.as_secs())
    }

    pub fn check(&self, key: &K) -> Decision {
        self.check_at(key, Instant::now())
    }

    /// Record a hit for `key` at `now` if it fits in the window.
    pub fn check_at(&self, key: &K, now: Instant) -> Decision {
        let mut hits = self.hits.lock().unwrap_or_else(|e| e.into_inner());

        if hits.len() > PRUNE_THRESHOLD {
            let window = self.window;
            hits.retain(|_, times| {
                times
                    .back()
                    .is_some_and(|last| now.saturating_duration_since(*last) < window)
            });
        }

        let times = hits.entry(key.clone()).or_default();
        while times
            .front()
            .is_some_and(|first| now.saturating_duration_since(*first) >= self.window)
        {
            times.pop_front();
        }

        if times.len() < self.max_requests as usize {
            times.push_back(now);
            return Decision::Allowed;
        }

        let retry_after = times
            .front()
            .map(|first| self.window.saturating_sub(now.saturating_duration_since(*first)))
            .unwrap_or(self.window);
        Decision::Limited { retry_after }
    }

    pub fn tracked_clients(&self) -> usize {
        self.hits.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}
