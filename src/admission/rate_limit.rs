//! Fixed-window rate limiting.
//!
//! Fixed-window (not sliding or token bucket): O(1) state per key and a
//! trivial reset rule, acceptable for a client-side soft guard that is not
//! the system of record for abuse prevention.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::observability::metrics;

/// Default per-key allowance when the caller does not pass one.
pub const DEFAULT_LIMIT: u32 = 100;
/// Default window length in milliseconds.
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

struct WindowCounter {
    count: u32,
    window_start: Instant,
    window: Duration,
}

impl WindowCounter {
    fn expired(&self, now: Instant) -> bool {
        now.duration_since(self.window_start) >= self.window
    }
}

/// Per-key fixed-window counters. Counters are created lazily on first use
/// and purged once their window has fully elapsed; nothing survives a
/// process restart.
pub struct RateLimiter {
    counters: Mutex<HashMap<String, WindowCounter>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(HashMap::new()),
        }
    }

    /// Record one hit against `key` and decide admission.
    ///
    /// Returns `true` to allow, `false` when the key is over `limit` for the
    /// current window. A denied hit does not increment the counter.
    pub fn check(&self, key: &str, limit: u32, window_ms: u64) -> bool {
        self.check_at(key, limit, window_ms, Instant::now())
    }

    // Clock-injected core so window expiry is testable without sleeping.
    fn check_at(&self, key: &str, limit: u32, window_ms: u64, now: Instant) -> bool {
        let window = Duration::from_millis(window_ms);
        let mut counters = self.counters.lock().expect("rate limiter mutex poisoned");

        // Housekeeping: drop every counter whose window has elapsed.
        counters.retain(|_, c| !c.expired(now));

        match counters.entry(key.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(WindowCounter {
                    count: 1,
                    window_start: now,
                    window,
                });
                true
            }
            Entry::Occupied(mut slot) => {
                let counter = slot.get_mut();
                if counter.expired(now) {
                    counter.count = 1;
                    counter.window_start = now;
                    counter.window = window;
                    true
                } else if counter.count >= limit {
                    metrics::record_rate_limited(key);
                    false
                } else {
                    counter.count += 1;
                    true
                }
            }
        }
    }

    /// Number of live counters, for diagnostics.
    pub fn tracked_keys(&self) -> usize {
        self.counters.lock().expect("rate limiter mutex poisoned").len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}
