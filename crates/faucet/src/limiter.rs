//! Fixed-window request rate limiting keyed by client identifier.

use moka::ops::compute::Op;
use moka::sync::Cache;
use std::time::{Duration, Instant};
use tracing::debug;

/// A single client's window: how many requests it has made and when the
/// window opened.
#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// Fixed-window request counter with a bounded, TTL-evicting store.
///
/// Semantics are deliberately fixed-window (not a sliding log): a client
/// gets `max_limit` requests per window measured from its first request,
/// and the counter resets wholesale once the window elapses. Bursts at
/// window boundaries are an accepted approximation.
///
/// Entries are evicted after `ttl` regardless of window size, which bounds
/// memory for idle clients. The constructor clamps `ttl` upward to
/// `min_ttl` (the largest configured window) so a live window can never be
/// forgotten early and hand out an extra allowance.
pub struct RateLimiter {
    store: Cache<String, Window>,
}

impl RateLimiter {
    pub fn new(capacity: u64, ttl: Duration, min_ttl: Duration) -> Self {
        let ttl = ttl.max(min_ttl);
        let store = Cache::builder().max_capacity(capacity).time_to_live(ttl).build();
        Self { store }
    }

    /// Admit or reject one request from `client_id` under the given policy.
    ///
    /// The increment-or-reset is a single atomic read-modify-write on the
    /// client's entry, so two concurrent requests cannot both slip through
    /// at `count == max_limit - 1`. A rejected request does not consume an
    /// allowance slot, and it leaves the record untouched (no write, no TTL
    /// refresh), so hammering a rejected client cannot keep its record
    /// alive past the store TTL.
    pub fn admit(&self, client_id: &str, max_limit: u32, window: Duration) -> bool {
        let now = Instant::now();
        let mut admitted = true;

        self.store.entry(client_id.to_owned()).and_compute_with(|existing| match existing {
            None => Op::Put(Window { count: 1, started_at: now }),
            Some(entry) => {
                let w = entry.into_value();
                if now.duration_since(w.started_at) < window {
                    if w.count >= max_limit {
                        admitted = false;
                        Op::Nop
                    } else {
                        Op::Put(Window { count: w.count + 1, started_at: w.started_at })
                    }
                } else {
                    Op::Put(Window { count: 1, started_at: now })
                }
            }
        });

        if !admitted {
            debug!(client_id, max_limit, "rate limit exceeded");
        }
        admitted
    }

    /// Number of live entries. Approximate until pending maintenance runs.
    #[cfg(test)]
    fn entry_count(&self) -> u64 {
        self.store.run_pending_tasks();
        self.store.entry_count()
    }
}
