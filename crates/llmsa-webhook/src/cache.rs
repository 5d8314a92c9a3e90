//! TTL cache over successful verifications.
//!
//! Only verified-pass outcomes are cached — a failure may start passing
//! after a new push, so failures are never remembered. Entries expire
//! lazily on lookup. Time is the monotonic clock.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Success cache keyed by attestation OCI reference.
#[derive(Debug)]
pub struct VerifierCache {
    ttl: Duration,
    entries: RwLock<HashMap<String, Instant>>,
}

impl VerifierCache {
    /// Create a cache with the given TTL. A TTL of zero or less disables
    /// caching entirely.
    pub fn new(ttl_seconds: i64) -> Self {
        let ttl = if ttl_seconds > 0 {
            Duration::from_secs(ttl_seconds as u64)
        } else {
            Duration::ZERO
        };
        VerifierCache {
            ttl,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Whether the cache is active.
    pub fn enabled(&self) -> bool {
        !self.ttl.is_zero()
    }

    /// Whether `key` has an unexpired success entry. Expired entries are
    /// evicted on the way out.
    pub fn has_fresh(&self, key: &str, now: Instant) -> bool {
        if !self.enabled() {
            return false;
        }
        let expires_at = {
            let entries = self.entries.read().expect("cache lock poisoned");
            match entries.get(key) {
                Some(at) => *at,
                None => return false,
            }
        };
        if expires_at > now {
            return true;
        }
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.remove(key);
        false
    }

    /// Record a successful verification; the entry expires at
    /// `now + ttl`.
    pub fn put_success(&self, key: &str, now: Instant) {
        if !self.enabled() {
            return;
        }
        let mut entries = self.entries.write().expect("cache lock poisoned");
        entries.insert(key.to_owned(), now + self.ttl);
    }
}
