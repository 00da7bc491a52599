//! Project move lock
//!
//! Mutual exclusion for move and rebalance operations, scoped per project.
//! The contract mirrors a distributed lock service: acquisition spins with a
//! bounded budget, every acquisition carries a caller-unique owner token, and
//! release succeeds only for the owner that still holds the key. TTL expiry
//! lets a new owner take over a crashed holder's key; the stale owner's later
//! release then returns false instead of stealing the lock back.

use crate::config::LockConfig;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Distributed-lock seam. Production deployments back this with a shared
/// store (e.g. Redis); `LocalLockService` covers single-process use.
pub trait LockService: Send + Sync {
    /// Try to acquire `key` for `owner`, spinning within the service's
    /// acquisition budget. The lock auto-expires after `ttl`.
    fn spin_lock(&self, key: &str, owner: &str, ttl: Duration) -> bool;

    /// Release `key` if and only if `owner` still holds it.
    fn release(&self, key: &str, owner: &str) -> bool;
}

struct Holder {
    owner: String,
    expires_at: Instant,
}

/// In-process lock service with TTL takeover.
pub struct LocalLockService {
    holders: Mutex<HashMap<String, Holder>>,
    acquire_timeout: Duration,
    poll_interval: Duration,
}

impl LocalLockService {
    pub fn new(config: &LockConfig) -> Self {
        Self {
            holders: Mutex::new(HashMap::new()),
            acquire_timeout: config.acquire_timeout(),
            poll_interval: config.poll_interval(),
        }
    }

    fn try_acquire(&self, key: &str, owner: &str, ttl: Duration) -> bool {
        let mut holders = self.holders.lock();
        let now = Instant::now();
        match holders.get(key) {
            Some(holder) if holder.expires_at > now => false,
            _ => {
                holders.insert(
                    key.to_string(),
                    Holder {
                        owner: owner.to_string(),
                        expires_at: now + ttl,
                    },
                );
                true
            }
        }
    }
}

impl Default for LocalLockService {
    fn default() -> Self {
        Self::new(&LockConfig::default())
    }
}

impl LockService for LocalLockService {
    fn spin_lock(&self, key: &str, owner: &str, ttl: Duration) -> bool {
        let deadline = Instant::now() + self.acquire_timeout;
        loop {
            if self.try_acquire(key, owner, ttl) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(self.poll_interval);
        }
    }

    fn release(&self, key: &str, owner: &str) -> bool {
        let mut holders = self.holders.lock();
        match holders.get(key) {
            Some(holder) if holder.owner == owner => {
                holders.remove(key);
                true
            }
            _ => false,
        }
    }
}
