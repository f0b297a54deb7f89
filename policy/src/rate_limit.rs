// Poisoned mutex should fail the program.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use std::time::Instant;

use crate::chain::Policy;
use crate::context::PolicyDecision;
use crate::context::RequestContext;

/// Which part of `ctx.peer` the sliding window buckets on. The peer format
/// is transport-dependent (`ipv4:host:port`, `unix:...`); keying on the
/// full string separates requests from the same host on different ports,
/// keying on the host folds them together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitKey {
    FullPeer,
    HostOnly,
}

fn bucket_key(peer: &str, key: RateLimitKey) -> String {
    match key {
        RateLimitKey::FullPeer => peer.to_string(),
        RateLimitKey::HostOnly => {
            let rest = peer.strip_prefix("ipv4:").or_else(|| peer.strip_prefix("ipv6:")).unwrap_or(peer);
            match rest.rfind(':') {
                Some(i) => rest[..i].to_string(),
                None => rest.to_string(),
            }
        }
    }
}

/// Sliding-window rate limit keyed by `ctx.peer`. `VecDeque` gives O(1)
/// amortized prune-from-front instead of a `Vec` retain-and-reallocate.
pub struct RateLimitPolicy {
    max_requests: usize,
    window: Duration,
    key: RateLimitKey,
    history: Mutex<HashMap<String, VecDeque<Instant>>>,
}

impl RateLimitPolicy {
    pub fn new(max_requests: usize, window: Duration) -> Self {
        RateLimitPolicy { max_requests, window, key: RateLimitKey::FullPeer, history: Mutex::new(HashMap::new()) }
    }

    pub fn with_key(max_requests: usize, window: Duration, key: RateLimitKey) -> Self {
        RateLimitPolicy { max_requests, window, key, history: Mutex::new(HashMap::new()) }
    }
}

impl Policy for RateLimitPolicy {
    fn check(&self, ctx: &RequestContext) -> PolicyDecision {
        let now = Instant::now();
        let key = bucket_key(&ctx.peer, self.key);
        let mut history = self.history.lock().expect("rate limit history poisoned");
        let timestamps = history.entry(key).or_default();
        while let Some(front) = timestamps.front() {
            if now.duration_since(*front) > self.window {
                timestamps.pop_front();
            } else {
                break;
            }
        }
        if timestamps.len() >= self.max_requests {
            return PolicyDecision::deny(format!(
                "rate limit exceeded for peer '{}': {} requests in the last {:?}",
                ctx.peer, self.max_requests, self.window
            ));
        }
        timestamps.push_back(now);
        PolicyDecision::allow()
    }
}
