use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use crate::domain::UserId;

// ============== Rate Limiter (Token Bucket) ==============

#[derive(Clone, Debug)]
struct Bucket {
    tokens: f64,
    last_update: Instant,
}

/// Per-user token bucket guarding lookups against the Bot API.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    enabled: bool,
    max_tokens: f64,
    refill_per_sec: f64,
    window: Duration,
    last_sweep: Option<Instant>,
    buckets: HashMap<UserId, Bucket>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RateDecision {
    Allowed,
    Limited { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(enabled: bool, max_tokens: u32, window: Duration) -> Self {
        let max_tokens_f = f64::from(max_tokens.max(1));
        let window_secs = window.as_secs_f64().max(1e-9);

        Self {
            enabled,
            max_tokens: max_tokens_f,
            refill_per_sec: max_tokens_f / window_secs,
            window,
            last_sweep: None,
            buckets: HashMap::new(),
        }
    }

    pub fn check(&mut self, user_id: UserId) -> RateDecision {
        self.check_at(user_id, Instant::now())
    }

    pub fn check_at(&mut self, user_id: UserId, now: Instant) -> RateDecision {
        if !self.enabled {
            return RateDecision::Allowed;
        }
        self.sweep(now);

        let bucket = self.buckets.entry(user_id).or_insert_with(|| Bucket {
            tokens: self.max_tokens,
            last_update: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_update).as_secs_f64();
        bucket.tokens = (bucket.tokens + elapsed * self.refill_per_sec).min(self.max_tokens);
        bucket.last_update = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return RateDecision::Allowed;
        }

        let secs = (1.0 - bucket.tokens) / self.refill_per_sec;
        RateDecision::Limited {
            retry_after: Duration::from_secs_f64(secs.max(0.0)),
        }
    }

    // A bucket that has refilled completely is indistinguishable from a new one.
    // Sweep at most once per window.
    fn sweep(&mut self, now: Instant) {
        let due = self
            .last_sweep
            .map_or(true, |at| now.saturating_duration_since(at) >= self.window);
        if !due {
            return;
        }
        self.last_sweep = Some(now);

        let (max, rate) = (self.max_tokens, self.refill_per_sec);
        self.buckets.retain(|_, b| {
            let elapsed = now.saturating_duration_since(b.last_update).as_secs_f64();
            b.tokens + elapsed * rate < max
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_limiter_basic_refill() {
        let start = Instant::now();
        let mut rl = RateLimiter::new(true, 2, Duration::from_secs(10));
        let u = UserId(1);

        assert_eq!(rl.check_at(u, start), RateDecision::Allowed);
        assert_eq!(rl.check_at(u, start), RateDecision::Allowed);
        let RateDecision::Limited { retry_after } = rl.check_at(u, start) else {
            panic!("third request should be limited");
        };
        assert!(retry_after > Duration::from_secs(4) && retry_after <= Duration::from_secs(5));

        // After 5 seconds, we should have refilled 1 token (2 tokens / 10s).
        assert_eq!(
            rl.check_at(u, start + Duration::from_secs(5)),
            RateDecision::Allowed
        );
    }

    #[test]
    fn buckets_are_per_user() {
        let start = Instant::now();
        let mut rl = RateLimiter::new(true, 1, Duration::from_secs(60));

        assert_eq!(rl.check_at(UserId(1), start), RateDecision::Allowed);
        assert!(matches!(
            rl.check_at(UserId(1), start),
            RateDecision::Limited { .. }
        ));
        assert_eq!(rl.check_at(UserId(2), start), RateDecision::Allowed);
    }

    #[test]
    fn idle_users_are_forgotten_after_a_window() {
        let start = Instant::now();
        let mut rl = RateLimiter::new(true, 2, Duration::from_secs(10));

        for id in 0..100 {
            assert_eq!(rl.check_at(UserId(id), start), RateDecision::Allowed);
        }
        assert_eq!(rl.buckets.len(), 100);

        let later = start + Duration::from_secs(10);
        assert_eq!(rl.check_at(UserId(500), later), RateDecision::Allowed);
        assert_eq!(rl.buckets.len(), 1);
    }

    #[test]
    fn sweeping_keeps_partially_drained_buckets() {
        let start = Instant::now();
        let mut rl = RateLimiter::new(true, 1, Duration::from_secs(60));
        rl.check_at(UserId(1), start);

        // Force a sweep while user 1 is still empty.
        rl.last_sweep = None;
        rl.check_at(UserId(2), start + Duration::from_secs(1));
        assert!(matches!(
            rl.check_at(UserId(1), start + Duration::from_secs(2)),
            RateDecision::Limited { .. }
        ));
    }

    #[test]
    fn disabled_limiter_always_allows() {
        let start = Instant::now();
        let mut rl = RateLimiter::new(false, 1, Duration::from_secs(60));
        for _ in 0..10 {
            assert_eq!(rl.check_at(UserId(1), start), RateDecision::Allowed);
        }
    }
}
