//! Per-channel rate limiting

use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Channel key used by the pending-buffer flush.
///
/// OSC addresses always start with `/`, so this never collides with one.
pub const BATCH_CHANNEL: &str = "batch";

/// Tracked channels before the first sweep of stale entries
const PRUNE_THRESHOLD: usize = 1024;

/// Admits at most one event per channel every `min_interval`
#[derive(Debug)]
pub struct RateLimiter {
    min_interval: Duration,
    last_accepted: HashMap<String, Instant>,
    prune_at: usize,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_accepted: HashMap::new(),
            prune_at: PRUNE_THRESHOLD,
        }
    }

    /// Admit an event on `channel` at `now`
    ///
    /// Returns true and records `now` if at least `min_interval` has passed
    /// since the last admitted event on this channel (or if the channel has
    /// never admitted anything). Rejections leave the state untouched.
    pub fn admit(&mut self, channel: &str, now: Instant) -> bool {
        if let Some(last) = self.last_accepted.get_mut(channel) {
            if now.saturating_duration_since(*last) < self.min_interval {
                return false;
            }
            *last = now;
            return true;
        }

        if self.last_accepted.len() >= self.prune_at {
            self.prune(now);
        }
        self.last_accepted.insert(channel.to_string(), now);
        true
    }

    /// Drop entries old enough that they would admit anyway
    fn prune(&mut self, now: Instant) {
        let min_interval = self.min_interval;
        self.last_accepted
            .retain(|_, last| now.saturating_duration_since(*last) < min_interval);
        // Amortise: the next sweep waits until the live set doubles
        self.prune_at = (self.last_accepted.len() * 2).max(PRUNE_THRESHOLD);
    }

    /// Number of channels currently tracked
    pub fn tracked_channels(&self) -> usize {
        self.last_accepted.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(100);

    #[test]
    fn test_first_call_admitted() {
        let mut limiter = RateLimiter::new(INTERVAL);
        assert!(limiter.admit("/fresh", Instant::now()));
    }

    #[test]
    fn test_within_interval_rejected() {
        let mut limiter = RateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        assert!(limiter.admit("/a", t0));
        assert!(!limiter.admit("/a", t0 + Duration::from_millis(99)));
        assert!(limiter.admit("/a", t0 + INTERVAL));
    }

    #[test]
    fn test_rejection_does_not_reset_window() {
        let mut limiter = RateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        assert!(limiter.admit("/a", t0));
        // A rejected call at 60ms must not push the window out to 160ms
        assert!(!limiter.admit("/a", t0 + Duration::from_millis(60)));
        assert!(limiter.admit("/a", t0 + Duration::from_millis(100)));
    }

    #[test]
    fn test_channels_are_independent() {
        let mut limiter = RateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        assert!(limiter.admit("/a", t0));
        assert!(limiter.admit("/b", t0));
        assert!(limiter.admit(BATCH_CHANNEL, t0));
        assert!(!limiter.admit("/a", t0 + Duration::from_millis(1)));
    }

    #[test]
    fn test_admitted_count_matches_spacing() {
        let mut limiter = RateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        // Events every 30ms over 1s: accepted at 0, 120, 240, ... 960
        let admitted = (0..34)
            .map(|i| t0 + Duration::from_millis(i * 30))
            .filter(|t| limiter.admit("/a", *t))
            .count();
        assert_eq!(admitted, 9);
    }

    #[test]
    fn test_stale_channels_pruned() {
        let mut limiter = RateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        for i in 0..PRUNE_THRESHOLD {
            assert!(limiter.admit(&format!("/old/{}", i), t0));
        }
        assert_eq!(limiter.tracked_channels(), PRUNE_THRESHOLD);

        // Every old entry is past the interval, so the sweep clears them all
        let later = t0 + INTERVAL;
        assert!(limiter.admit("/new", later));
        assert_eq!(limiter.tracked_channels(), 1);
        assert!(!limiter.admit("/new", later + Duration::from_millis(1)));
        assert!(limiter.admit("/old/0", later));
    }

    #[test]
    fn test_prune_keeps_live_channels() {
        let mut limiter = RateLimiter::new(INTERVAL);
        let t0 = Instant::now();
        for i in 0..PRUNE_THRESHOLD {
            assert!(limiter.admit(&format!("/live/{}", i), t0));
        }

        // Still inside the interval: nothing can be dropped
        let soon = t0 + Duration::from_millis(10);
        assert!(limiter.admit("/extra", soon));
        assert_eq!(limiter.tracked_channels(), PRUNE_THRESHOLD + 1);
        assert!(!limiter.admit("/live/0", soon));
    }
}
