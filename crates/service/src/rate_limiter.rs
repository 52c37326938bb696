use std::time::{Duration, Instant};

use dashmap::DashMap;
use tracing::{debug, warn};

/// One counting window for a single key.
#[derive(Debug)]
pub struct FixedWindow {
    limit: u32,
    window: Duration,
    started: Instant,
    used: u32,
}

impl FixedWindow {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self { limit, window, started: Instant::now(), used: 0 }
    }

    /// Count one hit at `now`. `Err` carries the time left until the window resets.
    pub fn try_acquire(&mut self, now: Instant) -> Result<u32, Duration> {
        self.roll(now);
        if self.used < self.limit {
            self.used += 1;
            debug!("window hit, remaining: {}", self.limit - self.used);
            Ok(self.limit - self.used)
        } else {
            let retry_after = self.window.saturating_sub(now.duration_since(self.started));
            warn!("Rate limit exceeded, used: {}, limit: {}", self.used, self.limit);
            Err(retry_after)
        }
    }

    fn roll(&mut self, now: Instant) {
        if now.duration_since(self.started) >= self.window {
            self.started = now;
            self.used = 0;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateDecision {
    Allowed { remaining: u32 },
    Limited { retry_after: Duration },
}

impl RateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed { .. })
    }
}

/// Per-key fixed-window limiter (`limit` hits per `window`).
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    enabled: bool,
    windows: DashMap<String, FixedWindow>,
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration, enabled: bool) -> Self {
        Self { limit, window, enabled, windows: DashMap::new() }
    }

    pub fn from_config(cfg: &configs::RateLimitConfig) -> Self {
        Self::new(cfg.me_requests, Duration::from_secs(cfg.me_window_secs), cfg.enabled)
    }

    pub fn check(&self, key: &str) -> RateDecision {
        if !self.enabled {
            return RateDecision::Allowed { remaining: self.limit };
        }
        let now = Instant::now();
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| FixedWindow::new(self.limit, self.window));
        match entry.try_acquire(now) {
            Ok(remaining) => RateDecision::Allowed { remaining },
            Err(retry_after) => RateDecision::Limited { retry_after },
        }
    }

    /// Drop windows idle for longer than one period.
    pub fn prune(&self) {
        let now = Instant::now();
        self.windows.retain(|_, w| now.duration_since(w.started) < w.window);
    }
}
