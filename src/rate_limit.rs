use std::net::IpAddr;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::forms::FormKind;

/// Per-IP-per-form submission rate limiter using a fixed window.
pub struct SubmissionRateLimiter {
    /// (form, ip) -> (count, window_start)
    entries: DashMap<(FormKind, IpAddr), (u32, Instant)>,
    limit: u32,
    window: Duration,
}

impl SubmissionRateLimiter {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        Self {
            entries: DashMap::new(),
            limit,
            window: Duration::from_secs(window_secs),
        }
    }

    /// Check if a submission is allowed. Returns Ok(()) or Err with retry-after seconds.
    pub fn check(&self, kind: FormKind, ip: IpAddr) -> Result<(), u64> {
        let now = Instant::now();

        let mut entry = self.entries.entry((kind, ip)).or_insert((0, now));
        let (count, start) = entry.value_mut();

        if now.duration_since(*start) > self.window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        if *count >= self.limit {
            let elapsed = now.duration_since(*start).as_secs();
            return Err(self.window.as_secs().saturating_sub(elapsed));
        }

        *count += 1;
        Ok(())
    }

    /// Remove entries whose window has passed.
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.entries
            .retain(|_, (_, start)| now.duration_since(*start) <= self.window);
    }
}
