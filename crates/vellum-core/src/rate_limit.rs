//! In-memory fixed-window rate limiting.
//!
//! Two independent windows (per-minute and per-day) are tracked per key.
//! Buckets live in process memory only: they reset on restart and are not
//! shared across instances, so this is a soft guard, not a distributed
//! limiter. The map sits behind a mutex because the server runs on a
//! multi-threaded runtime.

use std::{
  collections::HashMap,
  sync::Mutex,
};

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

// ─── Limits and errors ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct RateLimits {
  pub per_minute: u32,
  pub per_day:    u32,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("rate limit exceeded for {key}, retry after {retry_after}")]
pub struct RateLimitExceeded {
  pub key:         String,
  pub retry_after: DateTime<Utc>,
}

// ─── Buckets ─────────────────────────────────────────────────────────────────

/// One counter plus the instant its window rolls over.
#[derive(Debug, Clone, Copy)]
struct Bucket {
  count:    u32,
  reset_at: DateTime<Utc>,
}

impl Bucket {
  fn fresh(now: DateTime<Utc>, window: Duration) -> Self {
    Self { count: 0, reset_at: now + window }
  }

  /// Roll the window forward if it has elapsed.
  fn refresh(&mut self, now: DateTime<Utc>, window: Duration) {
    if now >= self.reset_at {
      self.count = 0;
      self.reset_at = now + window;
    }
  }
}

#[derive(Debug, Clone, Copy)]
struct KeyBuckets {
  minute: Bucket,
  day:    Bucket,
}

// ─── Limiter ─────────────────────────────────────────────────────────────────

/// Per-key request counters over fixed minute and day windows.
///
/// Buckets are created lazily on first hit. A hit fails if either counter
/// has already reached its limit before incrementing; on success both
/// counters increment.
#[derive(Debug, Default)]
pub struct RateLimiter {
  buckets: Mutex<HashMap<String, KeyBuckets>>,
}

impl RateLimiter {
  pub fn new() -> Self { Self::default() }

  /// Count one hit against `key`, or fail with [`RateLimitExceeded`].
  pub fn hit(
    &self,
    key: &str,
    limits: RateLimits,
  ) -> Result<(), RateLimitExceeded> {
    self.hit_at(key, limits, Utc::now())
  }

  fn hit_at(
    &self,
    key: &str,
    limits: RateLimits,
    now: DateTime<Utc>,
  ) -> Result<(), RateLimitExceeded> {
    let minute_window = Duration::seconds(60);
    let day_window = Duration::days(1);

    let mut buckets = self.buckets.lock().expect("rate limiter poisoned");
    let entry = buckets.entry(key.to_owned()).or_insert_with(|| KeyBuckets {
      minute: Bucket::fresh(now, minute_window),
      day:    Bucket::fresh(now, day_window),
    });

    entry.minute.refresh(now, minute_window);
    entry.day.refresh(now, day_window);

    if entry.minute.count >= limits.per_minute {
      return Err(RateLimitExceeded {
        key:         key.to_owned(),
        retry_after: entry.minute.reset_at,
      });
    }
    if entry.day.count >= limits.per_day {
      return Err(RateLimitExceeded {
        key:         key.to_owned(),
        retry_after: entry.day.reset_at,
      });
    }

    entry.minute.count += 1;
    entry.day.count += 1;
    Ok(())
  }
}
