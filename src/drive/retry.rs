// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Exponential backoff for rate-limited and transient Drive responses.

use rand::Rng;
use std::time::Duration;

use super::error::DriveError;
use crate::config::RetryConfig;

/// 403 reasons Drive uses for quota throttling (as opposed to real permission denials).
const RATE_LIMIT_REASONS: &[&str] = &["rateLimitExceeded", "userRateLimitExceeded"];

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_millis(8_000),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt` (0-based), without jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_backoff
            .checked_mul(factor)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Delay before retry number `attempt`. A server-provided `Retry-After`
    /// wins over the computed delay but is still capped.
    pub fn delay(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        if let Some(server_delay) = retry_after {
            return server_delay.min(self.max_backoff);
        }
        let base = self.base_delay(attempt);
        let jitter_cap = (base.as_millis() / 4) as u64;
        let jitter = if jitter_cap > 0 {
            rand::thread_rng().gen_range(0..=jitter_cap)
        } else {
            0
        };
        (base + Duration::from_millis(jitter)).min(self.max_backoff)
    }
}

/// Whether a status/reason pair is worth retrying.
pub fn is_retryable_status(status: u16, reason: Option<&str>) -> bool {
    match status {
        429 | 500 | 502 | 503 | 504 => true,
        403 => reason
            .map(|r| RATE_LIMIT_REASONS.contains(&r))
            .unwrap_or(false),
        _ => false,
    }
}

pub fn is_retryable(err: &DriveError) -> bool {
    match err {
        DriveError::Api { status, reason, .. } => is_retryable_status(*status, reason.as_deref()),
        DriveError::Http(e) => e.is_timeout() || e.is_connect(),
        _ => false,
    }
}

/// Parse a `Retry-After` header given in seconds. HTTP-date values are ignored.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
