//! # Delay between failed `on_start` attempts.
//!
//! [`BackoffPolicy`] computes the pause before attempt `n + 1` as
//! `first × factor^n`, clamped to `max`, then jittered. The default policy has a
//! zero `first` delay: attempts follow each other immediately.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use unitvisor::{BackoffPolicy, JitterPolicy};
//!
//! let fixed = BackoffPolicy::constant(Duration::from_millis(500));
//! assert_eq!(fixed.next(0), Duration::from_millis(500));
//! assert_eq!(fixed.next(7), Duration::from_millis(500));
//!
//! let growing = BackoffPolicy {
//!     first: Duration::from_millis(100),
//!     max: Duration::from_secs(1),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//! assert_eq!(growing.next(1), Duration::from_millis(200));
//! assert_eq!(growing.next(10), Duration::from_secs(1));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Retry delay policy.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay after the first failed attempt. `Duration::ZERO` disables delays.
    pub first: Duration,
    /// Upper bound for any computed delay.
    pub max: Duration,
    /// Multiplicative growth factor (`1.0` = constant delay).
    pub factor: f64,
    /// Randomization applied to the clamped delay.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// No delay between attempts.
    fn default() -> Self {
        Self {
            first: Duration::ZERO,
            max: Duration::from_secs(30),
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Same delay after every failed attempt.
    pub fn constant(delay: Duration) -> Self {
        Self {
            first: delay,
            max: delay,
            factor: 1.0,
            jitter: JitterPolicy::None,
        }
    }

    /// True when the policy never waits.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.first.is_zero() || self.max.is_zero()
    }

    /// Computes the delay after failed attempt number `attempt` (0-indexed).
    ///
    /// The base is derived from the attempt number alone, so jitter never feeds
    /// back into later delays.
    pub fn next(&self, attempt: u32) -> Duration {
        if self.is_zero() {
            return Duration::ZERO;
        }
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);

        let base = if !secs.is_finite() || secs < 0.0 || secs > self.max.as_secs_f64() {
            self.max
        } else {
            Duration::from_secs_f64(secs)
        };
        self.jitter.apply(base)
    }
}
