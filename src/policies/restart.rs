//! # Restart policies for units.
//!
//! [`RestartPolicy`] determines what the watchdog does when `on_start` returns an error.
//!
//! ```text
//! RestartPolicy::Ignore  → one attempt, the result is returned/logged as is
//! RestartPolicy::Retry   → up to `max_retry` attempts, each failure logged
//! RestartPolicy::Always  → attempt until success or supervisor shutdown (async units only)
//! ```

use std::fmt;

/// Policy controlling whether `on_start` is attempted again after a failure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum RestartPolicy {
    /// Single attempt (default).
    #[default]
    Ignore,
    /// Up to `max_retry` attempts; stops at the first success.
    ///
    /// Not aware of supervisor shutdown: the loop runs to success or exhaustion.
    Retry,
    /// Attempts forever until one succeeds or the supervisor is stopped.
    ///
    /// Rejected for blocking units, because it could suspend `run` forever.
    Always,
}

impl RestartPolicy {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            RestartPolicy::Ignore => "ignore",
            RestartPolicy::Retry => "retry",
            RestartPolicy::Always => "always",
        }
    }
}

impl fmt::Display for RestartPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}
