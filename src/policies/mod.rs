//! Restart and retry-delay policies.
//!
//! ## Contents
//! - [`RestartPolicy`] what happens when `on_start` fails (ignore / retry-N / always)
//! - [`BackoffPolicy`] how long to wait between failed attempts (first / factor / max + jitter)
//! - [`JitterPolicy`]  randomization of the delay
//!
//! ## Quick wiring
//! ```text
//! UnitOptions { restart, max_retry, backoff }
//!      └─► core::watchdog::Watchdog uses:
//!           - restart to pick the attempt loop
//!           - max_retry to bound RestartPolicy::Retry
//!           - backoff.next(attempt) to delay the next attempt
//! ```
//!
//! ## Defaults
//! - `RestartPolicy::Ignore` (one attempt).
//! - `BackoffPolicy::default()` → no delay between attempts.

mod backoff;
mod jitter;
mod restart;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use restart::RestartPolicy;
