//! # Registration options.
//!
//! ```rust
//! use std::time::Duration;
//! use unitvisor::{RestartPolicy, UnitOptions};
//!
//! let opts = UnitOptions::new()
//!     .with_index(10)
//!     .with_namespace("http")
//!     .with_restart(RestartPolicy::Retry)
//!     .with_max_retry(3)
//!     .with_restart_delay(Duration::from_millis(200))
//!     .with_description("public listener");
//! assert_eq!(opts.index(), 10);
//! ```

use std::time::Duration;

use crate::namespace::PUBLIC_NAMESPACE;
use crate::policies::{BackoffPolicy, RestartPolicy};

/// Scheduling metadata applied to a unit at registration.
///
/// Defaults: index `0` (no explicit priority), one retry, public namespace,
/// `RestartPolicy::Ignore`, retry delay inherited from the supervisor config.
#[derive(Clone, Debug)]
pub struct UnitOptions {
    pub(crate) index: i32,
    pub(crate) max_retry: i32,
    pub(crate) namespace: String,
    pub(crate) description: String,
    pub(crate) restart: RestartPolicy,
    pub(crate) backoff: Option<BackoffPolicy>,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            index: 0,
            max_retry: 1,
            namespace: PUBLIC_NAMESPACE.to_string(),
            description: String::new(),
            restart: RestartPolicy::Ignore,
            backoff: None,
        }
    }
}

impl UnitOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start priority: lower starts first. `0` means "no explicit priority".
    pub fn with_index(mut self, index: i32) -> Self {
        self.index = index;
        self
    }

    /// Number of attempts for [`RestartPolicy::Retry`] (values below 1 count as 1).
    pub fn with_max_retry(mut self, max_retry: i32) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// Namespace the unit joins (created on first use).
    pub fn with_namespace(mut self, name: impl Into<String>) -> Self {
        self.namespace = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_restart(mut self, restart: RestartPolicy) -> Self {
        self.restart = restart;
        self
    }

    /// Constant delay between failed attempts.
    pub fn with_restart_delay(mut self, delay: Duration) -> Self {
        self.backoff = Some(BackoffPolicy::constant(delay));
        self
    }

    /// Full delay policy between failed attempts.
    pub fn with_backoff(mut self, backoff: BackoffPolicy) -> Self {
        self.backoff = Some(backoff);
        self
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}
