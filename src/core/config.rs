//! # Supervisor configuration.
//!
//! Provides [`SupervisorConfig`], the settings shared by every unit of one
//! supervisor:
//! 1. **Supervisor creation**: `Supervisor::builder(config)`
//! 2. **Unit defaults**: retry delay for units registered without one
//!
//! ## Environment overrides
//! [`SupervisorConfig::from_env`] reads:
//! - `UNITVISOR_SERVICE_NAME` → `service_name`
//! - `UNITVISOR_SYSLOG`       → `syslog` (`true`/`false`/`1`/`0`...)
//! - `UNITVISOR_RETRY_DELAY`  → constant `backoff` (`"500ms"`, `"2s"`...)

use std::time::Duration;

use crate::error::EnvError;
use crate::logging::SyslogSink;
use crate::namespace::{Bind, Binder, Env};
use crate::policies::BackoffPolicy;

/// Default syslog tag.
pub const DEFAULT_SERVICE_NAME: &str = "unitvisor-daemon";

/// Settings of one supervisor.
///
/// ## Field semantics
/// - `service_name`: tag attached to system log records
/// - `syslog`: mirror fatal/error records of async units to the system log
/// - `backoff`: delay between failed attempts for units without their own (default: none)
#[derive(Clone, Debug)]
pub struct SupervisorConfig {
    /// Tag used for system log records.
    pub service_name: String,

    /// Mirror panics and async start failures to the system log (unix only).
    pub syslog: bool,

    /// Default delay policy between failed `on_start` attempts.
    ///
    /// Overridden per unit by `UnitOptions::with_restart_delay`/`with_backoff`.
    pub backoff: BackoffPolicy,
}

impl SupervisorConfig {
    /// Default configuration with overrides from the process environment.
    pub fn from_env() -> Result<Self, EnvError> {
        Self::from_env_snapshot(&Env::process())
    }

    /// Default configuration with overrides from `env`.
    pub fn from_env_snapshot(env: &Env) -> Result<Self, EnvError> {
        let mut cfg = Self::default();
        env.assign(&mut cfg)?;
        Ok(cfg)
    }

    /// Builds the system log sink described by this config.
    pub fn syslog_sink(&self) -> SyslogSink {
        if self.syslog {
            SyslogSink::new(self.service_name.as_str())
        } else {
            SyslogSink::disabled()
        }
    }
}

impl Default for SupervisorConfig {
    /// - `service_name = "unitvisor-daemon"`
    /// - `syslog = true`
    /// - `backoff = BackoffPolicy::default()` (no delay)
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            syslog: true,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl Bind for SupervisorConfig {
    fn bind(&mut self, b: &mut Binder<'_>) -> Result<(), EnvError> {
        b.optional("unitvisor_service_name", &mut self.service_name)?;
        b.optional("unitvisor_syslog", &mut self.syslog)?;

        if b.contains("unitvisor_retry_delay") {
            let mut delay = Duration::ZERO;
            b.required("unitvisor_retry_delay", &mut delay)?;
            self.backoff = BackoffPolicy::constant(delay);
        }
        Ok(())
    }
}
