//! # Logging capability.
//!
//! ```text
//! Supervisor / Watchdog ──► Arc<dyn Logger> ──► TracingLogger (default) │ user logger
//!                      └──► SyslogSink (fatal/error mirror, unix only)
//! ```
//!
//! - [`Logger`] pluggable sink with `debug/info/warn/error/fatal`
//! - [`TracingLogger`] default implementation on top of `tracing`
//! - [`SyslogSink`] best-effort delivery to the OS system log

mod logger;
mod syslog;

pub use logger::{Field, Level, Logger, TracingLogger};
pub use syslog::{Severity, SyslogSink};

#[cfg(test)]
pub(crate) mod testing;
