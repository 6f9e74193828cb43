//! # Pluggable logger.
//!
//! Records are a message plus a flat list of key/value pairs:
//!
//! ```rust
//! use unitvisor::{Logger, TracingLogger};
//!
//! let log = TracingLogger;
//! log.warn("unitvisor: ignoring service.", &[("name", &"metrics")]);
//! ```

use std::fmt::{self, Display, Write};

/// One key/value pair of a log record.
pub type Field<'a> = (&'a str, &'a dyn Display);

/// Severity of a log record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    /// A contained panic; the unit that produced it is gone.
    Fatal,
}

impl Level {
    pub fn as_label(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Structured log sink used by the supervisor.
///
/// Only [`Logger::log`] is required; the severity helpers forward to it.
/// Implementations must not block for long: they are called from the
/// supervisor and from every async unit's worker.
pub trait Logger: Send + Sync + 'static {
    /// Writes one record.
    fn log(&self, level: Level, msg: &str, fields: &[Field<'_>]);

    fn debug(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::Debug, msg, fields);
    }

    fn info(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::Info, msg, fields);
    }

    fn warn(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::Warn, msg, fields);
    }

    fn error(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::Error, msg, fields);
    }

    fn fatal(&self, msg: &str, fields: &[Field<'_>]) {
        self.log(Level::Fatal, msg, fields);
    }
}

/// Default logger: forwards every record to `tracing` under the `unitvisor` target.
///
/// The keys the supervisor always uses (`name`, `reason`, `retry`,
/// `restart_policy`) become event fields of their own. `tracing` needs field
/// names at compile time, so any other pair is rendered into one
/// `fields="k=v k=v"` value. `Fatal` records are emitted at `ERROR` with
/// `fatal=true`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingLogger;

/// Event fields of one record: the well-known keys plus the rendered rest.
#[derive(Default)]
struct EventFields {
    name: Option<String>,
    reason: Option<String>,
    retry: Option<String>,
    restart_policy: Option<String>,
    rest: String,
}

impl EventFields {
    fn split(fields: &[Field<'_>]) -> Self {
        let mut out = Self::default();
        let mut rest = Vec::new();
        for &(key, value) in fields {
            let slot = match key {
                "name" => &mut out.name,
                "reason" => &mut out.reason,
                "retry" => &mut out.retry,
                "restart_policy" => &mut out.restart_policy,
                _ => {
                    rest.push((key, value));
                    continue;
                }
            };
            *slot = Some(value.to_string());
        }
        out.rest = render(&rest);
        out
    }
}

impl Logger for TracingLogger {
    fn log(&self, level: Level, msg: &str, fields: &[Field<'_>]) {
        let f = EventFields::split(fields);
        let (name, reason, retry, policy) = (
            f.name.as_deref(),
            f.reason.as_deref(),
            f.retry.as_deref(),
            f.restart_policy.as_deref(),
        );
        let rest = f.rest.as_str();

        macro_rules! emit {
            ($mac:ident $(, $flag:ident = $val:expr)?) => {
                tracing::$mac!(
                    target: "unitvisor",
                    $($flag = $val,)?
                    name = name,
                    reason = reason,
                    retry = retry,
                    restart_policy = policy,
                    fields = rest,
                    "{}",
                    msg
                )
            };
        }

        match level {
            Level::Debug => emit!(debug),
            Level::Info => emit!(info),
            Level::Warn => emit!(warn),
            Level::Error => emit!(error),
            Level::Fatal => emit!(error, fatal = true),
        }
    }
}

/// Renders fields as `k=v` pairs separated by spaces.
pub(crate) fn render(fields: &[Field<'_>]) -> String {
    let mut out = String::new();
    for (i, (key, value)) in fields.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{key}={value}");
    }
    out
}
