//! Error types used by the unitvisor runtime, services and environment binding.
//!
//! This module defines three enums:
//!
//! - [`RuntimeError`] - errors raised by [`Supervisor::run`](crate::Supervisor::run).
//! - [`ServiceError`] - errors returned by the hooks of a [`Service`](crate::Service).
//! - [`EnvError`] - errors raised while reading or binding environment variables.
//!
//! All of them provide `as_label` for logs/metrics.

use thiserror::Error;

/// # Errors produced by the supervisor while starting units.
///
/// Every variant is fatal to the `run` call that produced it: no further unit is
/// installed or started. Units already started are left running; call
/// [`Supervisor::stop`](crate::Supervisor::stop) to shut them down.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// `on_install` of a unit returned an error.
    #[error("unitvisor: failed to call on_install. name: {unit}, reason: {source}")]
    Install {
        /// Name of the failing service.
        unit: String,
        /// Error returned by the service.
        #[source]
        source: ServiceError,
    },

    /// `on_start` of a blocking unit returned an error (after all retries).
    #[error("unitvisor: failed to start service. name: {unit}, reason: {source}")]
    Start {
        /// Name of the failing service.
        unit: String,
        /// Last error returned by the service.
        #[source]
        source: ServiceError,
    },

    /// `RestartPolicy::Always` was requested for a blocking unit.
    #[error("unitvisor: restart policy `always` can not be used in blocking mode. name: {unit}")]
    AlwaysInBlocking {
        /// Name of the rejected service.
        unit: String,
    },

    /// `on_start` of a blocking unit panicked.
    #[error("unitvisor: panic recovered in blocking service. name: {unit}, panic: {message}")]
    Panicked {
        /// Name of the panicking service.
        unit: String,
        /// Panic payload rendered as text.
        message: String,
    },
}

impl RuntimeError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use unitvisor::RuntimeError;
    ///
    /// let err = RuntimeError::AlwaysInBlocking { unit: "db".into() };
    /// assert_eq!(err.as_label(), "runtime_always_in_blocking");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuntimeError::Install { .. } => "runtime_install_failed",
            RuntimeError::Start { .. } => "runtime_start_failed",
            RuntimeError::AlwaysInBlocking { .. } => "runtime_always_in_blocking",
            RuntimeError::Panicked { .. } => "runtime_panicked",
        }
    }

    /// Name of the unit the error is about.
    pub fn unit(&self) -> &str {
        match self {
            RuntimeError::Install { unit, .. }
            | RuntimeError::Start { unit, .. }
            | RuntimeError::AlwaysInBlocking { unit }
            | RuntimeError::Panicked { unit, .. } => unit,
        }
    }
}

/// # Errors returned by service hooks.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ServiceError {
    /// The hook failed; the restart policy decides whether it is tried again.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The service did not override `on_start`.
    #[error("unimplemented on_start")]
    Unimplemented,

    /// Reading configuration from the environment failed.
    #[error(transparent)]
    Env(#[from] EnvError),
}

impl ServiceError {
    /// Builds a [`ServiceError::Fail`] from anything printable.
    ///
    /// ```
    /// use unitvisor::ServiceError;
    ///
    /// let err = ServiceError::fail("connection refused");
    /// assert_eq!(err.to_string(), "execution failed: connection refused");
    /// ```
    pub fn fail(error: impl std::fmt::Display) -> Self {
        ServiceError::Fail {
            error: error.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceError::Fail { .. } => "service_failed",
            ServiceError::Unimplemented => "service_unimplemented",
            ServiceError::Env(_) => "service_env",
        }
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(err: std::io::Error) -> Self {
        ServiceError::fail(err)
    }
}

/// # Errors produced by environment lookup and binding.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnvError {
    /// The variable is not set (or is outside the namespace scope).
    #[error("unitvisor: required environment variable {key} not found")]
    Missing {
        /// Uppercased variable name.
        key: String,
    },

    /// The variable is set but its value does not parse into the target type.
    #[error("unitvisor: error setting {key} from {value:?}: {reason}")]
    Parse {
        /// Uppercased variable name.
        key: String,
        /// Raw value.
        value: String,
        /// Parser message.
        reason: String,
    },
}

impl EnvError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    pub fn as_label(&self) -> &'static str {
        match self {
            EnvError::Missing { .. } => "env_missing",
            EnvError::Parse { .. } => "env_parse",
        }
    }

    /// Variable name the error is about.
    pub fn key(&self) -> &str {
        match self {
            EnvError::Missing { key } | EnvError::Parse { key, .. } => key,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_error_names_unit_and_cause() {
        let err = RuntimeError::Install {
            unit: "conf".into(),
            source: ServiceError::fail("bad json"),
        };
        let msg = err.to_string();
        assert!(msg.contains("conf"));
        assert!(msg.contains("bad json"));
        assert_eq!(err.unit(), "conf");
        assert_eq!(err.as_label(), "runtime_install_failed");
    }

    #[test]
    fn env_error_converts_into_service_error() {
        let err: ServiceError = EnvError::Missing { key: "SVC_PORT".into() }.into();
        assert_eq!(err.as_label(), "service_env");
        assert!(err.to_string().contains("SVC_PORT"));
    }
}
