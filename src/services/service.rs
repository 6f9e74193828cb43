//! # Service: the unit of work managed by the supervisor.
//!
//! A [`Service`] has five operations. Every one of them has a default body, so an
//! implementor overrides only what it uses and keeps compiling when new
//! operations are added to the trait:
//!
//! | method           | default                        |
//! |------------------|--------------------------------|
//! | `name`           | `"unnamed-service"`            |
//! | `service_type`   | [`ServiceType::Ignore`]        |
//! | `on_install`     | `Ok(())`                       |
//! | `on_start`       | `Err(ServiceError::Unimplemented)` |
//! | `on_stop`        | `Ok(())`                       |
//!
//! Hooks take `&self`: an async unit runs `on_start` on its own tokio task while
//! the supervisor may call `on_stop` concurrently, so mutable state belongs behind
//! interior mutability.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ServiceError;

/// Shared handle to a service.
pub type ServiceRef = Arc<dyn Service>;

/// How the supervisor runs `on_start`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ServiceType {
    /// Never started; the unit is installed and stopped only.
    #[default]
    Ignore,
    /// `run` awaits `on_start` (and its retries) before moving to the next unit.
    Blocking,
    /// `on_start` runs on a dedicated tokio task; `run` proceeds immediately.
    Async,
}

impl ServiceType {
    /// Returns a short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            ServiceType::Ignore => "ignore",
            ServiceType::Blocking => "blocking",
            ServiceType::Async => "async",
        }
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// # A supervised unit of work.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use unitvisor::{Namespace, Service, ServiceError, ServiceType};
///
/// struct Config {
///     ns: Namespace,
/// }
///
/// #[async_trait]
/// impl Service for Config {
///     fn name(&self) -> &str { "config" }
///     fn service_type(&self) -> ServiceType { ServiceType::Blocking }
///
///     async fn on_start(&self) -> Result<(), ServiceError> {
///         self.ns.set("addr", String::from("127.0.0.1:8080"));
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait Service: Send + Sync + 'static {
    /// Human-readable name used in logs and errors.
    fn name(&self) -> &str {
        "unnamed-service"
    }

    /// How `on_start` is dispatched.
    fn service_type(&self) -> ServiceType {
        ServiceType::Ignore
    }

    /// Called exactly once, before `on_start`. An error aborts `Supervisor::run`.
    async fn on_install(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    /// Main body. Called once or repeatedly depending on the unit's restart policy.
    async fn on_start(&self) -> Result<(), ServiceError> {
        Err(ServiceError::Unimplemented)
    }

    /// Called once during shutdown if `on_install` succeeded.
    async fn on_stop(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Bare;

    impl Service for Bare {}

    #[tokio::test]
    async fn defaults_describe_an_ignored_unimplemented_service() {
        let s = Bare;
        assert_eq!(s.name(), "unnamed-service");
        assert_eq!(s.service_type(), ServiceType::Ignore);
        assert!(s.on_install().await.is_ok());
        assert!(matches!(s.on_start().await, Err(ServiceError::Unimplemented)));
        assert!(s.on_stop().await.is_ok());
    }
}
