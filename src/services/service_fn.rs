//! # Function-backed service (`ServiceFn`)
//!
//! [`ServiceFn`] wraps a closure `F: Fn() -> Fut` used as `on_start`. Each attempt
//! calls the closure again and gets a fresh future; state shared across attempts
//! must live in an `Arc` captured by the closure.
//!
//! ```rust
//! use unitvisor::{Service, ServiceError, ServiceFn, ServiceType};
//!
//! let svc = ServiceFn::new("heartbeat", ServiceType::Async, || async {
//!     Ok::<_, ServiceError>(())
//! });
//! assert_eq!(svc.name(), "heartbeat");
//! ```

use std::borrow::Cow;
use std::future::Future;

use async_trait::async_trait;

use crate::error::ServiceError;
use crate::services::service::{Service, ServiceType};

/// Closure-backed service; install and stop are no-ops.
pub struct ServiceFn<F> {
    name: Cow<'static, str>,
    kind: ServiceType,
    start: F,
}

impl<F> ServiceFn<F> {
    /// Creates a new function-backed service.
    pub fn new(name: impl Into<Cow<'static, str>>, kind: ServiceType, start: F) -> Self {
        Self {
            name: name.into(),
            kind,
            start,
        }
    }
}

#[async_trait]
impl<F, Fut> Service for ServiceFn<F>
where
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), ServiceError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn service_type(&self) -> ServiceType {
        self.kind
    }

    async fn on_start(&self) -> Result<(), ServiceError> {
        (self.start)().await
    }
}
