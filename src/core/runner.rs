//! # Run a single service hook behind a panic barrier.
//!
//! ```text
//! on_start() → Ok(())            → Ok(())
//!            → Err(ServiceError)  → Err(Failure::Error)
//!            → panic              → Err(Failure::Panic { message, backtrace })
//! ```
//!
//! ## Rules
//! - A panic never unwinds past [`start_once`]/[`stop_once`]; it becomes [`Failure::Panic`].
//! - The backtrace is captured at the barrier regardless of `RUST_BACKTRACE`.

use std::any::Any;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;

use crate::error::ServiceError;
use crate::services::Service;

/// Why an attempt did not succeed.
#[derive(Debug)]
pub(crate) enum Failure {
    /// `on_start` returned an error.
    Error(ServiceError),
    /// `on_start` panicked.
    Panic { message: String, backtrace: String },
}

/// Executes one attempt of `service.on_start()`.
pub(crate) async fn start_once(service: &dyn Service) -> Result<(), Failure> {
    contain(service.on_start()).await
}

/// Executes `service.on_stop()`.
pub(crate) async fn stop_once(service: &dyn Service) -> Result<(), Failure> {
    contain(service.on_stop()).await
}

async fn contain<F>(hook: F) -> Result<(), Failure>
where
    F: Future<Output = Result<(), ServiceError>>,
{
    match AssertUnwindSafe(hook).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Failure::Error(e)),
        Err(payload) => Err(Failure::Panic {
            message: panic_message(payload.as_ref()),
            backtrace: Backtrace::force_capture().to_string(),
        }),
    }
}

/// Renders a panic payload (`&str` or `String`) as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
