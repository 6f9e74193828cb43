//! # Service contract and helpers.
//!
//! - [`Service`] - trait implemented by every unit of work
//! - [`ServiceType`] - blocking / async / ignore
//! - [`ServiceFn`] - closure-backed service
//! - [`ServiceRef`] - shared handle (`Arc<dyn Service>`)

mod service;
mod service_fn;

pub use service::{Service, ServiceRef, ServiceType};
pub use service_fn::ServiceFn;
