//! # Namespaces: shared state and scoped environment.
//!
//! Units registered under the same namespace name share one [`Namespace`]: a
//! lock-guarded key/value map plus an [`Env`] snapshot of the process
//! environment. The public namespace sees every variable; any other namespace
//! only sees variables whose key starts with its uppercased name.
//!
//! - [`Namespace`] shared map, registered services, root cancellation token
//! - [`Env`] scoped environment lookup with typed getters
//! - [`Bind`] / [`Binder`] / [`FromEnvValue`] explicit env-to-struct binding

mod bind;
mod env;
mod namespace;

pub use bind::{Bind, Binder, FromEnvValue};
pub use env::{Env, parse_bool, parse_duration};
pub use namespace::{Namespace, PUBLIC_NAMESPACE, Value};
