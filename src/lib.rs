//! # unitvisor
//!
//! **Unitvisor** is a process-local service supervisor for Rust.
//!
//! An application registers its services as *units*, each bound to a shared
//! *namespace*. The supervisor installs and starts them in a fixed order, runs
//! each one according to its concurrency mode and restart policy, contains
//! panics, and stops everything in reverse order exactly once, on request or
//! on SIGINT/SIGTERM.
//!
//! ## Architecture
//! ```text
//!   register(|ns| ServiceA, opts)   register(|ns| ServiceB, opts)   ...
//!            │                               │
//!            ▼                               ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor                                                       │
//! │  - Registry: namespaces (created lazily) + units (reg. order)     │
//! │  - root CancellationToken + StopCause                             │
//! │  - stop guard (claimed once, body on its own task)                │
//! │  - Logger (TracingLogger by default) + SyslogSink                 │
//! └──────┬──────────────────────┬──────────────────────┬──────────────┘
//!        │ run(): start order   │                      │
//!        ▼                      ▼                      ▼
//!   on_install()           on_install()           on_install()
//!        │                      │                      │
//!   Ignore: skip         Blocking: Watchdog      Async: Watchdog
//!                        .run_blocking().await   .spawn(token)  (own task)
//!                               │                      │
//!                               ▼                      ▼
//!                        start_once() behind a panic barrier
//!                        Ignore │ Retry(N) │ Always (until Ok or cancel)
//!
//! stop() / signal ─► cancel token ─► on_stop() on installed units, reverse order
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Supervision**   | Register, run, stop and wait for units.                  | [`Supervisor`], [`UnitOptions`]             |
//! | **Services**      | The unit of work and a closure-backed helper.            | [`Service`], [`ServiceFn`], [`ServiceType`] |
//! | **Policies**      | Restart behaviour and delay between attempts.            | [`RestartPolicy`], [`BackoffPolicy`]        |
//! | **Namespaces**    | Shared state and scoped environment per name.            | [`Namespace`], [`Env`], [`Bind`]            |
//! | **Logging**       | Pluggable structured logger and system log mirror.       | [`Logger`], [`TracingLogger`], [`SyslogSink`] |
//! | **Errors**        | Typed errors for runtime, services and env binding.      | [`RuntimeError`], [`ServiceError`], [`EnvError`] |
//! | **Configuration** | Supervisor-wide settings with env overrides.             | [`SupervisorConfig`]                        |
//!
//! ## Example
//! ```rust
//! use unitvisor::{Namespace, ServiceError, ServiceFn, ServiceType, Supervisor, UnitOptions};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let sup = Supervisor::new();
//!
//!     sup.register(
//!         |ns: Namespace| {
//!             ns.set("greeting", "hello");
//!             ServiceFn::new("setup", ServiceType::Blocking, || async {
//!                 Ok::<_, ServiceError>(())
//!             })
//!         },
//!         UnitOptions::new().with_namespace("app"),
//!     );
//!
//!     sup.run().await?;
//!     sup.stop().await;
//!     Ok(())
//! }
//! ```
//!
//! The crate-level [`register`], [`run`], [`stop`] and [`wait`] forward to a
//! lazily created default supervisor.
mod core;
mod error;
mod logging;
mod namespace;
mod policies;
mod services;
mod units;

use std::sync::LazyLock;

// ---- Public re-exports ----

pub use crate::core::{
    DEFAULT_SERVICE_NAME, StopCause, Supervisor, SupervisorBuilder, SupervisorConfig,
};
pub use error::{EnvError, RuntimeError, ServiceError};
pub use logging::{Field, Level, Logger, Severity, SyslogSink, TracingLogger};
pub use namespace::{
    Bind, Binder, Env, FromEnvValue, Namespace, PUBLIC_NAMESPACE, Value, parse_bool,
    parse_duration,
};
pub use policies::{BackoffPolicy, JitterPolicy, RestartPolicy};
pub use services::{Service, ServiceFn, ServiceRef, ServiceType};
pub use units::{Unit, UnitOptions};

// ---- Default instance ----

static DEFAULT: LazyLock<Supervisor> = LazyLock::new(Supervisor::new);

/// The process-wide default supervisor, created on first use.
pub fn default_supervisor() -> &'static Supervisor {
    &DEFAULT
}

/// Registers a unit on the default supervisor.
pub fn register<F, S>(factory: F, opts: UnitOptions)
where
    F: FnOnce(Namespace) -> S,
    S: Service,
{
    DEFAULT.register(factory, opts);
}

/// Runs the default supervisor.
pub async fn run() -> Result<(), RuntimeError> {
    DEFAULT.run().await
}

/// Stops the default supervisor.
pub async fn stop() {
    DEFAULT.stop().await;
}

/// Waits for the default supervisor to stop (or for SIGINT/SIGTERM).
pub async fn wait() {
    DEFAULT.wait().await;
}
