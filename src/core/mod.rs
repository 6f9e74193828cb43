//! Runtime core: registration, orchestration and shutdown.
//!
//! The public API of this module is [`Supervisor`] (with its builder and config).
//!
//! Internal modules:
//! - `registry`: namespaces and registered units;
//! - `runner`: one `on_start` attempt behind a panic barrier;
//! - `watchdog`: restart policy state machine for one unit;
//! - `shutdown`: cross-platform termination signals.

mod builder;
mod config;
mod registry;
mod runner;
mod shutdown;
mod supervisor;
mod watchdog;

pub use builder::SupervisorBuilder;
pub use config::{DEFAULT_SERVICE_NAME, SupervisorConfig};
pub use supervisor::{StopCause, Supervisor};
