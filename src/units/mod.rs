//! # Units: registration records and their ordering.
//!
//! - [`Unit`] binds one service to its scheduling metadata
//! - [`UnitOptions`] builder passed to `Supervisor::register`
//! - `order` start/stop ordering with the zero-index fast path

mod options;
pub(crate) mod order;
mod unit;

pub use options::UnitOptions;
pub use unit::Unit;
