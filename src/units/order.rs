//! Start/stop ordering.
//!
//! ```text
//! every index == 0  → registration order            (fast path, no sort)
//! otherwise         → stable sort ascending by index (ties keep registration order)
//! stop order        → exact reverse of start order
//! ```

use std::sync::Arc;

use crate::units::Unit;

/// True when at least one unit asked for an explicit priority.
fn has_priorities(units: &[Arc<Unit>]) -> bool {
    units.iter().any(|u| u.index() != 0)
}

/// Arranges units (given in registration order) into start order.
pub(crate) fn start_order(units: &mut [Arc<Unit>]) {
    if !has_priorities(units) {
        return;
    }
    units.sort_by_key(|u| u.index());
}

/// Arranges units (given in registration order) into stop order.
pub(crate) fn stop_order(units: &mut [Arc<Unit>]) {
    start_order(units);
    units.reverse();
}
