//! # Unit registry: namespaces and registered units.
//!
//! ## Rules
//! - A namespace is created on first reference and reused afterwards.
//! - Units are stored in registration order; start/stop order is derived on read.
//! - Locks are held only for the map/vector operation itself, never across awaits
//!   or user code.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::namespace::Namespace;
use crate::units::{Unit, order};

/// Namespaces and units of one supervisor.
pub(crate) struct Registry {
    namespaces: Mutex<HashMap<String, Namespace>>,
    units: Mutex<Vec<Arc<Unit>>>,
    token: CancellationToken,
}

impl Registry {
    pub fn new(token: CancellationToken) -> Self {
        Self {
            namespaces: Mutex::new(HashMap::new()),
            units: Mutex::new(Vec::with_capacity(32)),
            token,
        }
    }

    /// Returns the namespace `name`, creating it on first use.
    pub fn namespace_or_create(&self, name: &str) -> Namespace {
        self.namespaces
            .lock()
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name, self.token.clone()))
            .clone()
    }

    pub fn namespace(&self, name: &str) -> Option<Namespace> {
        self.namespaces.lock().get(name).cloned()
    }

    /// Sorted namespace names.
    pub fn namespace_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.namespaces.lock().keys().cloned().collect();
        names.sort_unstable();
        names
    }

    /// Sequence number the next registered unit will get.
    pub fn next_seq(&self) -> usize {
        self.units.lock().len()
    }

    pub fn push(&self, unit: Unit) -> Arc<Unit> {
        let unit = Arc::new(unit);
        self.units.lock().push(Arc::clone(&unit));
        unit
    }

    pub fn len(&self) -> usize {
        self.units.lock().len()
    }

    /// Units in start order.
    pub fn start_order(&self) -> Vec<Arc<Unit>> {
        let mut units = self.units.lock().clone();
        order::start_order(&mut units);
        units
    }

    /// Units in stop order (reverse of start order).
    pub fn stop_order(&self) -> Vec<Arc<Unit>> {
        let mut units = self.units.lock().clone();
        order::stop_order(&mut units);
        units
    }
}
