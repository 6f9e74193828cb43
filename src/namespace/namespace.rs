//! # Namespace: per-name shared state.
//!
//! ## Rules
//! - Created lazily by the supervisor, at most once per distinct name.
//! - Cheap to clone; clones share the same state.
//! - `set`/`del` take the write lock, `get`/`values` the read lock; no lock is
//!   held while user code runs.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;

use crate::namespace::env::Env;
use crate::services::ServiceRef;

/// Name of the default namespace. Its [`Env`] sees the whole process environment.
pub const PUBLIC_NAMESPACE: &str = "__public__";

/// Value stored in a namespace.
pub type Value = Arc<dyn Any + Send + Sync>;

struct Inner {
    name: String,
    values: RwLock<HashMap<String, Value>>,
    services: RwLock<Vec<ServiceRef>>,
    env: Env,
    token: CancellationToken,
}

/// Shared state of all units registered under one name.
///
/// # Example
/// ```
/// use unitvisor::Supervisor;
///
/// let sup = Supervisor::new();
/// let ns = sup.namespace_or_create("http");
///
/// ns.set("addr", String::from("127.0.0.1:8080"));
/// assert_eq!(ns.get_string("addr").as_deref(), Some("127.0.0.1:8080"));
/// assert!(ns.get_as::<u16>("addr").is_none());
///
/// ns.del("addr");
/// assert!(ns.get("addr").is_none());
/// ```
#[derive(Clone)]
pub struct Namespace {
    inner: Arc<Inner>,
}

impl Namespace {
    /// Creates a namespace with an environment scoped to `name`.
    pub(crate) fn new(name: &str, token: CancellationToken) -> Self {
        let env = if name == PUBLIC_NAMESPACE {
            Env::process()
        } else {
            Env::scoped(name)
        };
        Self::with_env(name, env, token)
    }

    /// Creates a namespace over an explicit environment snapshot.
    pub fn with_env(name: &str, env: Env, token: CancellationToken) -> Self {
        Self {
            inner: Arc::new(Inner {
                name: name.to_string(),
                values: RwLock::new(HashMap::with_capacity(16)),
                services: RwLock::new(Vec::with_capacity(8)),
                env,
                token,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// True for the default namespace.
    pub fn is_public(&self) -> bool {
        self.inner.name == PUBLIC_NAMESPACE
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn set<V: Any + Send + Sync>(&self, key: impl Into<String>, value: V) {
        self.inner.values.write().insert(key.into(), Arc::new(value));
    }

    /// Removes `key`, returning the previous value if there was one.
    pub fn del(&self, key: &str) -> Option<Value> {
        self.inner.values.write().remove(key)
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.inner.values.read().get(key).cloned()
    }

    /// Returns the value under `key` if it holds a `T`.
    ///
    /// A value of another type is reported exactly like a missing key.
    pub fn get_as<T: Any + Send + Sync>(&self, key: &str) -> Option<Arc<T>> {
        self.get(key)?.downcast::<T>().ok()
    }

    /// Returns a `String` (or `&'static str`) value as an owned string.
    pub fn get_string(&self, key: &str) -> Option<String> {
        let value = self.get(key)?;
        if let Some(s) = value.downcast_ref::<String>() {
            return Some(s.clone());
        }
        value.downcast_ref::<&'static str>().map(|s| s.to_string())
    }

    /// Snapshot of the whole map.
    pub fn values(&self) -> HashMap<String, Value> {
        self.inner.values.read().clone()
    }

    /// Services registered under this namespace, in registration order.
    pub fn entries(&self) -> Vec<ServiceRef> {
        self.inner.services.read().clone()
    }

    pub(crate) fn push_entry(&self, service: ServiceRef) {
        self.inner.services.write().push(service);
    }

    /// Scoped environment of this namespace.
    pub fn env(&self) -> &Env {
        &self.inner.env
    }

    /// Root lifetime of the owning supervisor; cancelled on stop.
    pub fn token(&self) -> &CancellationToken {
        &self.inner.token
    }

    /// True when both handles point at the same namespace instance.
    pub fn ptr_eq(&self, other: &Namespace) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace")
            .field("name", &self.inner.name)
            .field("keys", &self.inner.values.read().len())
            .field("services", &self.inner.services.read().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(name: &str) -> Namespace {
        Namespace::with_env(name, Env::default(), CancellationToken::new())
    }

    #[test]
    fn set_get_del() {
        let ns = ns("cache");
        ns.set("k", 42_u32);
        assert_eq!(ns.get_as::<u32>("k").as_deref(), Some(&42));

        ns.del("k");
        assert!(ns.get("k").is_none());
        assert!(ns.del("k").is_none());
    }

    #[test]
    fn type_mismatch_reads_as_absent() {
        let ns = ns("cache");
        ns.set("port", 8080_u16);
        assert!(ns.get_as::<String>("port").is_none());
        assert!(ns.get_string("port").is_none());
        assert!(ns.get("port").is_some());
    }

    #[test]
    fn get_string_accepts_static_str() {
        let ns = ns("cache");
        ns.set("mode", "fast");
        assert_eq!(ns.get_string("mode").as_deref(), Some("fast"));
    }

    #[test]
    fn clones_share_state() {
        let a = ns("shared");
        let b = a.clone();
        a.set("x", 1_i32);
        assert_eq!(b.get_as::<i32>("x").as_deref(), Some(&1));
        assert!(a.ptr_eq(&b));
        assert_eq!(b.values().len(), 1);
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let ns = ns("hot");
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ns = ns.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        ns.set(format!("{i}-{j}"), j);
                        let _ = ns.get(&format!("{i}-{j}"));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ns.values().len(), 800);
    }

    #[test]
    fn public_namespace_is_flagged() {
        assert!(ns(PUBLIC_NAMESPACE).is_public());
        assert!(!ns("svc").is_public());
    }
}
