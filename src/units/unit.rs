//! # Unit: one service plus its scheduling metadata.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::services::{ServiceRef, ServiceType};
use crate::units::options::UnitOptions;

/// Registration record owned by the supervisor.
pub struct Unit {
    seq: usize,
    index: i32,
    max_retry: i32,
    namespace: String,
    description: String,
    restart: RestartPolicy,
    backoff: Option<BackoffPolicy>,
    service: ServiceRef,
    installed: AtomicBool,
}

impl Unit {
    pub(crate) fn new(seq: usize, opts: UnitOptions, service: ServiceRef) -> Self {
        Self {
            seq,
            index: opts.index,
            max_retry: opts.max_retry,
            namespace: opts.namespace,
            description: opts.description,
            restart: opts.restart,
            backoff: opts.backoff,
            service,
            installed: AtomicBool::new(false),
        }
    }

    /// Position in registration order (0-based).
    pub fn seq(&self) -> usize {
        self.seq
    }

    pub fn index(&self) -> i32 {
        self.index
    }

    pub fn max_retry(&self) -> i32 {
        self.max_retry
    }

    /// Attempts made under [`RestartPolicy::Retry`]; at least one.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.max_retry.max(1) as u32
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn restart(&self) -> RestartPolicy {
        self.restart
    }

    /// Per-unit delay policy, if one was set at registration.
    pub fn backoff(&self) -> Option<BackoffPolicy> {
        self.backoff
    }

    pub fn service(&self) -> &ServiceRef {
        &self.service
    }

    pub fn name(&self) -> &str {
        self.service.name()
    }

    pub fn service_type(&self) -> ServiceType {
        self.service.service_type()
    }

    /// True once `on_install` has returned `Ok`.
    pub fn is_installed(&self) -> bool {
        self.installed.load(Ordering::Acquire)
    }

    pub(crate) fn mark_installed(&self) {
        self.installed.store(true, Ordering::Release);
    }
}

impl fmt::Debug for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unit")
            .field("name", &self.name())
            .field("seq", &self.seq)
            .field("index", &self.index)
            .field("namespace", &self.namespace)
            .field("restart", &self.restart)
            .field("max_retry", &self.max_retry)
            .field("installed", &self.is_installed())
            .finish()
    }
}
