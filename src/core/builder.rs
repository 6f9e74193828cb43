use std::sync::Arc;

use crate::core::{SupervisorConfig, supervisor::Supervisor};
use crate::logging::{Logger, TracingLogger};

/// Builder for a [`Supervisor`] with a custom logger.
///
/// ```
/// use std::sync::Arc;
/// use unitvisor::{SupervisorBuilder, SupervisorConfig, TracingLogger};
///
/// let mut cfg = SupervisorConfig::default();
/// cfg.service_name = "edge-proxy".into();
/// cfg.syslog = false;
///
/// let sup = SupervisorBuilder::new(cfg)
///     .with_logger(Arc::new(TracingLogger))
///     .build();
/// assert!(!sup.is_stopped());
/// ```
pub struct SupervisorBuilder {
    cfg: SupervisorConfig,
    logger: Option<Arc<dyn Logger>>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: SupervisorConfig) -> Self {
        Self { cfg, logger: None }
    }

    /// Replaces the default [`TracingLogger`].
    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Builds the supervisor: a fresh root token, an empty registry and the
    /// system log sink described by the config.
    pub fn build(self) -> Supervisor {
        let logger = self.logger.unwrap_or_else(|| Arc::new(TracingLogger));
        Supervisor::new_internal(self.cfg, logger)
    }
}
