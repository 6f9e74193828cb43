//! # Supervisor: registration, ordered start and one-shot shutdown.
//!
//! The [`Supervisor`] owns the namespace registry, the unit list, the root
//! [`CancellationToken`] and the stop guard. Every async unit's watchdog gets a
//! clone of the root token.
//!
//! ## Lifecycle
//! ```text
//! register(factory, opts)
//!   └─► namespace_or_create(opts.namespace) ─► factory(ns) ─► Unit (registration order)
//!
//! run()
//!   └─► start order (ascending index; registration order when every index is 0)
//!         for unit:
//!           ├─ on_install()  ── Err ─► return RuntimeError::Install (abort, no rollback)
//!           └─ dispatch by ServiceType:
//!                ├─ Ignore   ─► warn, skip
//!                ├─ Blocking ─► Watchdog::run_blocking().await ── Err ─► return (abort)
//!                └─ Async    ─► Watchdog::spawn(root token)      (run does not wait)
//!
//! stop() / signal in wait()
//!   └─► AtomicBool claim (first caller only)
//!         ├─ record StopCause, cancel root token
//!         └─ spawn: on_stop() on every installed unit in reverse start order
//!            (errors and panics are logged, the next unit is still stopped)
//!   every caller awaits the watch flag set when the spawned sequence ends
//! ```
//!
//! ## Rules
//! - Units start in one fixed total order; stop order is its exact reverse.
//! - `on_stop` is called only for units whose `on_install` returned `Ok`.
//! - `run` installs each unit at most once; calling it again only handles units
//!   registered since (or units whose install failed).
//! - Registration takes `&self`; a unit registered while `run` is in flight is
//!   not picked up by that `run`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::core::builder::SupervisorBuilder;
use crate::core::config::SupervisorConfig;
use crate::core::registry::Registry;
use crate::core::runner::{Failure, stop_once};
use crate::core::shutdown::wait_for_shutdown_signal;
use crate::core::watchdog::Watchdog;
use crate::error::RuntimeError;
use crate::logging::{Logger, Severity, SyslogSink};
use crate::namespace::Namespace;
use crate::services::{Service, ServiceRef, ServiceType};
use crate::units::{Unit, UnitOptions};

/// Why the supervisor was stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopCause {
    /// [`Supervisor::stop`] was called (or the root token was cancelled directly).
    Requested,
    /// [`Supervisor::wait`] observed SIGINT/SIGTERM.
    Signal,
}

impl StopCause {
    pub fn as_label(&self) -> &'static str {
        match self {
            StopCause::Requested => "requested",
            StopCause::Signal => "signal",
        }
    }
}

impl fmt::Display for StopCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Orchestrates install, start and stop of registered units.
///
/// Independent instances may coexist; the crate-level functions forward to a
/// lazily created default one.
///
/// # Example
/// ```no_run
/// use unitvisor::{Namespace, Service, ServiceError, ServiceType, Supervisor, UnitOptions};
///
/// struct Ticker;
///
/// #[async_trait::async_trait]
/// impl Service for Ticker {
///     fn name(&self) -> &str { "ticker" }
///     fn service_type(&self) -> ServiceType { ServiceType::Async }
///     async fn on_start(&self) -> Result<(), ServiceError> { Ok(()) }
/// }
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let sup = Supervisor::new();
///     sup.register(|_ns: Namespace| Ticker, UnitOptions::new());
///     sup.run().await?;
///     sup.wait().await;
///     Ok(())
/// }
/// ```
pub struct Supervisor {
    cfg: SupervisorConfig,
    logger: Arc<dyn Logger>,
    syslog: SyslogSink,
    token: CancellationToken,
    registry: Registry,
    cause: OnceLock<StopCause>,
    stop_claimed: AtomicBool,
    stop_done: Arc<watch::Sender<bool>>,
}

impl Supervisor {
    /// Supervisor with the default config and [`TracingLogger`](crate::TracingLogger).
    pub fn new() -> Self {
        SupervisorBuilder::new(SupervisorConfig::default()).build()
    }

    /// Starts a builder for a customized supervisor.
    pub fn builder(cfg: SupervisorConfig) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    pub(crate) fn new_internal(cfg: SupervisorConfig, logger: Arc<dyn Logger>) -> Self {
        let token = CancellationToken::new();
        Self {
            syslog: cfg.syslog_sink(),
            registry: Registry::new(token.clone()),
            token,
            logger,
            cfg,
            cause: OnceLock::new(),
            stop_claimed: AtomicBool::new(false),
            stop_done: Arc::new(watch::Sender::new(false)),
        }
    }

    /// Registers a unit.
    ///
    /// Resolves (or creates) the unit's namespace, builds the service with
    /// `factory` and appends the unit in registration order. Errors surface
    /// later, from `on_install`/`on_start` during [`Supervisor::run`].
    pub fn register<F, S>(&self, factory: F, opts: UnitOptions)
    where
        F: FnOnce(Namespace) -> S,
        S: Service,
    {
        let ns = self.registry.namespace_or_create(opts.namespace());
        let service: ServiceRef = Arc::new(factory(ns.clone()));
        ns.push_entry(Arc::clone(&service));

        let unit = self
            .registry
            .push(Unit::new(self.registry.next_seq(), opts, service));
        self.logger.debug(
            "unitvisor: unit registered.",
            &[
                ("name", &unit.name()),
                ("namespace", &unit.namespace()),
                ("index", &unit.index()),
                ("restart_policy", &unit.restart()),
            ],
        );
    }

    /// Installs and starts every registered unit in start order.
    ///
    /// Returns on the first install failure or blocking start failure; units
    /// already started keep running (call [`Supervisor::stop`] to shut them down).
    pub async fn run(&self) -> Result<(), RuntimeError> {
        let units = self.registry.start_order();
        if units.is_empty() {
            self.logger.warn("unitvisor: no unit require run.", &[]);
            return Ok(());
        }

        for unit in units {
            if unit.is_installed() {
                continue;
            }
            if let Err(source) = unit.service().on_install().await {
                return Err(RuntimeError::Install {
                    unit: unit.name().to_string(),
                    source,
                });
            }
            unit.mark_installed();

            let watchdog = Watchdog::new(
                Arc::clone(&unit),
                self.cfg.backoff,
                Arc::clone(&self.logger),
                self.syslog.clone(),
            );
            match unit.service_type() {
                ServiceType::Ignore => {
                    self.logger
                        .warn("unitvisor: ignoring service.", &[("name", &unit.name())]);
                }
                ServiceType::Blocking => watchdog.run_blocking().await?,
                ServiceType::Async => {
                    watchdog.spawn(self.token.clone());
                }
            }
        }
        Ok(())
    }

    /// Cancels the root token and stops every installed unit in reverse start order.
    ///
    /// The body runs once; every caller returns after it has completed.
    pub async fn stop(&self) {
        self.shutdown(StopCause::Requested).await;
    }

    /// Waits for the root token to be cancelled or for SIGINT/SIGTERM.
    ///
    /// A signal triggers the stop sequence. In both cases `wait` returns only
    /// after the stop sequence has completed. If signal listeners cannot be
    /// registered, the error is logged and only cancellation is awaited.
    pub async fn wait(&self) {
        tokio::select! {
            _ = self.token.cancelled() => {}
            res = wait_for_shutdown_signal() => match res {
                Ok(()) => {
                    self.logger.info("unitvisor: shutdown signal received.", &[]);
                    self.shutdown(StopCause::Signal).await;
                }
                Err(e) => {
                    self.logger.error(
                        "unitvisor: failed to listen for shutdown signals.",
                        &[("reason", &e)],
                    );
                    self.token.cancelled().await;
                }
            },
        }
        self.shutdown(StopCause::Requested).await;
    }

    /// Claims the stop sequence once and waits for it to finish.
    ///
    /// The sequence runs on its own task, so dropping a caller never
    /// interrupts it or lets a later caller run it again.
    async fn shutdown(&self, cause: StopCause) {
        let mut done = self.stop_done.subscribe();
        if !self.stop_claimed.swap(true, Ordering::AcqRel) {
            let cause = *self.cause.get_or_init(|| cause);
            self.token.cancel();
            tokio::spawn(stop_units(
                self.registry.stop_order(),
                Arc::clone(&self.logger),
                self.syslog.clone(),
                cause,
                Arc::clone(&self.stop_done),
            ));
        }
        let _ = done.wait_for(|finished| *finished).await;
    }

    /// Returns the namespace `name`, creating it on first use.
    pub fn namespace_or_create(&self, name: &str) -> Namespace {
        self.registry.namespace_or_create(name)
    }

    /// Returns the namespace `name` if some unit (or caller) created it.
    pub fn namespace(&self, name: &str) -> Option<Namespace> {
        self.registry.namespace(name)
    }

    /// Names of all namespaces, sorted.
    pub fn namespaces(&self) -> Vec<String> {
        self.registry.namespace_names()
    }

    /// Registered units in start order.
    pub fn units(&self) -> Vec<Arc<Unit>> {
        self.registry.start_order()
    }

    /// Root lifetime shared with every async unit.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// True once the root token has been cancelled.
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Cause recorded by the stop sequence, if it has started.
    pub fn stop_cause(&self) -> Option<StopCause> {
        self.cause.get().copied()
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.cfg
    }
}

/// Calls `on_stop` on every installed unit (given in stop order), then marks
/// the sequence finished.
async fn stop_units(
    units: Vec<Arc<Unit>>,
    logger: Arc<dyn Logger>,
    syslog: SyslogSink,
    cause: StopCause,
    done: Arc<watch::Sender<bool>>,
) {
    logger.info("unitvisor: stop units.", &[("cause", &cause)]);
    for unit in units.iter().filter(|u| u.is_installed()) {
        match stop_once(unit.service().as_ref()).await {
            Ok(()) => {}
            Err(Failure::Error(e)) => logger.error(
                "unitvisor: failed to stop service.",
                &[("name", &unit.name()), ("reason", &e)],
            ),
            Err(Failure::Panic { message, backtrace }) => {
                logger.fatal(
                    "unitvisor: panic recovered in on_stop.",
                    &[
                        ("name", &unit.name()),
                        ("panic", &message),
                        ("stack", &backtrace),
                    ],
                );
                syslog.send(
                    Severity::Critical,
                    &format!("Panic in {} on_stop: {message}", unit.name()),
                );
            }
        }
    }
    logger.info("unitvisor: all units stopped.", &[]);
    done.send_replace(true);
}

impl Default for Supervisor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Supervisor")
            .field("service_name", &self.cfg.service_name)
            .field("units", &self.registry.len())
            .field("stopped", &self.is_stopped())
            .field("cause", &self.stop_cause())
            .finish()
    }
}
