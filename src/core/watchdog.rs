//! # Watchdog: runs one unit's `on_start` under its restart policy.
//!
//! ## State machine
//! ```text
//!              │ Ignore             │ Retry(N)                     │ Always
//! ─────────────┼────────────────────┼──────────────────────────────┼──────────────────────────────
//! Blocking     │ 1 attempt,         │ ≤ N attempts, stop at first  │ rejected: AlwaysInBlocking
//! (run awaits) │ result → run       │ Ok, last error → run         │ (never started)
//! ─────────────┼────────────────────┼──────────────────────────────┼──────────────────────────────
//! Async        │ 1 attempt,         │ ≤ N attempts, stop at first  │ attempt until Ok or the root
//! (own task)   │ error → log        │ Ok, each failure → log       │ token is cancelled (also
//!              │                    │                              │ during the delay)
//! ```
//!
//! ## Rules
//! - Attempts of one unit are strictly sequential.
//! - Delays come from the unit's backoff (or the supervisor default); no delay
//!   follows the final Retry attempt.
//! - Only `Always` observes the root token; `Retry` runs to success or exhaustion.
//! - A panic inside `on_start` ends the watchdog: it is logged at fatal level and
//!   mirrored to the system log. Blocking units report it as
//!   [`RuntimeError::Panicked`].

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::{select, time};
use tokio_util::sync::CancellationToken;

use crate::core::runner::{Failure, start_once};
use crate::error::{RuntimeError, ServiceError};
use crate::logging::{Logger, Severity, SyslogSink};
use crate::policies::{BackoffPolicy, RestartPolicy};
use crate::units::Unit;

/// Supervises the start of a single unit.
pub(crate) struct Watchdog {
    unit: Arc<Unit>,
    backoff: BackoffPolicy,
    logger: Arc<dyn Logger>,
    syslog: SyslogSink,
}

impl Watchdog {
    /// `default_backoff` applies when the unit has no delay policy of its own.
    pub fn new(
        unit: Arc<Unit>,
        default_backoff: BackoffPolicy,
        logger: Arc<dyn Logger>,
        syslog: SyslogSink,
    ) -> Self {
        let backoff = unit.backoff().unwrap_or(default_backoff);
        Self {
            unit,
            backoff,
            logger,
            syslog,
        }
    }

    /// Runs a blocking unit to completion of its policy.
    pub async fn run_blocking(&self) -> Result<(), RuntimeError> {
        let outcome = match self.unit.restart() {
            RestartPolicy::Ignore => start_once(self.unit.service().as_ref()).await,
            RestartPolicy::Retry => self.retry().await,
            RestartPolicy::Always => {
                return Err(RuntimeError::AlwaysInBlocking {
                    unit: self.unit.name().to_string(),
                });
            }
        };

        match outcome {
            Ok(()) => Ok(()),
            Err(Failure::Error(source)) => Err(RuntimeError::Start {
                unit: self.unit.name().to_string(),
                source,
            }),
            Err(Failure::Panic { message, backtrace }) => {
                self.report_panic(&message, &backtrace);
                Err(RuntimeError::Panicked {
                    unit: self.unit.name().to_string(),
                    message,
                })
            }
        }
    }

    /// Spawns a detached worker running the unit's policy.
    pub fn spawn(self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move { self.run_async(token).await })
    }

    async fn run_async(&self, token: CancellationToken) {
        let outcome = match self.unit.restart() {
            RestartPolicy::Ignore => start_once(self.unit.service().as_ref()).await,
            RestartPolicy::Retry => self.retry().await,
            RestartPolicy::Always => self.always(&token).await,
        };

        match outcome {
            Ok(()) => {
                self.logger
                    .debug("unitvisor: service worker exited.", &[("name", &self.unit.name())]);
            }
            Err(Failure::Error(e)) => self.report_failure(&e),
            Err(Failure::Panic { message, backtrace }) => self.report_panic(&message, &backtrace),
        }
    }

    /// Up to `attempts()` sequential attempts; returns the last error.
    async fn retry(&self) -> Result<(), Failure> {
        let attempts = self.unit.attempts();
        let mut attempt: u32 = 0;
        loop {
            let err = match start_once(self.unit.service().as_ref()).await {
                Ok(()) => return Ok(()),
                Err(Failure::Error(e)) => e,
                Err(panic) => return Err(panic),
            };
            self.logger.error(
                "unitvisor: failed to start service.",
                &[
                    ("name", &self.unit.name()),
                    ("restart_policy", &RestartPolicy::Retry),
                    ("reason", &err),
                    ("retry", &attempt),
                ],
            );

            attempt += 1;
            if attempt >= attempts {
                return Err(Failure::Error(err));
            }
            let delay = self.backoff.next(attempt - 1);
            if !delay.is_zero() {
                time::sleep(delay).await;
            }
        }
    }

    /// Attempts until success or cancellation of `token`.
    async fn always(&self, token: &CancellationToken) -> Result<(), Failure> {
        let mut attempt: u32 = 0;
        loop {
            if token.is_cancelled() {
                return self.cancelled(attempt);
            }
            match start_once(self.unit.service().as_ref()).await {
                Ok(()) => return Ok(()),
                Err(Failure::Error(e)) => {
                    self.logger.error(
                        "unitvisor: failed to start service.",
                        &[
                            ("name", &self.unit.name()),
                            ("restart_policy", &RestartPolicy::Always),
                            ("reason", &e),
                            ("retry", &attempt),
                        ],
                    );
                    self.syslog.send(
                        Severity::Error,
                        &format!(
                            "Failed to start service: {}, policy: {}, error: {e}",
                            self.unit.name(),
                            RestartPolicy::Always
                        ),
                    );
                }
                Err(panic) => return Err(panic),
            }

            let delay = self.backoff.next(attempt);
            attempt = attempt.saturating_add(1);
            if delay.is_zero() {
                tokio::task::yield_now().await;
                continue;
            }
            let sleep = time::sleep(delay);
            tokio::pin!(sleep);
            select! {
                _ = &mut sleep => {}
                _ = token.cancelled() => return self.cancelled(attempt),
            }
        }
    }

    fn cancelled(&self, attempts: u32) -> Result<(), Failure> {
        self.logger.info(
            "unitvisor: supervisor stopped, giving up restarts.",
            &[("name", &self.unit.name()), ("attempts", &attempts)],
        );
        Ok(())
    }

    fn report_failure(&self, err: &ServiceError) {
        let policy = self.unit.restart();
        self.logger.error(
            "unitvisor: service worker exited with error.",
            &[
                ("name", &self.unit.name()),
                ("restart_policy", &policy),
                ("reason", err),
            ],
        );
        self.syslog.send(
            Severity::Error,
            &format!(
                "Failed to start service: {}, policy: {policy}, error: {err}",
                self.unit.name()
            ),
        );
    }

    fn report_panic(&self, message: &str, backtrace: &str) {
        let policy = self.unit.restart();
        let kind = self.unit.service_type();
        self.logger.fatal(
            "unitvisor: panic recovered in service.",
            &[
                ("name", &self.unit.name()),
                ("service_type", &kind),
                ("restart_policy", &policy),
                ("panic", &message),
                ("stack", &backtrace),
            ],
        );
        self.syslog.send(
            Severity::Critical,
            &format!(
                "Panic in {} ({kind}, {policy}): {message}\n{backtrace}",
                self.unit.name()
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    use futures::future::{self, Ready};

    use crate::logging::Level;
    use crate::logging::testing::RecordingLogger;
    use crate::services::{ServiceFn, ServiceType};
    use crate::units::UnitOptions;

    /// Service failing its first `fail_first` attempts, then succeeding.
    fn flaky(
        kind: ServiceType,
        fail_first: u32,
        calls: Arc<AtomicU32>,
    ) -> ServiceFn<impl Fn() -> Ready<Result<(), ServiceError>> + Send + Sync + 'static> {
        ServiceFn::new("flaky", kind, move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            future::ready(if n <= fail_first {
                Err(ServiceError::fail(format!("boom #{n}")))
            } else {
                Ok(())
            })
        })
    }

    fn watchdog(
        kind: ServiceType,
        fail_first: u32,
        opts: UnitOptions,
    ) -> (Watchdog, Arc<AtomicU32>, Arc<RecordingLogger>) {
        let calls = Arc::new(AtomicU32::new(0));
        let service = flaky(kind, fail_first, calls.clone());
        let unit = Arc::new(Unit::new(0, opts, Arc::new(service)));
        let logger = Arc::new(RecordingLogger::default());
        let dog = Watchdog::new(
            unit,
            BackoffPolicy::default(),
            logger.clone(),
            SyslogSink::disabled(),
        );
        (dog, calls, logger)
    }

    #[tokio::test]
    async fn blocking_ignore_propagates_error() {
        let (dog, calls, _) = watchdog(ServiceType::Blocking, 1, UnitOptions::new());
        let err = dog.run_blocking().await.unwrap_err();
        assert!(matches!(err, RuntimeError::Start { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn blocking_retry_exhausts_and_returns_last_error() {
        let opts = UnitOptions::new()
            .with_restart(RestartPolicy::Retry)
            .with_max_retry(3);
        let (dog, calls, logger) = watchdog(ServiceType::Blocking, u32::MAX, opts);

        match dog.run_blocking().await {
            Err(RuntimeError::Start { source, .. }) => {
                assert_eq!(source.to_string(), "execution failed: boom #3");
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(logger.matching(Level::Error, "failed to start service"), 3);
    }

    #[tokio::test]
    async fn blocking_retry_stops_at_first_success() {
        let opts = UnitOptions::new()
            .with_restart(RestartPolicy::Retry)
            .with_max_retry(5);
        let (dog, calls, _) = watchdog(ServiceType::Blocking, 1, opts);
        dog.run_blocking().await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_waits_between_attempts_but_not_after_the_last() {
        let opts = UnitOptions::new()
            .with_restart(RestartPolicy::Retry)
            .with_max_retry(3)
            .with_restart_delay(Duration::from_secs(10));
        let (dog, calls, _) = watchdog(ServiceType::Blocking, u32::MAX, opts);

        let started = time::Instant::now();
        assert!(dog.run_blocking().await.is_err());
        let elapsed = started.elapsed();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(elapsed >= Duration::from_secs(20), "{elapsed:?}");
        assert!(elapsed < Duration::from_secs(30), "{elapsed:?}");
    }

    #[tokio::test]
    async fn blocking_always_is_rejected_without_starting() {
        let opts = UnitOptions::new().with_restart(RestartPolicy::Always);
        let (dog, calls, _) = watchdog(ServiceType::Blocking, 0, opts);
        let err = dog.run_blocking().await.unwrap_err();
        assert!(matches!(err, RuntimeError::AlwaysInBlocking { .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn async_always_stops_after_first_success() {
        let opts = UnitOptions::new().with_restart(RestartPolicy::Always);
        let (dog, calls, logger) = watchdog(ServiceType::Async, 2, opts);
        dog.spawn(CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(logger.matching(Level::Error, "failed to start service"), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn async_always_exits_on_cancel_during_delay() {
        let opts = UnitOptions::new()
            .with_restart(RestartPolicy::Always)
            .with_restart_delay(Duration::from_secs(3600));
        let (dog, calls, _) = watchdog(ServiceType::Async, u32::MAX, opts);
        let token = CancellationToken::new();
        let worker = dog.spawn(token.clone());

        while calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }
        token.cancel();
        worker.await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn async_retry_logs_each_failure() {
        let opts = UnitOptions::new()
            .with_restart(RestartPolicy::Retry)
            .with_max_retry(3);
        let (dog, calls, logger) = watchdog(ServiceType::Async, u32::MAX, opts);
        dog.spawn(CancellationToken::new()).await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(logger.matching(Level::Error, "failed to start service"), 3);
        assert_eq!(logger.matching(Level::Error, "boom #3"), 2);
    }

    #[tokio::test]
    async fn async_panic_becomes_one_fatal_record() {
        let svc = ServiceFn::new("panicky", ServiceType::Async, || async {
            if true {
                panic!("worker blew up");
            }
            Ok::<_, ServiceError>(())
        });
        let unit = Arc::new(Unit::new(0, UnitOptions::new(), Arc::new(svc)));
        let logger = Arc::new(RecordingLogger::default());
        let dog = Watchdog::new(
            unit,
            BackoffPolicy::default(),
            logger.clone(),
            SyslogSink::disabled(),
        );

        dog.spawn(CancellationToken::new()).await.unwrap();
        assert_eq!(logger.count(Level::Fatal), 1);
        assert_eq!(logger.matching(Level::Fatal, "worker blew up"), 1);
    }
}
