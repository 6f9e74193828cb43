//! # Example: startup
//!
//! A small daemon assembled from three units in the public namespace.
//!
//! Demonstrates how to:
//! - Implement [`Service`] for a config loader that binds env vars in `on_install`.
//! - Run a flaky unit with `RestartPolicy::Retry` and a delay between attempts.
//! - Run a long-lived async unit that exits when the root token is cancelled.
//! - Stop everything with [`Supervisor::wait`] (Ctrl-C) or a timer.
//!
//! ## Flow
//! ```text
//! run()
//!   ├─► [1] config     install: bind DEMO_* vars ─► start (blocking, once)
//!   ├─► [2] warmup     start: fails twice, Retry(3) with 200ms delay (blocking)
//!   └─► [3] heartbeat  start: ticks until the root token is cancelled (async)
//! wait()  ─► Ctrl-C or timer ─► stop(): heartbeat, warmup, config
//! ```
//!
//! ## Run
//! ```bash
//! DEMO_TICK=250ms cargo run --example startup
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use unitvisor::{
    Bind, Binder, EnvError, Namespace, RestartPolicy, Service, ServiceError, ServiceFn,
    ServiceType, Supervisor, SupervisorConfig, UnitOptions,
};

#[derive(Clone, Debug)]
struct DemoConfig {
    tick: Duration,
    label: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(500),
            label: "demo".into(),
        }
    }
}

impl Bind for DemoConfig {
    fn bind(&mut self, b: &mut Binder<'_>) -> Result<(), EnvError> {
        b.optional("demo_tick", &mut self.tick)?;
        b.optional("demo_label", &mut self.label)
    }
}

/// Loads [`DemoConfig`] and publishes it in the namespace.
struct ConfigLoader {
    ns: Namespace,
}

#[async_trait]
impl Service for ConfigLoader {
    fn name(&self) -> &str {
        "config"
    }

    fn service_type(&self) -> ServiceType {
        ServiceType::Blocking
    }

    async fn on_install(&self) -> Result<(), ServiceError> {
        let mut cfg = DemoConfig::default();
        self.ns.env().assign(&mut cfg)?;
        println!("[config] loaded {cfg:?}");
        self.ns.set("config", cfg);
        Ok(())
    }

    async fn on_start(&self) -> Result<(), ServiceError> {
        Ok(())
    }

    async fn on_stop(&self) -> Result<(), ServiceError> {
        println!("[config] stopped");
        Ok(())
    }
}

/// Ticks until the root token is cancelled.
struct Heartbeat {
    ns: Namespace,
    ticks: AtomicU64,
}

#[async_trait]
impl Service for Heartbeat {
    fn name(&self) -> &str {
        "heartbeat"
    }

    fn service_type(&self) -> ServiceType {
        ServiceType::Async
    }

    async fn on_start(&self) -> Result<(), ServiceError> {
        let cfg = self
            .ns
            .get_as::<DemoConfig>("config")
            .ok_or_else(|| ServiceError::fail("config not published"))?;
        let token: &CancellationToken = self.ns.token();
        loop {
            tokio::select! {
                _ = token.cancelled() => return Ok(()),
                _ = tokio::time::sleep(cfg.tick) => {
                    let n = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
                    println!("[heartbeat] {} tick {n}", cfg.label);
                }
            }
        }
    }

    async fn on_stop(&self) -> Result<(), ServiceError> {
        println!(
            "[heartbeat] stopped after {} ticks",
            self.ticks.load(Ordering::Relaxed)
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "unitvisor=debug".into()),
        )
        .init();

    let mut cfg = SupervisorConfig::from_env()?;
    cfg.syslog = false;
    let sup = Arc::new(Supervisor::builder(cfg).build());

    sup.register(|ns| ConfigLoader { ns }, UnitOptions::new().with_index(1));

    let attempts = Arc::new(AtomicU32::new(0));
    sup.register(
        move |_| {
            ServiceFn::new("warmup", ServiceType::Blocking, move || {
                let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    println!("[warmup] attempt {n}");
                    if n < 3 {
                        return Err(ServiceError::fail("cache not ready"));
                    }
                    Ok(())
                }
            })
        },
        UnitOptions::new()
            .with_index(2)
            .with_restart(RestartPolicy::Retry)
            .with_max_retry(3)
            .with_restart_delay(Duration::from_millis(200)),
    );

    sup.register(
        |ns| Heartbeat {
            ns,
            ticks: AtomicU64::new(0),
        },
        UnitOptions::new()
            .with_index(3)
            .with_description("prints a line per tick"),
    );

    sup.run().await?;

    let timer = Arc::clone(&sup);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        timer.stop().await;
    });

    sup.wait().await;
    println!("stopped: {:?}", sup.stop_cause());
    Ok(())
}
