//! # Example: shared_namespace
//!
//! Two units in the `orders` namespace exchange state through the namespace map,
//! and read their settings from `ORDERS_*` environment variables only.
//!
//! ## Flow
//! ```text
//! register(producer, ns = "orders")  ─┐
//! register(consumer, ns = "orders")  ─┴─► same Namespace instance
//!
//! producer (async):  ns.set("queue", Arc<Mutex<Vec<u32>>>) then pushes ids
//! consumer (async):  ns.get_as::<Queue>("queue") and drains it
//! ```
//!
//! ## Run
//! ```bash
//! ORDERS_BATCH=4 cargo run --example shared_namespace
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use unitvisor::{Namespace, RestartPolicy, ServiceError, ServiceFn, ServiceType, UnitOptions};

type Queue = Mutex<Vec<u32>>;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().init();

    unitvisor::register(
        |ns: Namespace| {
            let batch = ns.env().get_env_int("orders_batch").unwrap_or(3);
            ns.set("queue", Queue::default());
            ServiceFn::new("producer", ServiceType::Async, move || {
                let ns = ns.clone();
                async move {
                    let queue = ns
                        .get_as::<Queue>("queue")
                        .ok_or_else(|| ServiceError::fail("queue missing"))?;
                    for id in 0..batch as u32 {
                        queue.lock().push(id);
                        println!("[producer] queued order {id}");
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                    Ok(())
                }
            })
        },
        UnitOptions::new().with_namespace("orders"),
    );

    unitvisor::register(
        |ns: Namespace| {
            ServiceFn::new("consumer", ServiceType::Async, move || {
                let ns = ns.clone();
                async move {
                    let queue = ns
                        .get_as::<Queue>("queue")
                        .ok_or_else(|| ServiceError::fail("queue missing"))?;
                    let drained: Vec<u32> = queue.lock().drain(..).collect();
                    if drained.is_empty() {
                        return Err(ServiceError::fail("nothing to consume yet"));
                    }
                    println!("[consumer] processed {drained:?}");
                    Ok(())
                }
            })
        },
        UnitOptions::new()
            .with_namespace("orders")
            .with_restart(RestartPolicy::Always)
            .with_restart_delay(Duration::from_millis(150)),
    );

    unitvisor::run().await?;

    let sup = unitvisor::default_supervisor();
    if let Some(ns) = sup.namespace("orders") {
        println!("orders namespace: {} units", ns.entries().len());
    }

    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        unitvisor::stop().await;
    });
    unitvisor::wait().await;
    Ok(())
}
