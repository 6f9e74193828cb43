use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use unitvisor::{
    Bind, Binder, EnvError, Field, Level, Logger, Namespace, RestartPolicy, RuntimeError, Service,
    ServiceError, ServiceFn, ServiceType, StopCause, Supervisor, SupervisorConfig, UnitOptions,
};

#[derive(Default)]
struct Recorder(Mutex<Vec<(Level, String)>>);

impl Recorder {
    fn count(&self, level: Level, needle: &str) -> usize {
        self.0
            .lock()
            .iter()
            .filter(|(l, text)| *l == level && text.contains(needle))
            .count()
    }
}

impl Logger for Recorder {
    fn log(&self, level: Level, msg: &str, fields: &[Field<'_>]) {
        let mut text = msg.to_string();
        for (k, v) in fields {
            text.push_str(&format!(" {k}={v}"));
        }
        self.0.lock().push((level, text));
    }
}

fn supervisor() -> (Supervisor, Arc<Recorder>) {
    let cfg = SupervisorConfig {
        syslog: false,
        ..SupervisorConfig::default()
    };
    let rec = Arc::new(Recorder::default());
    let sup = Supervisor::builder(cfg).with_logger(rec.clone()).build();
    (sup, rec)
}

type Journal = Arc<Mutex<Vec<String>>>;

struct Step {
    name: String,
    journal: Journal,
}

#[async_trait]
impl Service for Step {
    fn name(&self) -> &str {
        &self.name
    }

    fn service_type(&self) -> ServiceType {
        ServiceType::Blocking
    }

    async fn on_start(&self) -> Result<(), ServiceError> {
        self.journal.lock().push(format!("start:{}", self.name));
        Ok(())
    }

    async fn on_stop(&self) -> Result<(), ServiceError> {
        self.journal.lock().push(format!("stop:{}", self.name));
        Ok(())
    }
}

fn register_steps(sup: &Supervisor, journal: &Journal, steps: &[(&str, i32)]) {
    for (name, index) in steps {
        let step = Step {
            name: name.to_string(),
            journal: journal.clone(),
        };
        sup.register(move |_| step, UnitOptions::new().with_index(*index));
    }
}

fn split(journal: &Journal) -> (Vec<String>, Vec<String>) {
    let all = journal.lock().clone();
    let starts = all
        .iter()
        .filter_map(|e| e.strip_prefix("start:").map(str::to_string))
        .collect();
    let stops = all
        .iter()
        .filter_map(|e| e.strip_prefix("stop:").map(str::to_string))
        .collect();
    (starts, stops)
}

#[tokio::test]
async fn default_indices_keep_registration_order() {
    let (sup, _) = supervisor();
    let journal = Journal::default();
    register_steps(&sup, &journal, &[("c", 0), ("a", 0), ("b", 0)]);

    sup.run().await.unwrap();
    sup.stop().await;

    let (starts, stops) = split(&journal);
    assert_eq!(starts, ["c", "a", "b"]);
    assert_eq!(stops, ["b", "a", "c"]);
}

#[tokio::test]
async fn explicit_indices_sort_stably() {
    let (sup, _) = supervisor();
    let journal = Journal::default();
    register_steps(
        &sup,
        &journal,
        &[("web", 3), ("db", 1), ("cache", 2), ("zero", 0), ("queue", 1)],
    );

    sup.run().await.unwrap();
    sup.stop().await;

    let (starts, stops) = split(&journal);
    assert_eq!(starts, ["zero", "db", "queue", "cache", "web"]);
    assert_eq!(stops, ["web", "cache", "queue", "db", "zero"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_stops_execute_shutdown_once() {
    let (sup, rec) = supervisor();
    let sup = Arc::new(sup);
    let journal = Journal::default();
    register_steps(&sup, &journal, &[("a", 0), ("b", 0)]);
    sup.run().await.unwrap();

    let stops: Vec<_> = (0..16)
        .map(|_| {
            let sup = Arc::clone(&sup);
            tokio::spawn(async move { sup.stop().await })
        })
        .collect();
    for handle in stops {
        handle.await.unwrap();
    }

    let (_, stopped) = split(&journal);
    assert_eq!(stopped, ["b", "a"]);
    assert_eq!(rec.count(Level::Info, "all units stopped"), 1);
    assert_eq!(sup.stop_cause(), Some(StopCause::Requested));
}

fn always_failing(calls: Arc<AtomicU32>, kind: ServiceType) -> impl Service {
    ServiceFn::new("flaky", kind, move || {
        let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
        async move { Err::<(), _>(ServiceError::fail(format!("attempt {n}"))) }
    })
}

#[tokio::test]
async fn blocking_retry_attempts_exactly_max_retry_times() {
    let (sup, _) = supervisor();
    let calls = Arc::new(AtomicU32::new(0));
    let svc = always_failing(calls.clone(), ServiceType::Blocking);
    sup.register(
        move |_| svc,
        UnitOptions::new()
            .with_restart(RestartPolicy::Retry)
            .with_max_retry(3),
    );

    match sup.run().await {
        Err(RuntimeError::Start { unit, source }) => {
            assert_eq!(unit, "flaky");
            assert_eq!(source.to_string(), "execution failed: attempt 3");
        }
        other => panic!("unexpected: {other:?}"),
    }
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn async_retry_logs_the_last_error() {
    let (sup, rec) = supervisor();
    let calls = Arc::new(AtomicU32::new(0));
    let svc = always_failing(calls.clone(), ServiceType::Async);
    sup.register(
        move |_| svc,
        UnitOptions::new()
            .with_restart(RestartPolicy::Retry)
            .with_max_retry(3),
    );

    sup.run().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while rec.count(Level::Error, "service worker exited with error") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(rec.count(Level::Error, "reason=execution failed: attempt 3"), 2);
}

#[tokio::test]
async fn always_stops_after_first_success() {
    let (sup, _) = supervisor();
    let calls = Arc::new(AtomicU32::new(0));
    let done = Arc::new(tokio::sync::Notify::new());

    let (c, d) = (calls.clone(), done.clone());
    let svc = ServiceFn::new("eventually", ServiceType::Async, move || {
        let n = c.fetch_add(1, Ordering::SeqCst) + 1;
        let d = d.clone();
        async move {
            if n < 3 {
                return Err(ServiceError::fail("not yet"));
            }
            d.notify_one();
            Ok(())
        }
    });
    sup.register(
        move |_| svc,
        UnitOptions::new().with_restart(RestartPolicy::Always),
    );

    sup.run().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), done.notified())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn always_exits_once_stopped() {
    let (sup, _) = supervisor();
    let calls = Arc::new(AtomicU32::new(0));
    let svc = always_failing(calls.clone(), ServiceType::Async);
    sup.register(
        move |_| svc,
        UnitOptions::new()
            .with_restart(RestartPolicy::Always)
            .with_restart_delay(Duration::from_millis(5)),
    );

    sup.run().await.unwrap();
    tokio::time::sleep(Duration::from_millis(30)).await;
    sup.stop().await;
    tokio::time::sleep(Duration::from_millis(30)).await;

    let after_stop = calls.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(after_stop >= 1);
    assert_eq!(calls.load(Ordering::SeqCst), after_stop);
}

#[tokio::test]
async fn always_in_blocking_mode_is_rejected() {
    let (sup, _) = supervisor();
    let calls = Arc::new(AtomicU32::new(0));
    let svc = always_failing(calls.clone(), ServiceType::Blocking);
    sup.register(
        move |_| svc,
        UnitOptions::new().with_restart(RestartPolicy::Always),
    );

    let err = sup.run().await.unwrap_err();
    assert!(matches!(err, RuntimeError::AlwaysInBlocking { .. }));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn async_panic_is_contained_as_one_fatal_record() {
    let (sup, rec) = supervisor();
    sup.register(
        |_| {
            ServiceFn::new("boom", ServiceType::Async, || async {
                if true {
                    panic!("unexpected state");
                }
                Ok::<_, ServiceError>(())
            })
        },
        UnitOptions::new(),
    );

    sup.run().await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), async {
        while rec.count(Level::Fatal, "") == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(rec.count(Level::Fatal, ""), 1);
    assert_eq!(rec.count(Level::Fatal, "panic=unexpected state"), 1);
    sup.stop().await;
}

#[tokio::test]
async fn blocking_panic_fails_run() {
    let (sup, _) = supervisor();
    sup.register(
        |_| {
            ServiceFn::new("boom", ServiceType::Blocking, || async {
                if true {
                    panic!("bad state");
                }
                Ok::<_, ServiceError>(())
            })
        },
        UnitOptions::new(),
    );

    match sup.run().await {
        Err(RuntimeError::Panicked { unit, message }) => {
            assert_eq!(unit, "boom");
            assert_eq!(message, "bad state");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn install_failure_aborts_run() {
    struct Broken;

    #[async_trait]
    impl Service for Broken {
        fn name(&self) -> &str {
            "broken"
        }

        fn service_type(&self) -> ServiceType {
            ServiceType::Blocking
        }

        async fn on_install(&self) -> Result<(), ServiceError> {
            Err(ServiceError::fail("missing certificate"))
        }
    }

    let (sup, _) = supervisor();
    let journal = Journal::default();
    sup.register(|_| Broken, UnitOptions::new().with_index(1));
    register_steps(&sup, &journal, &[("after", 2)]);

    let err = sup.run().await.unwrap_err();
    assert_eq!(err.as_label(), "runtime_install_failed");
    assert!(err.to_string().contains("missing certificate"));
    assert!(journal.lock().is_empty());
}

#[tokio::test]
async fn units_in_one_namespace_share_state() {
    let (sup, _) = supervisor();
    let seen = Arc::new(Mutex::new(None::<String>));

    sup.register(
        |ns: Namespace| {
            let writer = ns.clone();
            ServiceFn::new("writer", ServiceType::Blocking, move || {
                writer.set("dsn", String::from("postgres://db"));
                async { Ok::<_, ServiceError>(()) }
            })
        },
        UnitOptions::new().with_namespace("storage"),
    );

    let out = seen.clone();
    sup.register(
        move |ns: Namespace| {
            ServiceFn::new("reader", ServiceType::Blocking, move || {
                *out.lock() = ns.get_string("dsn");
                async { Ok::<_, ServiceError>(()) }
            })
        },
        UnitOptions::new().with_namespace("storage"),
    );

    sup.run().await.unwrap();
    assert_eq!(seen.lock().as_deref(), Some("postgres://db"));

    let ns = sup.namespace("storage").unwrap();
    assert_eq!(ns.entries().len(), 2);
    assert!(ns.del("dsn").is_some());
    assert!(ns.get("dsn").is_none());
}

#[derive(Default)]
struct Http {
    port: i64,
}

impl Bind for Http {
    fn bind(&mut self, b: &mut Binder<'_>) -> Result<(), EnvError> {
        b.required("svc_port", &mut self.port)
    }
}

#[test]
fn env_binding_populates_required_field() {
    let ns = Namespace::with_env(
        "svc",
        unitvisor::Env::from_vars("svc", [("SVC_PORT", "8080")]),
        Default::default(),
    );
    let mut http = Http::default();
    ns.env().assign(&mut http).unwrap();
    assert_eq!(http.port, 8080);

    let empty = Namespace::with_env(
        "svc",
        unitvisor::Env::from_vars("svc", Vec::<(String, String)>::new()),
        Default::default(),
    );
    let err = empty.env().assign(&mut Http::default()).unwrap_err();
    assert!(err.to_string().contains("SVC_PORT"), "{err}");
}

#[tokio::test]
async fn install_error_from_env_binding() {
    struct Configured {
        env: unitvisor::Env,
    }

    #[async_trait]
    impl Service for Configured {
        fn name(&self) -> &str {
            "configured"
        }

        fn service_type(&self) -> ServiceType {
            ServiceType::Blocking
        }

        async fn on_install(&self) -> Result<(), ServiceError> {
            let mut http = Http::default();
            self.env.assign(&mut http)?;
            Ok(())
        }

        async fn on_start(&self) -> Result<(), ServiceError> {
            Ok(())
        }
    }

    let (sup, _) = supervisor();
    sup.register(
        |_| Configured {
            env: unitvisor::Env::from_vars("unitvisor_test_scope", [("OTHER", "1")]),
        },
        UnitOptions::new(),
    );

    let err = sup.run().await.unwrap_err();
    assert!(err.to_string().contains("SVC_PORT"), "{err}");
}
