//! # Integration Test Infrastructure
//!
//! Runs the real router on an ephemeral port and talks to it over HTTP.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use healthwatch_core::bootstrap::{BuildInfo, HealthCheckSystem, HealthSystemHandle};
use healthwatch_core::config::{AppConfig, HealthCheckConfig, ServerConfig};
use healthwatch_core::health::{
    FnProbe, HealthStatus, ProbeError, ProbeOutcome, ProbeRegistration, ProbeRegistry,
};
use healthwatch_core::web::create_app;
use parking_lot::Mutex;
use reqwest::Client;
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub type TestResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Running server plus the subsystem behind it
#[derive(Debug)]
pub struct TestServer {
    pub base_url: String,
    pub health: Option<HealthSystemHandle>,
    client: Client,
    shutdown_tx: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl TestServer {
    /// Start the subsystem from `config` (optionally with a programmatic
    /// registry) and serve it on 127.0.0.1 with a random port
    pub async fn start(config: AppConfig, registry: Option<ProbeRegistry>) -> TestResult<Self> {
        let build_info = BuildInfo {
            name: "orders-api".to_string(),
            version: "1.4.2".to_string(),
            build_id: Some("20261017.3".to_string()),
        };

        let mut system = HealthCheckSystem::new(Arc::new(config.clone()), build_info);
        if let Some(registry) = registry {
            system = system.with_registry(registry);
        }
        let health = system.start().await?;

        let app = create_app(
            &config.server,
            health.as_ref().map(|h| h.app_state().clone()),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("test server failed");
        });

        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            base_url,
            health,
            client,
            shutdown_tx,
            handle,
        })
    }

    pub async fn get(&self, path: &str) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
    }

    pub async fn get_with_accept(
        &self,
        path: &str,
        accept: &str,
    ) -> reqwest::Result<reqwest::Response> {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, accept)
            .send()
            .await
    }

    pub async fn get_json(&self, path: &str) -> TestResult<Value> {
        let response = self.get(path).await?;
        assert_eq!(response.status(), reqwest::StatusCode::OK, "GET {path}");
        Ok(response.json().await?)
    }

    /// Stop the subsystem first so open event streams end, then the server
    pub async fn shutdown(mut self) -> TestResult<()> {
        if let Some(health) = self.health.as_mut() {
            health.shutdown().await?;
        }
        let _ = self.shutdown_tx.send(());
        tokio::time::timeout(Duration::from_secs(5), self.handle).await??;
        Ok(())
    }
}

/// Subsystem options for tests: enabled, short interval, small history
pub fn enabled_config() -> AppConfig {
    AppConfig {
        server: ServerConfig::default(),
        health_check: HealthCheckConfig {
            enable_checks_standard: true,
            evaluation_time_in_seconds: 1,
            minimum_seconds_between_failure_notifications: 60,
            maximum_history_entries_per_endpoint: Some(5),
            probe_timeout_seconds: 2,
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Probe whose status can be flipped from the test
#[derive(Debug, Clone)]
pub struct Switch {
    status: Arc<Mutex<HealthStatus>>,
    calls: Arc<AtomicUsize>,
}

impl Switch {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status: Arc::new(Mutex::new(status)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn set(&self, status: HealthStatus) {
        *self.status.lock() = status;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn registration(&self, name: &str) -> ProbeRegistration {
        let status = Arc::clone(&self.status);
        let calls = Arc::clone(&self.calls);
        let probe = FnProbe::new(name, move || {
            let status = *status.lock();
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                match status {
                    HealthStatus::Healthy => Ok(ProbeOutcome::healthy()),
                    HealthStatus::Degraded => Ok(ProbeOutcome::degraded("running slow")),
                    HealthStatus::Unhealthy => {
                        Err(ProbeError::Connection("connection refused".to_string()))
                    }
                }
            }
        });
        ProbeRegistration::new(name, Arc::new(probe))
    }
}

/// Registry with the given registrations, in order
pub fn registry_of(registrations: Vec<ProbeRegistration>) -> ProbeRegistry {
    let mut registry = ProbeRegistry::new();
    for registration in registrations {
        registry
            .register(registration)
            .expect("test probe names are unique");
    }
    registry
}

/// Local endpoint that records every JSON body POSTed to `/hook`
#[derive(Debug)]
pub struct WebhookReceiver {
    pub url: String,
    received: Arc<Mutex<Vec<Value>>>,
}

impl WebhookReceiver {
    pub async fn start() -> TestResult<Self> {
        let received = Arc::new(Mutex::new(Vec::new()));

        async fn record(State(received): State<Arc<Mutex<Vec<Value>>>>, Json(body): Json<Value>) {
            received.lock().push(body);
        }

        let app = Router::new()
            .route("/hook", post(record))
            .with_state(Arc::clone(&received));
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let url = format!("http://{}/hook", listener.local_addr()?);
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { url, received })
    }

    pub fn received(&self) -> Vec<Value> {
        self.received.lock().clone()
    }

    /// Poll until `count` payloads arrived or the deadline passes
    pub async fn wait_for(&self, count: usize, deadline: Duration) -> Vec<Value> {
        let started = tokio::time::Instant::now();
        loop {
            let received = self.received();
            if received.len() >= count || started.elapsed() >= deadline {
                return received;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// Poll `path` until `predicate` holds for the JSON body or the deadline passes
pub async fn wait_for_json<F>(
    server: &TestServer,
    path: &str,
    deadline: Duration,
    predicate: F,
) -> TestResult<Value>
where
    F: Fn(&Value) -> bool,
{
    let started = tokio::time::Instant::now();
    loop {
        let body = server.get_json(path).await?;
        if predicate(&body) || started.elapsed() >= deadline {
            return Ok(body);
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
