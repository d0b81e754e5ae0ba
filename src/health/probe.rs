//! # Probe Capability
//!
//! A probe is one independently invokable check against one dependency. Every
//! dependency kind (SQL, document store, cache, custom) implements
//! [`HealthProbe`]; the evaluator never needs to know which kind it runs.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::types::HealthStatus;

/// What a probe reports when it completes without error
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeOutcome {
    pub status: HealthStatus,
    pub description: Option<String>,
    pub data: BTreeMap<String, serde_json::Value>,
}

impl ProbeOutcome {
    pub fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            description: None,
            data: BTreeMap::new(),
        }
    }

    pub fn degraded<D: Into<String>>(description: D) -> Self {
        Self {
            status: HealthStatus::Degraded,
            description: Some(description.into()),
            data: BTreeMap::new(),
        }
    }

    pub fn unhealthy<D: Into<String>>(description: D) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            description: Some(description.into()),
            data: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_description<D: Into<String>>(mut self, description: D) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn with_data<K: Into<String>, V: Into<serde_json::Value>>(mut self, key: K, value: V) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

/// Failure raised by a probe implementation
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Connection failed: {0}")]
    Connection(String),
    #[error("Query failed: {0}")]
    Query(String),
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
    #[error("{0}")]
    Other(String),
}

impl ProbeError {
    pub fn other<E: fmt::Display>(error: E) -> Self {
        Self::Other(error.to_string())
    }
}

impl From<sqlx::Error> for ProbeError {
    fn from(error: sqlx::Error) -> Self {
        match error {
            sqlx::Error::Io(_) | sqlx::Error::Tls(_) | sqlx::Error::PoolTimedOut => {
                ProbeError::Connection(error.to_string())
            }
            other => ProbeError::Query(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() {
            ProbeError::Connection(error.to_string())
        } else {
            ProbeError::UnexpectedResponse(error.to_string())
        }
    }
}

impl From<std::io::Error> for ProbeError {
    fn from(error: std::io::Error) -> Self {
        ProbeError::Connection(error.to_string())
    }
}

/// Health check against one dependency
///
/// Implementations should not enforce their own overall timeout; the evaluator
/// wraps every call in the configured per-probe timeout and cancels the call
/// when it expires.
#[async_trait]
pub trait HealthProbe: Send + Sync + fmt::Debug {
    async fn check(&self) -> Result<ProbeOutcome, ProbeError>;
}

type CheckFn = dyn Fn() -> BoxFuture<'static, Result<ProbeOutcome, ProbeError>> + Send + Sync;

/// Adapter turning an async closure into a probe
///
/// ```rust
/// use healthwatch_core::health::probe::{FnProbe, ProbeOutcome};
///
/// let probe = FnProbe::new("self", || async { Ok(ProbeOutcome::healthy()) });
/// ```
pub struct FnProbe {
    label: String,
    check: Box<CheckFn>,
}

impl FnProbe {
    pub fn new<L, F, Fut>(label: L, check: F) -> Self
    where
        L: Into<String>,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<ProbeOutcome, ProbeError>> + Send + 'static,
    {
        Self {
            label: label.into(),
            check: Box::new(move || Box::pin(check())),
        }
    }
}

impl fmt::Debug for FnProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnProbe").field("label", &self.label).finish()
    }
}

#[async_trait]
impl HealthProbe for FnProbe {
    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        (self.check)().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fn_probe_runs_closure() {
        let probe = FnProbe::new("self", || async {
            Ok(ProbeOutcome::healthy().with_data("uptime_seconds", 42))
        });
        let outcome = probe.check().await.unwrap();
        assert_eq!(outcome.status, HealthStatus::Healthy);
        assert_eq!(outcome.data["uptime_seconds"], serde_json::json!(42));
    }

    #[tokio::test]
    async fn test_fn_probe_propagates_error() {
        let probe = FnProbe::new("broken", || async {
            Err(ProbeError::Connection("refused".to_string()))
        });
        let error = probe.check().await.unwrap_err();
        assert_eq!(error.to_string(), "Connection failed: refused");
    }

    #[test]
    fn test_outcome_builders() {
        let outcome = ProbeOutcome::degraded("slow replica").with_data("lag_ms", 1500);
        assert_eq!(outcome.status, HealthStatus::Degraded);
        assert_eq!(outcome.description.as_deref(), Some("slow replica"));
        assert_eq!(outcome.data.len(), 1);
    }

    #[test]
    fn test_io_error_is_connection_error() {
        let error: ProbeError =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        assert!(matches!(error, ProbeError::Connection(_)));
    }
}
