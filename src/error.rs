//! Error types for the health-check engine.
//!
//! Probe-level failures are captured into evaluation results and never surface
//! through these types at runtime. Only startup problems (duplicate probe names,
//! invalid configuration) are returned to the caller.

use std::time::Duration;
use thiserror::Error;

use crate::config::ConfigurationError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum HealthError {
    #[error("Probe '{name}' timed out after {timeout:?}")]
    ProbeTimeout { name: String, timeout: Duration },
    #[error("Probe '{name}' failed: {reason}")]
    ProbeExecution { name: String, reason: String },
    #[error("Duplicate probe name: {0}")]
    DuplicateName(String),
    #[error("Invalid configuration: {0}")]
    ConfigurationInvalid(String),
    #[error("Notification error: {0}")]
    NotificationError(String),
    #[error("Server error: {0}")]
    ServerError(String),
}

impl HealthError {
    pub fn probe_timeout<N: Into<String>>(name: N, timeout: Duration) -> Self {
        Self::ProbeTimeout {
            name: name.into(),
            timeout,
        }
    }

    pub fn probe_execution<N: Into<String>, R: std::fmt::Display>(name: N, reason: R) -> Self {
        Self::ProbeExecution {
            name: name.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether this error must abort startup rather than disable the subsystem
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::DuplicateName(_) | Self::ServerError(_))
    }
}

impl From<ConfigurationError> for HealthError {
    fn from(error: ConfigurationError) -> Self {
        HealthError::ConfigurationInvalid(error.to_string())
    }
}

impl From<std::io::Error> for HealthError {
    fn from(error: std::io::Error) -> Self {
        HealthError::ServerError(error.to_string())
    }
}

pub type HealthResult<T> = Result<T, HealthError>;
