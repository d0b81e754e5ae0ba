//! # Probe Registry
//!
//! Holds the configured probes with their names, tags and failure
//! classification. Populated once at startup; after bootstrap it is shared
//! behind an `Arc` and never mutated again.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::probe::HealthProbe;
use super::types::HealthStatus;
use crate::error::{HealthError, HealthResult};

/// A probe plus the metadata the evaluator needs to run and classify it
#[derive(Debug, Clone)]
pub struct ProbeRegistration {
    pub name: String,
    pub tags: Vec<String>,
    /// Status recorded when the probe errors or panics
    pub failure_status: HealthStatus,
    /// Overrides the evaluator's default timeout
    pub timeout: Option<Duration>,
    pub probe: Arc<dyn HealthProbe>,
}

impl ProbeRegistration {
    pub fn new<N: Into<String>>(name: N, probe: Arc<dyn HealthProbe>) -> Self {
        Self {
            name: name.into(),
            tags: Vec::new(),
            failure_status: HealthStatus::Unhealthy,
            timeout: None,
            probe,
        }
    }

    #[must_use]
    pub fn with_tags<I, T>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Healthy is not a failure classification and is coerced to Unhealthy
    #[must_use]
    pub fn with_failure_status(mut self, status: HealthStatus) -> Self {
        self.failure_status = if status.is_failing() {
            status
        } else {
            HealthStatus::Unhealthy
        };
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Ordered set of uniquely named probes
#[derive(Debug, Default)]
pub struct ProbeRegistry {
    probes: Vec<ProbeRegistration>,
    names: HashSet<String>,
}

impl ProbeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a probe; fails with `DuplicateName` if the name is taken
    pub fn register(&mut self, registration: ProbeRegistration) -> HealthResult<()> {
        if !self.names.insert(registration.name.clone()) {
            return Err(HealthError::DuplicateName(registration.name));
        }

        debug!(
            probe = %registration.name,
            tags = ?registration.tags,
            failure_status = %registration.failure_status,
            "Registered health probe"
        );
        self.probes.push(registration);
        Ok(())
    }

    /// Registered probes in registration order
    pub fn list(&self) -> &[ProbeRegistration] {
        &self.probes
    }

    pub fn get(&self, name: &str) -> Option<&ProbeRegistration> {
        self.probes.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.probes.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }

    /// Freeze the registry for sharing
    pub fn into_shared(self) -> Arc<ProbeRegistry> {
        Arc::new(self)
    }
}
