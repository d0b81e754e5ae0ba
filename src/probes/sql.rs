//! Relational database probe: one `SELECT 1` over a lazily connected pool.

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{ConfigResult, ConfigurationError};
use crate::health::probe::{HealthProbe, ProbeError, ProbeOutcome};

/// Upper bound on waiting for a pooled connection; the evaluator's probe
/// timeout usually fires first
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SqlProbe {
    pool: PgPool,
}

impl SqlProbe {
    /// Build the probe without connecting. The connection string is parsed
    /// here so malformed configuration is caught at startup.
    pub fn new(name: &str, connection_string: &str) -> ConfigResult<Self> {
        Self::with_acquire_timeout(name, connection_string, ACQUIRE_TIMEOUT)
    }

    pub fn with_acquire_timeout(
        name: &str,
        connection_string: &str,
        acquire_timeout: Duration,
    ) -> ConfigResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(acquire_timeout)
            .connect_lazy(connection_string)
            .map_err(|e| ConfigurationError::invalid_probe_config(name, e))?;
        Ok(Self { pool })
    }
}

#[async_trait]
impl HealthProbe for SqlProbe {
    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let started = Instant::now();
        sqlx::query("SELECT 1").execute(&self.pool).await?;

        Ok(ProbeOutcome::healthy().with_data("query_ms", started.elapsed().as_millis() as u64))
    }
}
