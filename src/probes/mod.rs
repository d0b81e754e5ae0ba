//! # Dependency Probes
//!
//! Concrete [`HealthProbe`] implementations and the factory that turns
//! `[[probes]]` configuration entries into registry entries.
//!
//! | kind             | check                                  | default failure |
//! |------------------|----------------------------------------|-----------------|
//! | `sql`            | `SELECT 1` over a lazy Postgres pool    | Unhealthy       |
//! | `document_store` | HTTP GET, any response below 500       | Degraded        |
//! | `cache`          | RESP `PING`, expects `+PONG`           | Unhealthy       |
//! | `http`           | HTTP GET, 2xx                          | Unhealthy       |

pub mod cache;
pub mod document_store;
pub mod http;
pub mod sql;

use std::sync::Arc;

pub use cache::CacheProbe;
pub use document_store::DocumentStoreProbe;
pub use http::HttpProbe;
pub use sql::SqlProbe;

use crate::config::{AppConfig, ConfigResult, ProbeConfig, ProbeKind};
use crate::error::HealthResult;
use crate::health::probe::HealthProbe;
use crate::health::registry::{ProbeRegistration, ProbeRegistry};

/// Instantiate the probe described by one configuration entry
pub fn build_probe(config: &ProbeConfig) -> ConfigResult<Arc<dyn HealthProbe>> {
    let probe: Arc<dyn HealthProbe> = match &config.kind {
        ProbeKind::Sql { connection_string } => {
            Arc::new(SqlProbe::new(&config.name, connection_string)?)
        }
        ProbeKind::DocumentStore { endpoint } => {
            Arc::new(DocumentStoreProbe::new(&config.name, endpoint)?)
        }
        ProbeKind::Cache { address } => Arc::new(CacheProbe::new(&config.name, address)?),
        ProbeKind::Http { url } => Arc::new(HttpProbe::new(&config.name, url)?),
    };
    Ok(probe)
}

/// Registration for one configuration entry
pub fn build_registration(config: &ProbeConfig) -> ConfigResult<ProbeRegistration> {
    let mut registration = ProbeRegistration::new(config.name.clone(), build_probe(config)?)
        .with_tags(config.tags.iter().cloned())
        .with_failure_status(config.effective_failure_status());
    if let Some(timeout) = config.timeout() {
        registration = registration.with_timeout(timeout);
    }
    Ok(registration)
}

/// Build the registry from every configured probe, in declaration order.
///
/// A malformed probe surfaces as `ConfigurationInvalid`; a repeated name as
/// `DuplicateName`.
pub fn build_registry(config: &AppConfig) -> HealthResult<ProbeRegistry> {
    let mut registry = ProbeRegistry::new();
    for probe in &config.probes {
        registry.register(build_registration(probe)?)?;
    }
    Ok(registry)
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HealthError;
    use crate::health::types::HealthStatus;
    use std::time::Duration;

    fn probe(name: &str, kind: ProbeKind) -> ProbeConfig {
        ProbeConfig {
            name: name.to_string(),
            tags: Vec::new(),
            failure_status: None,
            timeout_seconds: None,
            kind,
        }
    }

    fn cache(name: &str) -> ProbeConfig {
        probe(
            name,
            ProbeKind::Cache {
                address: "127.0.0.1:6379".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn test_registry_preserves_order_and_metadata() {
        let mut cosmos = probe(
            "CosmosDB-BD",
            ProbeKind::DocumentStore {
                endpoint: "https://localhost:8081/".to_string(),
            },
        );
        cosmos.tags = vec!["cosmosdb".to_string()];
        let mut redis = cache("cacheRedis");
        redis.timeout_seconds = Some(3);

        let config = AppConfig {
            probes: vec![
                probe(
                    "SQLAzure-BD",
                    ProbeKind::Sql {
                        connection_string: "postgresql://localhost/app".to_string(),
                    },
                ),
                cosmos,
                redis,
            ],
            ..Default::default()
        };

        let registry = build_registry(&config).unwrap();

        assert_eq!(registry.names(), vec!["SQLAzure-BD", "CosmosDB-BD", "cacheRedis"]);
        let cosmos = registry.get("CosmosDB-BD").unwrap();
        assert_eq!(cosmos.failure_status, HealthStatus::Degraded);
        assert_eq!(cosmos.tags, vec!["cosmosdb".to_string()]);
        assert_eq!(
            registry.get("cacheRedis").unwrap().timeout,
            Some(Duration::from_secs(3))
        );
    }

    #[tokio::test]
    async fn test_duplicate_probe_names_are_rejected() {
        let config = AppConfig {
            probes: vec![cache("cacheRedis"), cache("cacheRedis")],
            ..Default::default()
        };
        let error = build_registry(&config).unwrap_err();
        assert_eq!(error, HealthError::DuplicateName("cacheRedis".to_string()));
    }

    #[tokio::test]
    async fn test_malformed_probe_is_configuration_error() {
        let config = AppConfig {
            probes: vec![probe(
                "upstream",
                ProbeKind::Http {
                    url: "not a url".to_string(),
                },
            )],
            ..Default::default()
        };
        let error = build_registry(&config).unwrap_err();
        assert!(matches!(error, HealthError::ConfigurationInvalid(_)));
        assert!(!error.is_fatal());
    }
}
