//! Document store account probe.
//!
//! Account endpoints answer unauthenticated requests with 401, so any response
//! below 500 proves the service is reachable and serving.

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::config::{ConfigResult, ConfigurationError};
use crate::health::probe::{HealthProbe, ProbeError, ProbeOutcome};

#[derive(Debug, Clone)]
pub struct DocumentStoreProbe {
    client: Client,
    endpoint: Url,
}

impl DocumentStoreProbe {
    pub fn new(name: &str, endpoint: &str) -> ConfigResult<Self> {
        let endpoint =
            Url::parse(endpoint).map_err(|e| ConfigurationError::invalid_probe_config(name, e))?;
        let client = Client::builder()
            .user_agent(format!("healthwatch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigurationError::invalid_probe_config(name, e))?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl HealthProbe for DocumentStoreProbe {
    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let response = self.client.get(self.endpoint.clone()).send().await?;
        let status = response.status();

        if status.is_server_error() {
            return Err(ProbeError::UnexpectedResponse(format!(
                "{} returned HTTP {}",
                self.endpoint, status
            )));
        }

        Ok(ProbeOutcome::healthy().with_data("http_status", status.as_u16()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probes::test_support::spawn_http_responder;
    use axum::http::StatusCode;

    #[test]
    fn test_invalid_endpoint_is_config_error() {
        let error = DocumentStoreProbe::new("CosmosDB-BD", "::not-a-url").unwrap_err();
        assert!(matches!(error, ConfigurationError::InvalidProbeConfig { .. }));
    }

    #[tokio::test]
    async fn test_unauthorized_counts_as_reachable() {
        let url = spawn_http_responder(StatusCode::UNAUTHORIZED).await;
        let probe = DocumentStoreProbe::new("CosmosDB-BD", &url).unwrap();

        let outcome = probe.check().await.unwrap();
        assert_eq!(outcome.data["http_status"], serde_json::json!(401));
    }

    #[tokio::test]
    async fn test_server_error_fails() {
        let url = spawn_http_responder(StatusCode::SERVICE_UNAVAILABLE).await;
        let probe = DocumentStoreProbe::new("CosmosDB-BD", &url).unwrap();

        let error = probe.check().await.unwrap_err();
        assert!(matches!(error, ProbeError::UnexpectedResponse(_)));
    }
}
