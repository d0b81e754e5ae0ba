//! Plain HTTP endpoint probe: healthy on any 2xx response.

use async_trait::async_trait;
use reqwest::{Client, Url};

use crate::config::{ConfigResult, ConfigurationError};
use crate::health::probe::{HealthProbe, ProbeError, ProbeOutcome};

#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client,
    url: Url,
}

impl HttpProbe {
    pub fn new(name: &str, url: &str) -> ConfigResult<Self> {
        let url = Url::parse(url).map_err(|e| ConfigurationError::invalid_probe_config(name, e))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigurationError::invalid_probe_config(
                name,
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        let client = Client::builder()
            .user_agent(format!("healthwatch/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigurationError::invalid_probe_config(name, e))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl HealthProbe for HttpProbe {
    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let response = self.client.get(self.url.clone()).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(ProbeError::UnexpectedResponse(format!(
                "{} returned HTTP {}",
                self.url, status
            )));
        }

        Ok(ProbeOutcome::healthy().with_data("http_status", status.as_u16()))
    }
}
