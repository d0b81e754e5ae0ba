//! Cache server probe: sends a RESP `PING` and expects `+PONG`.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::config::{ConfigResult, ConfigurationError};
use crate::health::probe::{HealthProbe, ProbeError, ProbeOutcome};

const PING: &[u8] = b"*1\r\n$4\r\nPING\r\n";

#[derive(Debug, Clone)]
pub struct CacheProbe {
    address: String,
}

impl CacheProbe {
    /// Accepts `host:port` or `redis://host:port`
    pub fn new(name: &str, address: &str) -> ConfigResult<Self> {
        let address = address
            .trim()
            .trim_start_matches("redis://")
            .trim_end_matches('/')
            .to_string();

        match address.rsplit_once(':') {
            Some((host, port)) if !host.is_empty() && port.parse::<u16>().is_ok() => {
                Ok(Self { address })
            }
            _ => Err(ConfigurationError::invalid_probe_config(
                name,
                format!("cache address '{address}' must be host:port"),
            )),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

#[async_trait]
impl HealthProbe for CacheProbe {
    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        let mut stream = TcpStream::connect(&self.address).await?;
        stream.write_all(PING).await?;

        let mut reader = BufReader::new(stream);
        let mut line = String::new();
        reader.read_line(&mut line).await?;

        match line.trim_end() {
            "+PONG" => Ok(ProbeOutcome::healthy()),
            "" => Err(ProbeError::UnexpectedResponse(
                "connection closed before reply".to_string(),
            )),
            other => Err(ProbeError::UnexpectedResponse(other.to_string())),
        }
    }
}
