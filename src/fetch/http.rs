//! HTTP transport backed by `ureq`

use crate::config::NetworkConfig;
use crate::error::{PixcacheError, PixcacheResult};
use crate::fetch::Fetcher;
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tracing::{debug, trace};
use ureq::Agent;
use url::Url;

/// [`Fetcher`] issuing plain GET requests.
///
/// `ureq` is blocking, so every request runs on the tokio blocking pool and
/// the awaiting task is woken with the result.
#[derive(Clone)]
pub struct HttpFetcher {
    agent: Agent,
    max_body_bytes: u64,
}

impl HttpFetcher {
    /// Create a fetcher from the `[network]` config section
    pub fn new(config: &NetworkConfig) -> Self {
        let agent_config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .user_agent(config.user_agent.as_str())
            .build();

        Self {
            agent: Agent::new_with_config(agent_config),
            max_body_bytes: config.max_body_bytes,
        }
    }

    fn get_blocking(agent: &Agent, url: &str, limit: u64) -> PixcacheResult<Vec<u8>> {
        let mut response = agent.get(url).call().map_err(|e| match e {
            ureq::Error::StatusCode(status) => PixcacheError::HttpStatus {
                url: url.to_string(),
                status,
            },
            other => PixcacheError::fetch(url, other.to_string()),
        })?;

        let body = response
            .body_mut()
            .with_config()
            .limit(limit)
            .read_to_vec()
            .map_err(|e| PixcacheError::fetch(url, format!("reading body: {}", e)))?;

        if body.is_empty() {
            return Err(PixcacheError::EmptyBody {
                url: url.to_string(),
            });
        }

        trace!("Fetched {} bytes from {}", body.len(), url);
        Ok(body)
    }
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("max_body_bytes", &self.max_body_bytes)
            .finish_non_exhaustive()
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&NetworkConfig::default())
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, locator: &Url) -> PixcacheResult<Vec<u8>> {
        let agent = self.agent.clone();
        let url = locator.to_string();
        let limit = self.max_body_bytes;

        debug!("Downloading {}", url);
        let task_url = url.clone();
        tokio::task::spawn_blocking(move || Self::get_blocking(&agent, &task_url, limit))
            .await
            .map_err(|e| PixcacheError::fetch(url, format!("transport task failed: {}", e)))?
    }
}
