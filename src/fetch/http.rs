//! Static fetch: a single blocking GET through ureq

use std::time::Duration;

use tracing::{debug, info};

use super::{parse_target_url, FetchConfig, Fetcher, PageContent};
use crate::error::FetchError;

/// Fetches server-rendered pages with one request and no retries
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
    timeout: Duration,
}

impl HttpFetcher {
    pub fn new(config: &FetchConfig) -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .timeout_global(Some(config.request_timeout))
                .user_agent(config.user_agent.as_str())
                .http_status_as_error(false)
                .build(),
        );

        Self {
            agent,
            timeout: config.request_timeout,
        }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(&FetchConfig::default())
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        let target = parse_target_url(url)?;
        info!("Fetching {}", target);

        let resp = self.agent.get(target.as_str()).call().map_err(|e| match e {
            ureq::Error::Timeout(_) => FetchError::Timeout {
                url: url.to_string(),
                waited: self.timeout,
            },
            other => FetchError::Network {
                url: url.to_string(),
                message: other.to_string(),
            },
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::BadStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let markup = resp
            .into_body()
            .read_to_string()
            .map_err(|e| FetchError::Network {
                url: url.to_string(),
                message: format!("failed to read body: {}", e),
            })?;

        debug!("Fetched {} bytes from {}", markup.len(), target);
        Ok(PageContent::new(target, markup))
    }
}
