//! Page fetching
//!
//! Two ways to get markup for a URL:
//! - static: one blocking GET ([`HttpFetcher`])
//! - rendered: a headless browser loads the page and waits for a readiness
//!   marker ([`RenderedFetcher`])
//!
//! The rest of the crate only sees the [`Fetcher`] trait and [`PageContent`].

mod browser;
mod chrome;
mod http;

pub use browser::*;
pub use chrome::*;
pub use http::*;

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::FetchError;

/// Default time budget for a single static request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default time to wait for the readiness condition in rendered mode
pub const DEFAULT_READY_TIMEOUT: Duration = Duration::from_secs(20);

pub const DEFAULT_USER_AGENT: &str = concat!("page-tabulator/", env!("CARGO_PKG_VERSION"));

/// Raw markup plus the URL it came from
#[derive(Debug, Clone)]
pub struct PageContent {
    url: Url,
    markup: String,
}

impl PageContent {
    pub fn new(url: Url, markup: impl Into<String>) -> Self {
        Self {
            url,
            markup: markup.into(),
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn markup(&self) -> &str {
        &self.markup
    }
}

/// Anything that can turn a URL into page content
pub trait Fetcher {
    fn fetch(&self, url: &str) -> Result<PageContent, FetchError>;
}

impl<F: Fetcher + ?Sized> Fetcher for Box<F> {
    fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        (**self).fetch(url)
    }
}

/// Predicate over the rendered document that signals rendering is done
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessCondition {
    /// At least one element matches the CSS selector
    ElementPresent(String),
}

impl ReadinessCondition {
    pub fn element(selector: impl Into<String>) -> Self {
        ReadinessCondition::ElementPresent(selector.into())
    }
}

#[derive(Debug, Clone)]
pub enum FetchMode {
    Static,
    Rendered {
        ready: ReadinessCondition,
        timeout: Duration,
    },
}

impl FetchMode {
    /// Rendered mode with the default readiness timeout
    pub fn rendered(ready: ReadinessCondition) -> Self {
        FetchMode::Rendered {
            ready,
            timeout: DEFAULT_READY_TIMEOUT,
        }
    }
}

/// Settings shared by both fetch modes
#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub user_agent: String,
    pub request_timeout: Duration,
    /// Browser binary; auto-detected when `None`
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            chrome_executable: None,
            headless: true,
        }
    }
}

/// Build the fetcher for a mode
pub fn fetcher_for(mode: &FetchMode, config: &FetchConfig) -> Box<dyn Fetcher> {
    match mode {
        FetchMode::Static => Box::new(HttpFetcher::new(config)),
        FetchMode::Rendered { ready, timeout } => Box::new(RenderedFetcher::new(
            ChromeLauncher::new(config),
            ready.clone(),
            *timeout,
        )),
    }
}

/// Fetch one page with default settings
pub fn fetch(url: &str, mode: &FetchMode) -> Result<PageContent, FetchError> {
    fetcher_for(mode, &FetchConfig::default()).fetch(url)
}

/// Parse and check a target URL. Only http and https are accepted.
pub fn parse_target_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}
