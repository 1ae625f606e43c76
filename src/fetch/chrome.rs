//! Headless Chrome sessions via chromiumoxide
//!
//! chromiumoxide is async. Each session owns a private current-thread tokio
//! runtime and drives every browser call with `block_on`, so callers stay
//! synchronous. The CDP event handler is spawned on that runtime and only
//! makes progress while a call is in flight, which is all it needs.

use std::path::PathBuf;
use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfigBuilder};
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page;
use futures::StreamExt;
use tempfile::TempDir;
use tokio::runtime::Runtime;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::{BrowserLauncher, BrowserSession, FetchConfig, ReadinessCondition};
use crate::error::FetchError;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Launches one Chrome process per session
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    executable: Option<PathBuf>,
    headless: bool,
    user_agent: String,
    request_timeout: Duration,
}

impl ChromeLauncher {
    pub fn new(config: &FetchConfig) -> Self {
        Self {
            executable: config.chrome_executable.clone(),
            headless: config.headless,
            user_agent: config.user_agent.clone(),
            request_timeout: config.request_timeout,
        }
    }
}

fn browser_error(context: &str, err: impl std::fmt::Display) -> FetchError {
    FetchError::Browser(format!("{}: {}", context, err))
}

/// Chrome reports load failures as `net::ERR_*` error text on the navigate
/// response; those are network failures, everything else is the browser's.
fn navigation_error(url: &str, err: CdpError) -> FetchError {
    match err {
        CdpError::ChromeMessage(message) if message.starts_with("net::ERR_") => {
            FetchError::Network {
                url: url.to_string(),
                message,
            }
        }
        other => browser_error(&format!("navigation to {} failed", url), other),
    }
}

/// Protocol-level error answered by a live page, e.g. a node id gone stale
/// while the document is being replaced. Worth polling again.
fn is_transient(err: &CdpError) -> bool {
    matches!(err, CdpError::Chrome(_))
}

impl BrowserLauncher for ChromeLauncher {
    type Session = ChromeSession;

    fn launch(&self) -> Result<ChromeSession, FetchError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| browser_error("failed to start browser runtime", e))?;

        // Private profile so concurrent runs never share a lock file
        let profile = tempfile::Builder::new()
            .prefix("page-tabulator-chrome-")
            .tempdir()
            .map_err(|e| browser_error("failed to create browser profile", e))?;

        let mut builder = BrowserConfigBuilder::default()
            .request_timeout(self.request_timeout)
            .window_size(1920, 1080)
            .user_data_dir(profile.path())
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            .arg("--disable-extensions")
            .arg("--mute-audio");
        if !self.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &self.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| browser_error("invalid browser config", e))?;

        info!("Launching headless browser");
        let (browser, mut handler) = runtime
            .block_on(Browser::launch(config))
            .map_err(|e| browser_error("failed to launch browser", e))?;

        let handler = runtime.spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {:?}", e);
                }
            }
        });

        let page = runtime
            .block_on(browser.new_page("about:blank"))
            .map_err(|e| browser_error("failed to open page", e))?;

        Ok(ChromeSession {
            page,
            browser,
            handler,
            runtime,
            _profile: profile,
        })
    }
}

/// A running Chrome with one tab
///
/// Field order is drop order: the page and browser go first (dropping
/// `Browser` kills a still-running child), then the runtime, then the
/// profile directory.
pub struct ChromeSession {
    page: Page,
    browser: Browser,
    handler: JoinHandle<()>,
    runtime: Runtime,
    _profile: TempDir,
}

impl BrowserSession for ChromeSession {
    fn navigate(&mut self, url: &str) -> Result<(), FetchError> {
        self.runtime
            .block_on(self.page.goto(url))
            .map_err(|e| navigation_error(url, e))?;
        Ok(())
    }

    fn wait_until(
        &mut self,
        condition: &ReadinessCondition,
        timeout: Duration,
    ) -> Result<bool, FetchError> {
        let ReadinessCondition::ElementPresent(selector) = condition;
        let page = &self.page;

        // querySelectorAll answers an empty list when nothing matches yet
        let poll = async {
            loop {
                match page.find_elements(selector.as_str()).await {
                    Ok(found) if !found.is_empty() => return Ok(()),
                    Ok(_) => {}
                    Err(e) if is_transient(&e) => debug!("Readiness poll: {}", e),
                    Err(e) => return Err(browser_error("readiness check failed", e)),
                }
                tokio::time::sleep(POLL_INTERVAL).await;
            }
        };

        let ready = match self
            .runtime
            .block_on(async { tokio::time::timeout(timeout, poll).await })
        {
            Ok(outcome) => {
                outcome?;
                true
            }
            Err(_elapsed) => false,
        };
        debug!("Readiness '{}' satisfied: {}", selector, ready);
        Ok(ready)
    }

    fn current_content(&mut self) -> Result<String, FetchError> {
        self.runtime
            .block_on(self.page.content())
            .map_err(|e| browser_error("failed to read rendered markup", e))
    }

    fn close(&mut self) -> Result<(), FetchError> {
        let Self {
            runtime,
            browser,
            handler,
            ..
        } = self;

        let outcome = runtime.block_on(async {
            browser
                .close()
                .await
                .map_err(|e| browser_error("failed to close browser", e))?;
            browser
                .wait()
                .await
                .map_err(|e| browser_error("browser did not exit", e))?;
            Ok::<(), FetchError>(())
        });
        handler.abort();
        if outcome.is_ok() {
            info!("Browser session closed");
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchErrorKind;

    #[test]
    fn test_net_errors_are_network_failures() {
        let err = navigation_error(
            "https://no-such-host.invalid/",
            CdpError::ChromeMessage("net::ERR_NAME_NOT_RESOLVED".to_string()),
        );
        assert_eq!(err.kind(), FetchErrorKind::Network);
        assert!(err.to_string().contains("net::ERR_NAME_NOT_RESOLVED"));
    }

    #[test]
    fn test_other_navigation_errors_are_browser_failures() {
        let err = navigation_error("https://example.com/", CdpError::NoResponse);
        assert_eq!(err.kind(), FetchErrorKind::Browser);

        let err = navigation_error(
            "https://example.com/",
            CdpError::ChromeMessage("Cannot navigate to invalid URL".to_string()),
        );
        assert_eq!(err.kind(), FetchErrorKind::Browser);
    }

    #[test]
    fn test_only_protocol_errors_keep_polling() {
        let stale = CdpError::Chrome(chromiumoxide::types::Error {
            code: -32000,
            message: "Could not find node with given id".to_string(),
        });
        assert!(is_transient(&stale));

        assert!(!is_transient(&CdpError::NoResponse));
        assert!(!is_transient(&CdpError::Io(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "connection closed",
        ))));
    }
}
