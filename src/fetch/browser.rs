//! Rendered fetch on top of a controllable browser
//!
//! The browser is reached only through [`BrowserLauncher`] and
//! [`BrowserSession`]. A session is wrapped in a [`SessionGuard`] the moment
//! it is launched, so it is closed on every exit path: success, an early
//! `?` return, or unwinding.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{parse_target_url, Fetcher, PageContent, ReadinessCondition};
use crate::error::FetchError;

/// One live browser with one page
pub trait BrowserSession {
    fn navigate(&mut self, url: &str) -> Result<(), FetchError>;

    /// Block until `condition` holds or `timeout` elapses.
    /// Returns `Ok(false)` on timeout.
    fn wait_until(
        &mut self,
        condition: &ReadinessCondition,
        timeout: Duration,
    ) -> Result<bool, FetchError>;

    /// Serialized markup of the current document
    fn current_content(&mut self) -> Result<String, FetchError>;

    /// Terminate the browser. Must be safe to call once per session.
    fn close(&mut self) -> Result<(), FetchError>;
}

/// Starts browser sessions
pub trait BrowserLauncher {
    type Session: BrowserSession;

    fn launch(&self) -> Result<Self::Session, FetchError>;
}

/// Closes the wrapped session exactly once
pub struct SessionGuard<S: BrowserSession> {
    session: S,
    closed: bool,
}

impl<S: BrowserSession> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    /// Close now and report the outcome instead of logging it from `Drop`
    pub fn release(mut self) -> Result<(), FetchError> {
        self.closed = true;
        self.session.close()
    }
}

impl<S: BrowserSession> Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: BrowserSession> DerefMut for SessionGuard<S> {
    fn deref_mut(&mut self) -> &mut S {
        &mut self.session
    }
}

impl<S: BrowserSession> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        debug!("Closing browser session on early exit");
        if let Err(e) = self.session.close() {
            warn!("Failed to close browser session: {}", e);
        }
    }
}

/// Loads a page in a browser, waits for it to render, captures the markup
pub struct RenderedFetcher<L: BrowserLauncher> {
    launcher: L,
    ready: ReadinessCondition,
    timeout: Duration,
}

impl<L: BrowserLauncher> RenderedFetcher<L> {
    pub fn new(launcher: L, ready: ReadinessCondition, timeout: Duration) -> Self {
        Self {
            launcher,
            ready,
            timeout,
        }
    }
}

impl<L: BrowserLauncher> Fetcher for RenderedFetcher<L> {
    fn fetch(&self, url: &str) -> Result<PageContent, FetchError> {
        let target = parse_target_url(url)?;

        let mut session = SessionGuard::new(self.launcher.launch()?);
        info!("Rendering {}", target);
        session.navigate(target.as_str())?;

        if !session.wait_until(&self.ready, self.timeout)? {
            return Err(FetchError::Timeout {
                url: url.to_string(),
                waited: self.timeout,
            });
        }

        let markup = session.current_content()?;
        if let Err(e) = session.release() {
            warn!("Browser did not shut down cleanly after {}: {}", target, e);
        }

        debug!("Captured {} bytes of rendered markup", markup.len());
        Ok(PageContent::new(target, markup))
    }
}
