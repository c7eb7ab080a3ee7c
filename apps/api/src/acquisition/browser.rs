//! Headless browser fallback for client-side rendered job pages.
//!
//! Every load launches its own Chromium process through CDP and tears it down before
//! returning. Sessions are never shared between requests.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::acquisition::page_fetcher::{FetchError, PageSource};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone)]
pub struct BrowserSettings {
    /// Chromium binary; auto-detected when `None`.
    pub chrome_executable: Option<PathBuf>,
    /// Upper bound on waiting for `document.readyState == "complete"`.
    pub ready_timeout: Duration,
    /// Extra wait after readiness for client-side rendering to settle.
    pub settle_delay: Duration,
    pub window_size: (u32, u32),
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            ready_timeout: Duration::from_secs(20),
            settle_delay: Duration::from_secs(2),
            window_size: (1920, 1080),
        }
    }
}

/// Renders pages in a fresh headless Chromium per call.
pub struct HeadlessPageSource {
    settings: BrowserSettings,
}

impl HeadlessPageSource {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl PageSource for HeadlessPageSource {
    async fn load(&self, url: &str) -> Result<Option<String>, FetchError> {
        let session = BrowserSession::launch(&self.settings).await?;
        let rendered = session.render(url, &self.settings).await;
        session.close().await;
        rendered
    }
}

/// One launched browser plus the task driving its CDP connection.
///
/// Always released through `close`; if the owning future is dropped first, `Drop`
/// stops the handler task and chromiumoxide kills the child process.
struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    async fn launch(settings: &BrowserSettings) -> Result<Self, FetchError> {
        let (width, height) = settings.window_size;
        let mut builder = BrowserConfig::builder().window_size(width, height);
        if let Some(path) = &settings.chrome_executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(FetchError::Browser)?;

        let (browser, mut events) = Browser::launch(config).await?;
        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    debug!("CDP handler event error: {e}");
                }
            }
        });

        debug!("Headless browser launched");
        Ok(Self { browser, handler })
    }

    /// Navigates to `url` and returns whatever HTML is available.
    ///
    /// A readiness timeout is not an error: the partially loaded page is still returned.
    async fn render(
        &self,
        url: &str,
        settings: &BrowserSettings,
    ) -> Result<Option<String>, FetchError> {
        let page = self.browser.new_page("about:blank").await?;

        match wait_until_ready(&page, url, settings.ready_timeout).await {
            Ok(()) => {
                info!("Page ready in headless browser: {url}");
                tokio::time::sleep(settings.settle_delay).await;
            }
            Err(FetchError::Timeout(waited)) => {
                warn!("Timed out after {waited:?} waiting for {url}; using partial content");
            }
            Err(e) => return Err(e),
        }

        let html = page.content().await?;
        Ok(Some(html).filter(|h| !h.trim().is_empty()))
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close headless browser cleanly: {e}");
        }
        if let Err(e) = self.browser.wait().await {
            warn!("Failed to reap headless browser process: {e}");
        }
        self.handler.abort();
        debug!("Headless browser closed");
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

async fn wait_until_ready(page: &Page, url: &str, limit: Duration) -> Result<(), FetchError> {
    let navigation = async {
        page.goto(url).await?;
        loop {
            let state: String = page
                .evaluate("document.readyState")
                .await?
                .into_value()
                .map_err(|e| FetchError::Browser(format!("unreadable readyState: {e}")))?;
            if state == "complete" {
                break;
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }
        Ok::<(), FetchError>(())
    };

    match tokio::time::timeout(limit, navigation).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_fallback_budget() {
        let settings = BrowserSettings::default();
        assert_eq!(settings.ready_timeout, Duration::from_secs(20));
        assert_eq!(settings.settle_delay, Duration::from_secs(2));
        assert_eq!(settings.window_size, (1920, 1080));
        assert!(settings.chrome_executable.is_none());
    }
}
