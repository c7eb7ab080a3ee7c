//! Job page fetching with a two-tier strategy.
//!
//! Fast path: a plain HTTP GET with a browser-like user agent. Fallback: a headless
//! browser render, attempted only when the fast path produced no text. Both paths feed
//! the same extractor. `JobPageFetcher::fetch` never fails; it returns `None` instead.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, warn};

use crate::acquisition::extractor::extract_text;

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status {0}")]
    Status(u16),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("CDP error: {0}")]
    Cdp(#[from] chromiumoxide::error::CdpError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),
}

/// Settings for the fast HTTP path.
#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            user_agent: BROWSER_USER_AGENT.to_string(),
        }
    }
}

/// Something that can turn a URL into raw HTML.
///
/// `Ok(None)` means the source answered but had nothing to offer.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, url: &str) -> Result<Option<String>, FetchError>;
}

/// Plain HTTP GET. Non-2xx responses are errors.
pub struct HttpPageSource {
    client: Client,
}

impl HttpPageSource {
    pub fn new(settings: &FetchSettings) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(settings.user_agent.as_str())
            .timeout(settings.timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn load(&self, url: &str) -> Result<Option<String>, FetchError> {
        let response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let html = response.text().await?;
        Ok(Some(html))
    }
}

/// Retrieves the text of a job posting, falling back to a browser render when needed.
pub struct JobPageFetcher {
    fast: Arc<dyn PageSource>,
    fallback: Arc<dyn PageSource>,
}

impl JobPageFetcher {
    pub fn new(fast: Arc<dyn PageSource>, fallback: Arc<dyn PageSource>) -> Self {
        Self { fast, fallback }
    }

    pub async fn fetch(&self, url: &str) -> Option<String> {
        info!("Fetching job page with HTTP: {url}");
        if let Some(text) = Self::load_text(self.fast.as_ref(), url, "http").await {
            return Some(text);
        }

        info!("HTTP fetch returned nothing for {url}, falling back to headless browser");
        Self::load_text(self.fallback.as_ref(), url, "browser").await
    }

    async fn load_text(source: &dyn PageSource, url: &str, tier: &str) -> Option<String> {
        match source.load(url).await {
            Ok(Some(html)) => extract_text(&html).filter(|t| !t.trim().is_empty()),
            Ok(None) => None,
            Err(e) => {
                warn!(tier, "Failed to fetch {url}: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{header_regex, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Page source returning a canned response and counting calls.
    pub(crate) struct StubSource {
        html: Option<String>,
        fail: bool,
        pub(crate) calls: AtomicUsize,
    }

    impl StubSource {
        pub(crate) fn html(html: &str) -> Arc<Self> {
            Arc::new(Self {
                html: Some(html.to_string()),
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(Self {
                html: None,
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageSource for StubSource {
        async fn load(&self, _url: &str) -> Result<Option<String>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(FetchError::Status(503));
            }
            Ok(self.html.clone())
        }
    }

    const POSTING: &str =
        "<html><body><h1>Platform Engineer</h1><p>Rust, Kubernetes</p></body></html>";

    #[tokio::test]
    async fn test_fast_path_text_skips_fallback() {
        let fast = StubSource::html(POSTING);
        let fallback = StubSource::html("<body>should not be used</body>");
        let fetcher = JobPageFetcher::new(fast.clone(), fallback.clone());

        let text = fetcher.fetch("https://jobs.example/1").await;

        assert_eq!(text.as_deref(), Some("Platform Engineer Rust, Kubernetes"));
        assert_eq!(fast.calls(), 1);
        assert_eq!(fallback.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_fast_path_triggers_fallback() {
        let fast = StubSource::html("<html><body>   \n </body></html>");
        let fallback = StubSource::html(POSTING);
        let fetcher = JobPageFetcher::new(fast.clone(), fallback.clone());

        let text = fetcher.fetch("https://jobs.example/2").await;

        assert_eq!(text.as_deref(), Some("Platform Engineer Rust, Kubernetes"));
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_fast_path_error_triggers_fallback() {
        let fast = StubSource::failing();
        let fallback = StubSource::html(POSTING);
        let fetcher = JobPageFetcher::new(fast.clone(), fallback.clone());

        assert!(fetcher.fetch("https://jobs.example/3").await.is_some());
        assert_eq!(fast.calls(), 1);
        assert_eq!(fallback.calls(), 1);
    }

    #[tokio::test]
    async fn test_both_tiers_empty_is_none() {
        let fetcher = JobPageFetcher::new(
            StubSource::html("<html><body></body></html>"),
            StubSource::failing(),
        );
        assert_eq!(fetcher.fetch("https://jobs.example/4").await, None);
    }

    #[tokio::test]
    async fn test_http_source_sends_browser_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/jobs/42"))
            .and(header_regex("user-agent", r"^Mozilla/5\.0 .*Chrome/124"))
            .respond_with(ResponseTemplate::new(200).set_body_string(POSTING))
            .expect(1)
            .mount(&server)
            .await;

        let source = HttpPageSource::new(&FetchSettings::default()).unwrap();
        let html = source
            .load(&format!("{}/jobs/42", server.uri()))
            .await
            .unwrap();
        assert_eq!(html.as_deref(), Some(POSTING));
    }

    #[tokio::test]
    async fn test_http_source_rejects_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let source = HttpPageSource::new(&FetchSettings::default()).unwrap();
        let err = source.load(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Status(403)));
    }

    #[tokio::test]
    async fn test_http_source_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(POSTING)
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let settings = FetchSettings {
            timeout: Duration::from_millis(50),
            ..FetchSettings::default()
        };
        let source = HttpPageSource::new(&settings).unwrap();
        let err = source.load(&server.uri()).await.unwrap_err();
        assert!(matches!(err, FetchError::Http(e) if e.is_timeout()));
    }
}
