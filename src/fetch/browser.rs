//! Driven-browser fetch strategy.
//!
//! Some hosts serve their tables only to clients that execute page
//! scripts, and fingerprint plain HTTP clients aggressively. This
//! strategy drives a real headless Chrome through a WebDriver endpoint
//! (chromedriver, selenium-standalone): navigate, wait for the document
//! body to exist, give deferred scripts a settle period, then read the
//! fully rendered source.
//!
//! Every fetch owns a fresh WebDriver session for its whole duration and
//! closes it on success and failure alike; a leaked session is a leaked
//! Chrome process.

use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder, Locator};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument, warn};

use super::{FetchError, FetchStrategy, USER_AGENT};

/// Bounded wait for the document body to appear after navigation.
const BODY_WAIT: Duration = Duration::from_secs(10);
/// Settle period for deferred script execution once the body exists.
const SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Fetch strategy backed by a WebDriver-driven headless Chrome.
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    webdriver_url: String,
}

impl BrowserFetcher {
    /// Create a fetcher that starts sessions against `webdriver_url`.
    pub fn new(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: webdriver_url.into(),
        }
    }

    /// Verify the WebDriver endpoint can hand out a session at all, so
    /// the run can degrade to direct HTTP with a single warning instead
    /// of failing once per page.
    pub async fn probe(&self) -> Result<(), FetchError> {
        let client = self.connect().await?;
        client.close().await?;
        Ok(())
    }

    async fn connect(&self) -> Result<Client, FetchError> {
        let mut builder = ClientBuilder::rustls()
            .map_err(|e| FetchError::Browser(format!("tls setup failed: {e}")))?;
        builder.capabilities(self.capabilities());
        Ok(builder.connect(&self.webdriver_url).await?)
    }

    /// Headless Chrome capabilities with automation fingerprints
    /// suppressed and the same user agent the HTTP strategy sends.
    fn capabilities(&self) -> Capabilities {
        let mut caps = Capabilities::new();
        caps.insert(
            "goog:chromeOptions".to_string(),
            serde_json::json!({
                "args": [
                    "--headless",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-blink-features=AutomationControlled",
                    format!("user-agent={USER_AGENT}"),
                ],
            }),
        );
        caps
    }
}

impl FetchStrategy for BrowserFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let client = self.connect().await?;
        let result = render(&client, url).await;
        if let Err(e) = client.close().await {
            warn!(error = %e, "Failed to close browser session cleanly");
        }
        result
    }
}

async fn render(client: &Client, url: &str) -> Result<String, FetchError> {
    client.goto(url).await?;
    client
        .wait()
        .at_most(BODY_WAIT)
        .for_element(Locator::Css("body"))
        .await?;
    sleep(SETTLE_DELAY).await;

    let source = client.source().await?;
    debug!(bytes = source.len(), "Read rendered page source");
    Ok(source)
}
