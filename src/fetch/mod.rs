//! Resilient page acquisition.
//!
//! Both source sites deploy anti-scraping defenses, so every page goes
//! through one cache-aside primitive instead of a bare HTTP GET:
//!
//! 1. **Cache first**: a previously fetched body is returned immediately,
//!    with no network activity and no pacing delay.
//! 2. **Pacing**: before any network fetch, sleep a random duration from
//!    a configured window to keep the request rate human-shaped.
//! 3. **Strategy selection**: hosts that fingerprint plain clients get
//!    the driven-browser strategy first; on failure (or when no browser
//!    is available) the direct-HTTP strategy is the fallback.
//! 4. **Classification**: a 403/429 from the host is terminal for the
//!    whole run; any other failure skips the one document.
//!
//! The two strategies are interchangeable implementations of
//! [`FetchStrategy`]: one capability, two implementors, and the
//! fallback composed explicitly in [`ResilientFetcher`] at the call
//! site.

use rand::{rng, Rng};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn};
use url::Url;

pub mod browser;
pub mod cache;
pub mod error;
pub mod http;

pub use browser::BrowserFetcher;
pub use cache::PageCache;
pub use error::FetchError;
pub use http::DirectHttpFetcher;

use crate::utils::truncate_for_log;

/// User agent presented by both strategies.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// One way of retrieving the document behind a URL.
pub trait FetchStrategy {
    /// Retrieve the document at `url`, failing with a classified
    /// [`FetchError`] on any transport, timeout, or status failure.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

/// Configuration for the fetch orchestrator, passed in explicitly so the
/// orchestrator stays testable with injected strategies and a zero-width
/// pacing window.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// Lower bound of the random pacing delay before a network fetch.
    pub min_delay: Duration,
    /// Upper bound of the random pacing delay.
    pub max_delay: Duration,
    /// Hosts that get the driven-browser strategy first. Subdomains of a
    /// listed host match too.
    pub browser_hosts: Vec<String>,
}

impl FetchConfig {
    pub fn new(min_delay: Duration, max_delay: Duration, browser_hosts: Vec<String>) -> Self {
        assert!(min_delay <= max_delay, "pacing window is inverted");
        Self {
            min_delay,
            max_delay,
            browser_hosts,
        }
    }

    /// Whether `url` belongs to a host routed through the browser first.
    fn wants_browser(&self, url: &str) -> bool {
        let Some(host) = Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_owned))
        else {
            return false;
        };
        self.browser_hosts
            .iter()
            .any(|h| host == *h || host.ends_with(&format!(".{h}")))
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(8),
            max_delay: Duration::from_secs(15),
            browser_hosts: vec!["fbref.com".to_string()],
        }
    }
}

/// Cache-aside fetch coordinator over a browser strategy `B` and an
/// HTTP strategy `H`.
#[derive(Debug)]
pub struct ResilientFetcher<B, H> {
    browser: Option<B>,
    http: H,
    config: FetchConfig,
}

impl<B, H> ResilientFetcher<B, H>
where
    B: FetchStrategy,
    H: FetchStrategy,
{
    pub fn new(browser: Option<B>, http: H, config: FetchConfig) -> Self {
        Self {
            browser,
            http,
            config,
        }
    }

    /// Resolve `url` to a document body.
    ///
    /// Returns `Ok(Some(body))` on success (cached or fetched),
    /// `Ok(None)` when this one document failed transiently and the
    /// caller should skip it, and `Err` only for terminal failures that
    /// must abort the run.
    #[instrument(level = "info", skip_all, fields(%url, key))]
    pub async fn resolve(
        &self,
        url: &str,
        cache: &PageCache,
        key: &str,
        force_refresh: bool,
    ) -> Result<Option<String>, FetchError> {
        if !force_refresh {
            if let Some(body) = cache.read(key).await {
                info!(key, "Cache hit");
                return Ok(Some(body));
            }
        }

        info!(%url, "Fetching from network");
        self.pace().await;

        if let Some(browser) = &self.browser {
            if self.config.wants_browser(url) {
                match browser.fetch(url).await {
                    Ok(body) => {
                        self.persist(cache, key, &body).await;
                        return Ok(Some(body));
                    }
                    Err(e) => {
                        warn!(error = %e, %url, "Browser fetch failed; falling back to direct HTTP");
                    }
                }
            }
        }

        match self.http.fetch(url).await {
            Ok(body) => {
                self.persist(cache, key, &body).await;
                Ok(Some(body))
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(error = %e, %url, "Fetch failed; skipping this document");
                Ok(None)
            }
        }
    }

    /// Random delay drawn uniformly from the configured pacing window.
    async fn pace(&self) {
        if self.config.max_delay.is_zero() {
            return;
        }
        let wait_secs = rng().random_range(
            self.config.min_delay.as_secs_f64()..=self.config.max_delay.as_secs_f64(),
        );
        info!(wait_secs, "Pacing before network fetch");
        sleep(Duration::from_secs_f64(wait_secs)).await;
    }

    async fn persist(&self, cache: &PageCache, key: &str, body: &str) {
        debug!(key, preview = %truncate_for_log(body, 120), "Fetched document");
        if let Err(e) = cache.write(key, body).await {
            warn!(key, error = %e, "Failed to persist page to cache; continuing with fetched body");
        } else {
            info!(key, "Cache entry saved");
        }
    }
}
