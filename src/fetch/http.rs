//! Direct-HTTP fetch strategy.
//!
//! Issues a single GET carrying a realistic browser header set. This is
//! the fallback strategy when the driven browser is unavailable or
//! fails, and the primary strategy for hosts that do not require script
//! execution.
//!
//! # Status classification
//!
//! A 403 or 429 response means the host has flagged the crawl itself,
//! not the one request. Those are classified as terminal
//! ([`FetchError::Blocked`] / [`FetchError::RateLimited`]) so the run
//! stops instead of digging the hole deeper. Every other non-success
//! status is a transient per-document failure.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::StatusCode;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use super::{FetchError, FetchStrategy, USER_AGENT};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetch strategy that speaks plain HTTP through a shared [`reqwest::Client`].
#[derive(Debug)]
pub struct DirectHttpFetcher {
    client: reqwest::Client,
}

impl DirectHttpFetcher {
    /// Build the fetcher with its browser-like default header set.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .default_headers(browser_headers())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

impl FetchStrategy for DirectHttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut request = self.client.get(url);
        if let Some(referer) = same_site_referer(url) {
            request = request.header(header::REFERER, referer);
        }

        let response = request.send().await?;
        let status = response.status();
        debug!(%status, "Received HTTP response");

        if status == StatusCode::FORBIDDEN {
            return Err(FetchError::Blocked);
        }
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited);
        }
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.text().await?)
    }
}

/// Header set mimicking an interactive Chrome session.
fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
        ),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("en-US,en;q=0.9"),
    );
    headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    headers.insert("dnt", HeaderValue::from_static("1"));
    headers.insert(
        "upgrade-insecure-requests",
        HeaderValue::from_static("1"),
    );
    headers.insert("sec-fetch-dest", HeaderValue::from_static("document"));
    headers.insert("sec-fetch-mode", HeaderValue::from_static("navigate"));
    headers.insert("sec-fetch-site", HeaderValue::from_static("none"));
    headers.insert("sec-fetch-user", HeaderValue::from_static("?1"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("max-age=0"),
    );
    headers
}

/// Referer for navigation within a site: the URL's origin root, sent for
/// any non-root path.
fn same_site_referer(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();
    if path.is_empty() || path == "/" {
        return None;
    }
    let host = parsed.host_str()?;
    match parsed.port() {
        Some(port) => Some(format!("{}://{}:{}/", parsed.scheme(), host, port)),
        None => Some(format!("{}://{}/", parsed.scheme(), host)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_referer_for_deep_link() {
        assert_eq!(
            same_site_referer("https://fbref.com/en/squads/18bb7c10/Arsenal-Stats").as_deref(),
            Some("https://fbref.com/")
        );
    }

    #[test]
    fn test_no_referer_for_site_root() {
        assert_eq!(same_site_referer("https://fbref.com/"), None);
        assert_eq!(same_site_referer("not a url"), None);
    }

    /// Serve exactly one canned HTTP response on a local port.
    fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 4096];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {status_line}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = stream.write_all(response.as_bytes());
            }
        });
        format!("http://{addr}/page")
    }

    #[tokio::test]
    async fn test_success_returns_body() {
        let url = serve_once("200 OK", "roster page");
        let fetcher = DirectHttpFetcher::new().unwrap();
        assert_eq!(fetcher.fetch(&url).await.unwrap(), "roster page");
    }

    #[tokio::test]
    async fn test_forbidden_classified_as_blocked() {
        let url = serve_once("403 Forbidden", "");
        let fetcher = DirectHttpFetcher::new().unwrap();
        assert!(matches!(fetcher.fetch(&url).await, Err(FetchError::Blocked)));
    }

    #[tokio::test]
    async fn test_too_many_requests_classified_as_rate_limited() {
        let url = serve_once("429 Too Many Requests", "");
        let fetcher = DirectHttpFetcher::new().unwrap();
        assert!(matches!(
            fetcher.fetch(&url).await,
            Err(FetchError::RateLimited)
        ));
    }

    #[tokio::test]
    async fn test_server_error_is_transient() {
        let url = serve_once("500 Internal Server Error", "");
        let fetcher = DirectHttpFetcher::new().unwrap();
        match fetcher.fetch(&url).await {
            Err(e) => assert!(!e.is_fatal()),
            Ok(_) => panic!("expected an error status"),
        }
    }
}
