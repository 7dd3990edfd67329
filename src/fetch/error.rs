//! Failure taxonomy for the acquisition layer.
//!
//! Fetch failures fall into two classes:
//!
//! - **Terminal**: the host has identified us as an automated client and
//!   is blocking ([`FetchError::Blocked`]) or rate limiting
//!   ([`FetchError::RateLimited`]) the whole run. Continuing would deepen
//!   the block, so these abort the crawl.
//! - **Transient**: everything else (timeouts, connection resets, other
//!   HTTP error statuses, a wedged browser session). The orchestrator
//!   skips the one document and moves on.

use thiserror::Error;

/// Error returned by fetch strategies and the fetch orchestrator.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The host answered HTTP 403: automated requests are being blocked.
    #[error("blocked by server (HTTP 403): the host is refusing automated requests")]
    Blocked,

    /// The host answered HTTP 429: we are sending requests too fast.
    #[error("rate limited by server (HTTP 429): too many requests")]
    RateLimited,

    /// Any other non-success HTTP status.
    #[error("server returned HTTP {0}")]
    Status(reqwest::StatusCode),

    /// Transport-level failure: DNS, connect, timeout, body read.
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The driven-browser session failed. WebDriver errors are carried
    /// as text so callers never depend on driver internals.
    #[error("browser automation failed: {0}")]
    Browser(String),
}

impl FetchError {
    /// Whether this failure must terminate the entire run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FetchError::Blocked | FetchError::RateLimited)
    }
}

impl From<fantoccini::error::NewSessionError> for FetchError {
    fn from(e: fantoccini::error::NewSessionError) -> Self {
        FetchError::Browser(e.to_string())
    }
}

impl From<fantoccini::error::CmdError> for FetchError {
    fn from(e: fantoccini::error::CmdError) -> Self {
        FetchError::Browser(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_and_rate_limit_are_fatal() {
        assert!(FetchError::Blocked.is_fatal());
        assert!(FetchError::RateLimited.is_fatal());
    }

    #[test]
    fn test_other_failures_are_transient() {
        assert!(!FetchError::Status(reqwest::StatusCode::INTERNAL_SERVER_ERROR).is_fatal());
        assert!(!FetchError::Browser("session wedged".to_string()).is_fatal());
    }
}
