//! Page retrieval

use std::time::Duration;

use tracing::debug;
use ureq::ResponseExt;

use crate::error::FetchError;

/// Browser-like identification sent with every request
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/122.0 Safari/537.36";

/// Largest response body read before giving up
///
/// Well above the 10 MiB ureq default so oversized pages still get extracted.
pub const MAX_BODY_BYTES: u64 = 100 * 1024 * 1024;

/// Body and final location of a fetched page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    pub body: String,
    /// URL after following redirects
    pub final_url: String,
}

/// Something that can retrieve a page by URL
pub trait Fetch {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError>;
}

/// Blocking HTTP fetcher (ureq)
///
/// Follows redirects, treats any non-2xx status as an error and never retries.
/// Bodies are decoded using the charset declared in `Content-Type`.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    agent: ureq::Agent,
}

impl HttpFetcher {
    pub fn new() -> Self {
        let agent = ureq::Agent::new_with_config(
            ureq::Agent::config_builder()
                .user_agent(USER_AGENT)
                .http_status_as_error(true)
                .build(),
        );
        Self { agent }
    }
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, url: &str, timeout: Duration) -> Result<FetchedPage, FetchError> {
        debug!(url, timeout_secs = timeout.as_secs(), "fetching");

        let mut response = self
            .agent
            .get(url)
            .config()
            .timeout_global(Some(timeout))
            .build()
            .call()
            .map_err(|e| map_ureq_error(url, e))?;

        let final_url = response.get_uri().to_string();
        let body = response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .lossy_utf8(true)
            .read_to_string()
            .map_err(|e| match map_ureq_error(url, e) {
                FetchError::Transport { url, message } => FetchError::Body { url, message },
                other => other,
            })?;

        debug!(url, final_url = %final_url, bytes = body.len(), "fetched");
        Ok(FetchedPage { body, final_url })
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> FetchError {
    match err {
        ureq::Error::StatusCode(code) => FetchError::Status {
            code,
            url: url.to_string(),
        },
        ureq::Error::Timeout(_) => FetchError::Timeout { url: url.to_string() },
        other => FetchError::Transport {
            url: url.to_string(),
            message: other.to_string(),
        },
    }
}
