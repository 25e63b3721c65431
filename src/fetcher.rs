//! Outbound HTTP with a fixed desktop-browser identity.
//!
//! The upstream pages serve different (or blocking) markup to clients that do
//! not look like a Chromium-based browser, so every request carries the same
//! static header bundle. Two clients are kept:
//!
//! - a follow client for page fetches (at most 5 redirect hops, 2xx only)
//! - a manual client for redirect probes, which never follows `Location` and
//!   accepts any 2xx or 3xx status
//!
//! All network awaits race the caller's [`CancellationToken`].

use std::future::Future;
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Client, StatusCode, redirect};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::FetchError;

const MAX_REDIRECTS: usize = 5;

/// Browser fingerprint sent with every request.
pub const BROWSER_HEADERS: [(&str, &str); 4] = [
    (
        "sec-ch-ua",
        "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Microsoft Edge\";v=\"120\"",
    ),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    (
        "user-agent",
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 Edg/120.0.0.0",
    ),
];

/// Timeouts applied to both clients.
#[derive(Debug, Clone, Copy)]
pub struct FetchTimeouts {
    pub connect: Duration,
    pub request: Duration,
}

impl Default for FetchTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            request: Duration::from_secs(30),
        }
    }
}

/// A fetched response: status, headers and (for GET) the decoded body.
#[derive(Debug, Clone)]
pub struct Fetched {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl Fetched {
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
            .filter(|location| !location.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    follow: Client,
    manual: Client,
}

impl Fetcher {
    pub fn new(timeouts: FetchTimeouts) -> Result<Self, FetchError> {
        let follow = build_client(timeouts, redirect::Policy::limited(MAX_REDIRECTS))?;
        let manual = build_client(timeouts, redirect::Policy::none())?;
        Ok(Self { follow, manual })
    }

    /// GET a page, following redirects. Non-2xx is an error.
    pub async fn get(&self, url: &str, cancel: &CancellationToken) -> Result<Fetched, FetchError> {
        debug!(url, "GET");
        let response = cancellable(cancel, self.follow.get(url).send())
            .await?
            .map_err(|source| request_error(url, source))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let headers = response.headers().clone();
        let body = cancellable(cancel, response.text())
            .await?
            .map_err(|source| request_error(url, source))?;

        Ok(Fetched {
            status,
            headers,
            body,
        })
    }

    /// HEAD a URL without following redirects, so a 3xx `Location` can be
    /// read without touching the destination. Only 2xx and 3xx succeed.
    pub async fn probe(&self, url: &str, cancel: &CancellationToken) -> Result<Fetched, FetchError> {
        debug!(url, "HEAD (manual redirect)");
        let response = cancellable(cancel, self.manual.head(url).send())
            .await?
            .map_err(|source| request_error(url, source))?;

        let status = response.status();
        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        Ok(Fetched {
            status,
            headers: response.headers().clone(),
            body: String::new(),
        })
    }
}

/// The static header bundle as a [`HeaderMap`].
pub fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(BROWSER_HEADERS.len());
    for (name, value) in BROWSER_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

fn build_client(timeouts: FetchTimeouts, policy: redirect::Policy) -> Result<Client, FetchError> {
    Client::builder()
        .default_headers(browser_headers())
        .connect_timeout(timeouts.connect)
        .timeout(timeouts.request)
        .redirect(policy)
        .build()
        .map_err(FetchError::Client)
}

async fn cancellable<F: Future>(cancel: &CancellationToken, fut: F) -> Result<F::Output, FetchError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FetchError::Cancelled),
        out = fut => Ok(out),
    }
}

fn request_error(url: &str, source: reqwest::Error) -> FetchError {
    FetchError::Request {
        url: url.to_string(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::USER_AGENT;

    #[test]
    fn test_header_bundle_is_complete() {
        let headers = browser_headers();
        assert_eq!(headers.len(), 4);
        assert!(headers.contains_key(USER_AGENT));
        assert_eq!(headers["sec-ch-ua-mobile"], "?0");
        assert_eq!(headers["sec-ch-ua-platform"], "\"Windows\"");
        assert!(
            headers["sec-ch-ua"]
                .to_str()
                .unwrap()
                .contains("\"Chromium\";v=\"120\"")
        );
    }

    #[test]
    fn test_user_agent_impersonates_edge() {
        let headers = browser_headers();
        let ua = headers[USER_AGENT].to_str().unwrap();
        assert!(ua.contains("Edg/120.0.0.0"));
    }

    #[test]
    fn test_empty_location_treated_as_absent() {
        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static(""));
        let fetched = Fetched {
            status: StatusCode::FOUND,
            headers,
            body: String::new(),
        };
        assert_eq!(fetched.location(), None);

        let mut headers = HeaderMap::new();
        headers.insert(LOCATION, HeaderValue::from_static("https://cdn.example/x"));
        let fetched = Fetched {
            status: StatusCode::FOUND,
            headers,
            body: String::new(),
        };
        assert_eq!(fetched.location(), Some("https://cdn.example/x"));
    }

    #[test]
    fn test_fetcher_builds_with_default_timeouts() {
        assert!(Fetcher::new(FetchTimeouts::default()).is_ok());
    }

    #[tokio::test]
    async fn test_cancelled_token_short_circuits() {
        let fetcher = Fetcher::new(FetchTimeouts::default()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();
        // Unroutable address: would hang on connect if the token were ignored.
        let err = fetcher
            .get("http://10.255.255.1/never", &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
    }
}
