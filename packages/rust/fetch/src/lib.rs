//! HTTP fetching for docgrab.
//!
//! Every network read in the workspace goes through [`FetchClient`]. A fetch
//! never fails loudly: transport errors are retried with a linear backoff and
//! then reported as `None`, while any HTTP status (including 404 and 500) comes
//! back as a [`FetchResult`] for the caller to judge.

mod body;
mod headers;

use std::time::Duration;

use docgrab_shared::{DocgrabError, FetchConfig, Result};
use reqwest::Client;
use reqwest::header::ACCEPT_ENCODING;
use tracing::{debug, instrument, warn};

pub use body::{
    BodyKind, charset_from_content_type, classify, decode_bytes, looks_textlike, maybe_gunzip,
};
pub use headers::Headers;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 10;

/// Backoff unit; attempt `n` (zero-based) waits `BACKOFF_STEP * (n + 1)` before retrying.
const BACKOFF_STEP: Duration = Duration::from_millis(400);

// ---------------------------------------------------------------------------
// FetchResult
// ---------------------------------------------------------------------------

/// Outcome of a completed HTTP exchange.
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested.
    pub url: String,
    /// HTTP status code as returned by the server.
    pub status_code: u16,
    /// Response headers.
    pub headers: Headers,
    /// Body bytes, already gunzipped where applicable.
    pub body: Vec<u8>,
    /// Text/binary classification of the body.
    pub kind: BodyKind,
}

impl FetchResult {
    /// Build a result, classifying the body from its headers and leading bytes.
    pub fn new(url: impl Into<String>, status_code: u16, headers: Headers, body: Vec<u8>) -> Self {
        let kind = classify(&headers, &body);
        Self {
            url: url.into(),
            status_code,
            headers,
            body,
            kind,
        }
    }

    /// `200` with a non-empty body.
    pub fn is_ok(&self) -> bool {
        self.status_code == 200 && !self.body.is_empty()
    }

    pub fn is_text(&self) -> bool {
        self.kind == BodyKind::Text
    }

    /// `Content-Type` header, or `""`.
    pub fn content_type(&self) -> &str {
        self.headers.content_type()
    }

    /// Decode the body using the declared charset (UTF-8 lossy fallback).
    pub fn decode(&self) -> String {
        decode_bytes(&self.body, self.content_type())
    }

    /// Decoded body for textual responses, `None` for binary ones.
    pub fn text(&self) -> Option<String> {
        self.is_text().then(|| self.decode())
    }
}

// ---------------------------------------------------------------------------
// FetchClient
// ---------------------------------------------------------------------------

/// Shared HTTP client with the docgrab retry policy.
#[derive(Debug, Clone)]
pub struct FetchClient {
    client: Client,
    config: FetchConfig,
}

impl FetchClient {
    /// Build the underlying connection pool once per run.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()
            .map_err(|e| DocgrabError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    /// Fetch with the configured timeout and retry count.
    pub async fn fetch(&self, url: &str) -> Option<FetchResult> {
        self.fetch_with(url, self.config.timeout, self.config.retries)
            .await
    }

    /// Fetch with an explicit timeout and retry count.
    ///
    /// Returns `None` only after `retries + 1` transport failures (or for a URL
    /// that cannot be requested at all).
    #[instrument(skip(self, timeout))]
    pub async fn fetch_with(
        &self,
        url: &str,
        timeout: Duration,
        retries: u32,
    ) -> Option<FetchResult> {
        if let Err(e) = reqwest::Url::parse(url) {
            warn!(error = %e, "not a fetchable URL");
            return None;
        }

        for attempt in 0..=retries {
            match self.attempt(url, timeout).await {
                Ok(result) => {
                    debug!(status = result.status_code, bytes = result.body.len(), "fetched");
                    return Some(result);
                }
                Err(e) => {
                    debug!(attempt, error = %e, "fetch attempt failed");
                    if attempt < retries {
                        tokio::time::sleep(BACKOFF_STEP * (attempt + 1)).await;
                    }
                }
            }
        }

        warn!(attempts = retries + 1, "giving up");
        None
    }

    async fn attempt(&self, url: &str, timeout: Duration) -> Result<FetchResult> {
        let response = self
            .client
            .get(url)
            .header(ACCEPT_ENCODING, "gzip")
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| DocgrabError::Network(format!("{url}: {e}")))?;

        let status_code = response.status().as_u16();
        let headers = Headers::from(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|e| DocgrabError::Network(format!("{url}: reading body: {e}")))?;

        let body = maybe_gunzip(url, &headers, body.to_vec());
        Ok(FetchResult::new(url, status_code, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::time::Instant;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client(retries: u32) -> FetchClient {
        FetchClient::new(FetchConfig {
            timeout: Duration::from_millis(300),
            retries,
            user_agent: "docgrab-test".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn fetch_returns_text_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<h1>Docs</h1>", "text/html; charset=utf-8"),
            )
            .mount(&server)
            .await;

        let result = client(0)
            .fetch(&format!("{}/docs", server.uri()))
            .await
            .expect("fetch");
        assert!(result.is_ok());
        assert!(result.is_text());
        assert_eq!(result.text().as_deref(), Some("<h1>Docs</h1>"));
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(2)
            .fetch(&format!("{}/missing", server.uri()))
            .await
            .expect("404 still yields a result");
        assert_eq!(result.status_code, 404);
        assert!(!result.is_ok());
    }

    #[tokio::test]
    async fn timeouts_are_retried_then_give_up() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .expect(3)
            .mount(&server)
            .await;

        let started = Instant::now();
        let result = client(2).fetch(&format!("{}/slow", server.uri())).await;
        assert!(result.is_none());
        // two backoff pauses: 400ms + 800ms
        assert!(started.elapsed() >= Duration::from_millis(1200));
    }

    #[tokio::test]
    async fn gzip_body_is_inflated() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"# llms.txt").unwrap();
        let gz = encoder.finish().unwrap();

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/llms.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-encoding", "gzip")
                    .set_body_raw(gz, "text/plain"),
            )
            .mount(&server)
            .await;

        let result = client(0)
            .fetch(&format!("{}/llms.txt", server.uri()))
            .await
            .expect("fetch");
        assert_eq!(result.body, b"# llms.txt");
    }

    #[tokio::test]
    async fn binary_body_is_classified() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/logo.png"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![0x89, b'P', b'N', b'G', 0, 0, 0, 13], "image/png"),
            )
            .mount(&server)
            .await;

        let result = client(0)
            .fetch(&format!("{}/logo.png", server.uri()))
            .await
            .expect("fetch");
        assert_eq!(result.kind, BodyKind::Binary);
        assert!(result.text().is_none());
    }

    #[tokio::test]
    async fn latin1_charset_is_honoured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cafe"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(b"caf\xe9".to_vec(), "text/plain; charset=iso-8859-1"),
            )
            .mount(&server)
            .await;

        let result = client(0)
            .fetch(&format!("{}/cafe", server.uri()))
            .await
            .expect("fetch");
        assert_eq!(result.decode(), "café");
    }

    #[tokio::test]
    async fn unparseable_url_is_none() {
        assert!(client(2).fetch("not a url").await.is_none());
    }
}
