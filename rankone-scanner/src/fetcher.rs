use crate::error::{Result, ScanError};
use crate::result::PageRetrieval;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use url::Url;

pub const USER_AGENT: &str = "RankOne/0.1 (page analysis)";

/// Retrieves pages for analysis, timing the server response.
pub struct PageFetcher {
    client: Client,
    timeout_secs: u64,
}

impl PageFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(10)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            timeout_secs,
        })
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub async fn fetch(&self, url: &str) -> Result<PageRetrieval> {
        let parsed = Url::parse(url).map_err(|e| ScanError::InvalidUrl(format!("{}: {}", url, e)))?;
        debug!("Fetching {}", parsed);

        let start = Instant::now();
        let response = self
            .client
            .get(parsed.as_str())
            .send()
            .await
            .map_err(|e| ScanError::from_request(url, e))?;
        let response_time = start.elapsed();

        let status_code = response.status().as_u16();
        if !response.status().is_success() {
            return Err(ScanError::StatusError {
                url: url.to_string(),
                status: status_code,
            });
        }

        let content_type = header_value(&response, CONTENT_TYPE);

        let html = response
            .text()
            .await
            .map_err(|e| ScanError::from_request(url, e))?;

        info!(
            "Fetched {} ({} chars in {} ms)",
            url,
            html.len(),
            response_time.as_millis()
        );

        let mut page = PageRetrieval::new(url.to_string());
        page.status_code = status_code;
        page.content_type = content_type;
        page.response_time = response_time;
        page.html = html;
        Ok(page)
    }
}

pub(crate) fn header_value(
    response: &reqwest::Response,
    name: reqwest::header::HeaderName,
) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[tokio::test]
    async fn test_fetch_returns_html_and_metadata() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html; charset=utf-8")
                    .set_body_bytes(b"<html><body>Hello</body></html>".as_slice()),
            )
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let url = format!("{}/page", mock_server.uri());
        let page = fetcher.fetch(&url).await.unwrap();

        assert_eq!(page.url, url);
        assert_eq!(page.status_code, 200);
        assert!(page.is_html());
        assert_eq!(page.html, "<html><body>Hello</body></html>");
    }

    #[tokio::test]
    async fn test_fetch_rejects_error_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::new().unwrap();
        let result = fetcher
            .fetch(&format!("{}/missing", mock_server.uri()))
            .await;

        assert!(matches!(
            result,
            Err(ScanError::StatusError { status: 404, .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_rejects_invalid_url() {
        let fetcher = PageFetcher::new().unwrap();
        let result = fetcher.fetch("not a url").await;

        assert!(matches!(result, Err(ScanError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_times_out() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/slow"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&mock_server)
            .await;

        let fetcher = PageFetcher::with_timeout(1).unwrap();
        let result = fetcher.fetch(&format!("{}/slow", mock_server.uri())).await;

        assert!(matches!(result, Err(ScanError::Timeout(_))));
    }
}
