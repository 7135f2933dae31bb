// Transfer-encoding probe used by the compression check

use crate::error::{Result, ScanError};
use crate::fetcher::{USER_AGENT, header_value};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{ACCEPT_ENCODING, CONTENT_ENCODING};
use std::time::Duration;
use tracing::debug;

pub const PROBE_ACCEPT_ENCODING: &str = "gzip,deflate";

/// Issues an independent request for a URL asking for compressed transfer and
/// reports the `Content-Encoding` the server negotiated.
#[async_trait]
pub trait EncodingProbe: Send + Sync {
    async fn content_encoding(&self, url: &str) -> Result<Option<String>>;
}

pub struct HttpEncodingProbe {
    client: Client,
}

impl HttpEncodingProbe {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(10))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        // Decoding must stay off or reqwest strips the Content-Encoding header.
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .no_gzip()
            .no_deflate()
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl EncodingProbe for HttpEncodingProbe {
    async fn content_encoding(&self, url: &str) -> Result<Option<String>> {
        debug!("Probing transfer encoding of {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT_ENCODING, PROBE_ACCEPT_ENCODING)
            .send()
            .await
            .map_err(|e| ScanError::from_request(url, e))?;

        if !response.status().is_success() {
            return Err(ScanError::StatusError {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(header_value(&response, CONTENT_ENCODING))
    }
}
