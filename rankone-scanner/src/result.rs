use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Everything the analyzers need from one retrieval of a page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRetrieval {
    pub url: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub response_time: Duration,
    pub html: String,
}

impl PageRetrieval {
    pub fn new(url: String) -> Self {
        Self {
            url,
            status_code: 0,
            content_type: None,
            response_time: Duration::from_secs(0),
            html: String::new(),
        }
    }

    pub fn with_html(mut self, html: impl Into<String>) -> Self {
        self.html = html.into();
        self
    }

    pub fn with_response_time(mut self, response_time: Duration) -> Self {
        self.response_time = response_time;
        self
    }

    pub fn response_time_ms(&self) -> u128 {
        self.response_time.as_millis()
    }

    pub fn is_html(&self) -> bool {
        self.content_type
            .as_ref()
            .map(|ct| ct.contains("text/html"))
            .unwrap_or(false)
    }
}
