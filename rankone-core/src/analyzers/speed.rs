// Speed checks: server response time, transfer compression and markup weight

use super::PageAnalyzer;
use crate::error::{EngineError, Result};
use crate::model::{AnalyzeResult, ResultRule, ResultType};
use async_trait::async_trait;
use rankone_scanner::{EncodingProbe, PageRetrieval};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

pub const MARKUP_SIZE_LIMIT: usize = 33 * 1024;

const SIZE_SUFFIXES: [&str; 9] = ["bytes", "KB", "MB", "GB", "TB", "PB", "EB", "ZB", "YB"];

/// Reports the measured server response time. Informational only.
pub struct ResponseTimeAnalyzer;

#[async_trait]
impl PageAnalyzer for ResponseTimeAnalyzer {
    fn title(&self) -> &'static str {
        "serverresponseanalyzer_title"
    }

    async fn evaluate(&self, page: &PageRetrieval) -> Result<AnalyzeResult> {
        Ok(AnalyzeResult::new(self.title()).with_rule(
            ResultRule::success("serverresponseanalyzer_responsetime")
                .with_token(page.response_time_ms()),
        ))
    }
}

/// Re-requests the page asking for compressed transfer and checks that the
/// server answered with gzip.
pub struct CompressionAnalyzer {
    probe: Arc<dyn EncodingProbe>,
    timeout: Duration,
}

impl CompressionAnalyzer {
    pub fn new(probe: Arc<dyn EncodingProbe>) -> Self {
        Self {
            probe,
            timeout: Duration::from_secs(10),
        }
    }

    /// Upper bound on the probe, on top of whatever the probe enforces itself.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub fn classify_encoding(encoding: Option<&str>) -> ResultRule {
    match encoding {
        Some("gzip") => ResultRule::success("gzipanalyzer_gzip_enabled"),
        _ => ResultRule::error("gzipanalyzer_gzip_disabled"),
    }
}

#[async_trait]
impl PageAnalyzer for CompressionAnalyzer {
    fn title(&self) -> &'static str {
        "gzipanalyzer_title"
    }

    async fn evaluate(&self, page: &PageRetrieval) -> Result<AnalyzeResult> {
        let outcome = tokio::time::timeout(self.timeout, self.probe.content_encoding(&page.url)).await;

        let rule = match outcome {
            Ok(Ok(encoding)) => {
                debug!("{} negotiated encoding {:?}", page.url, encoding);
                classify_encoding(encoding.as_deref())
            }
            Ok(Err(e)) => {
                let failure = EngineError::ProbeFailure(e.to_string());
                warn!("{} ({})", failure, page.url);
                ResultRule::error("gzipanalyzer_probe_failed").with_token(failure)
            }
            Err(_) => {
                warn!(
                    "Compression probe for {} exceeded {} ms",
                    page.url,
                    self.timeout.as_millis()
                );
                ResultRule::error("gzipanalyzer_probe_failed")
                    .with_token(format!("timed out after {} ms", self.timeout.as_millis()))
            }
        };

        Ok(AnalyzeResult::new(self.title()).with_rule(rule))
    }
}

/// Flags pages whose markup is heavier than 33 KB, estimated at two bytes per
/// UTF-16 code unit.
pub struct MarkupSizeAnalyzer;

pub fn estimated_byte_count(html: &str) -> usize {
    html.encode_utf16().count() * 2
}

pub fn classify_markup_size(byte_count: usize) -> ResultType {
    if byte_count < MARKUP_SIZE_LIMIT {
        ResultType::Success
    } else {
        ResultType::Warning
    }
}

/// Formats a byte count with a power-of-1024 suffix and one decimal place.
/// No digit grouping is applied, so 1023 bytes renders as `1023.0 bytes`.
pub fn size_suffix(value: i64) -> String {
    if value < 0 {
        return format!("-{}", format_magnitude(value.unsigned_abs()));
    }
    format_magnitude(value as u64)
}

fn format_magnitude(value: u64) -> String {
    if value == 0 {
        return format!("0.0 {}", SIZE_SUFFIXES[0]);
    }

    let mut mag = 0;
    while mag + 1 < SIZE_SUFFIXES.len() && (mag + 1) * 10 < 64 && value >> ((mag + 1) * 10) > 0 {
        mag += 1;
    }

    let adjusted = value as f64 / (1u128 << (mag * 10)) as f64;
    format!("{:.1} {}", adjusted, SIZE_SUFFIXES[mag])
}

#[async_trait]
impl PageAnalyzer for MarkupSizeAnalyzer {
    fn title(&self) -> &'static str {
        "htmlsizeanalyzer_title"
    }

    async fn evaluate(&self, page: &PageRetrieval) -> Result<AnalyzeResult> {
        let byte_count = estimated_byte_count(&page.html);
        let rule = match classify_markup_size(byte_count) {
            ResultType::Success => ResultRule::success("htmlsizeanalyzer_html_size_small"),
            _ => ResultRule::warning("htmlsizeanalyzer_html_size_too_large"),
        };

        Ok(AnalyzeResult::new(self.title())
            .with_rule(rule.with_token(size_suffix(byte_count as i64))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rankone_scanner::ScanError;

    struct FixedProbe(Option<&'static str>);

    #[async_trait]
    impl EncodingProbe for FixedProbe {
        async fn content_encoding(&self, _url: &str) -> rankone_scanner::error::Result<Option<String>> {
            Ok(self.0.map(String::from))
        }
    }

    struct FailingProbe;

    #[async_trait]
    impl EncodingProbe for FailingProbe {
        async fn content_encoding(&self, url: &str) -> rankone_scanner::error::Result<Option<String>> {
            Err(ScanError::Timeout(url.to_string()))
        }
    }

    struct HangingProbe;

    #[async_trait]
    impl EncodingProbe for HangingProbe {
        async fn content_encoding(&self, _url: &str) -> rankone_scanner::error::Result<Option<String>> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(Some("gzip".to_string()))
        }
    }

    fn page(html: &str) -> PageRetrieval {
        PageRetrieval::new("http://example.com/".to_string()).with_html(html)
    }

    #[test]
    fn test_size_suffix() {
        assert_eq!(size_suffix(0), "0.0 bytes");
        assert_eq!(size_suffix(1), "1.0 bytes");
        assert_eq!(size_suffix(1023), "1023.0 bytes");
        assert_eq!(size_suffix(1024), "1.0 KB");
        assert_eq!(size_suffix(1536), "1.5 KB");
        assert_eq!(size_suffix(33 * 1024), "33.0 KB");
        assert_eq!(size_suffix(1024 * 1024), "1.0 MB");
        assert_eq!(size_suffix(5 * 1024 * 1024 * 1024), "5.0 GB");
    }

    #[test]
    fn test_size_suffix_negative() {
        assert_eq!(size_suffix(-1024), "-1.0 KB");
        assert_eq!(size_suffix(-2), "-2.0 bytes");
    }

    #[test]
    fn test_markup_size_boundary() {
        assert_eq!(classify_markup_size(33 * 1024 - 1), ResultType::Success);
        assert_eq!(classify_markup_size(33 * 1024), ResultType::Warning);
    }

    #[test]
    fn test_estimated_byte_count_is_two_per_unit() {
        assert_eq!(estimated_byte_count(""), 0);
        assert_eq!(estimated_byte_count("abc"), 6);
        // U+1F600 needs a surrogate pair
        assert_eq!(estimated_byte_count("\u{1F600}"), 4);
    }

    #[test]
    fn test_classify_encoding() {
        assert_eq!(classify_encoding(Some("gzip")).result_type, ResultType::Success);
        assert_eq!(classify_encoding(Some("deflate")).result_type, ResultType::Error);
        assert_eq!(classify_encoding(Some("br")).result_type, ResultType::Error);
        assert_eq!(classify_encoding(None).result_type, ResultType::Error);
    }

    #[tokio::test]
    async fn test_response_time_reports_milliseconds() {
        let page = page("").with_response_time(Duration::from_millis(250));
        let result = ResponseTimeAnalyzer.evaluate(&page).await.unwrap();

        assert_eq!(result.title, "serverresponseanalyzer_title");
        assert_eq!(result.result_rules.len(), 1);
        assert_eq!(result.result_rules[0].result_type, ResultType::Success);
        assert_eq!(result.result_rules[0].tokens, vec!["250".to_string()]);
    }

    #[tokio::test]
    async fn test_markup_size_small_page() {
        let result = MarkupSizeAnalyzer.evaluate(&page("<html></html>")).await.unwrap();

        let rule = &result.result_rules[0];
        assert_eq!(rule.code, "htmlsizeanalyzer_html_size_small");
        assert_eq!(rule.result_type, ResultType::Success);
        assert_eq!(rule.tokens, vec!["26.0 bytes".to_string()]);
    }

    #[tokio::test]
    async fn test_markup_size_large_page() {
        let html = "a".repeat(MARKUP_SIZE_LIMIT / 2);
        let result = MarkupSizeAnalyzer.evaluate(&page(&html)).await.unwrap();

        let rule = &result.result_rules[0];
        assert_eq!(rule.code, "htmlsizeanalyzer_html_size_too_large");
        assert_eq!(rule.result_type, ResultType::Warning);
        assert_eq!(rule.tokens, vec!["33.0 KB".to_string()]);
    }

    #[tokio::test]
    async fn test_compression_gzip_enabled() {
        let analyzer = CompressionAnalyzer::new(Arc::new(FixedProbe(Some("gzip"))));
        let result = analyzer.evaluate(&page("")).await.unwrap();

        assert_eq!(result.title, "gzipanalyzer_title");
        assert_eq!(result.result_rules[0].code, "gzipanalyzer_gzip_enabled");
        assert_eq!(result.result_rules[0].result_type, ResultType::Success);
    }

    #[tokio::test]
    async fn test_compression_other_encodings_are_errors() {
        for encoding in [Some("deflate"), Some("br"), None] {
            let analyzer = CompressionAnalyzer::new(Arc::new(FixedProbe(encoding)));
            let result = analyzer.evaluate(&page("")).await.unwrap();

            assert_eq!(result.result_rules[0].code, "gzipanalyzer_gzip_disabled");
            assert_eq!(result.result_rules[0].result_type, ResultType::Error);
        }
    }

    #[tokio::test]
    async fn test_compression_probe_failure_degrades() {
        let analyzer = CompressionAnalyzer::new(Arc::new(FailingProbe));
        let result = analyzer.evaluate(&page("")).await.unwrap();

        assert_eq!(result.result_rules.len(), 1);
        assert_eq!(result.result_rules[0].code, "gzipanalyzer_probe_failed");
        assert_eq!(result.result_rules[0].result_type, ResultType::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_compression_probe_is_bounded() {
        let analyzer = CompressionAnalyzer::new(Arc::new(HangingProbe))
            .with_timeout(Duration::from_secs(5));
        let result = analyzer.evaluate(&page("")).await.unwrap();

        assert_eq!(result.result_rules[0].code, "gzipanalyzer_probe_failed");
        assert_eq!(
            result.result_rules[0].tokens,
            vec!["timed out after 5000 ms".to_string()]
        );
    }
}
