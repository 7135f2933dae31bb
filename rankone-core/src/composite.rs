// Page-level analyzer running the whole catalogue against one retrieval

use crate::analyzers::{
    AdditionalCallAnalyzer, Analyzer, CompressionAnalyzer, CssMinificationAnalyzer,
    DocumentAnalyzer, MarkupSizeAnalyzer, PageAnalyzer, ResponseTimeAnalyzer,
};
use crate::model::{AnalyzeResult, Analysis};
use futures::future::join_all;
use rankone_scanner::{EncodingProbe, PageRetrieval};
use scraper::Html;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Ordered registry of analyzers. Every registered analyzer runs exactly once
/// per page and its result lands at its registration index.
#[derive(Default)]
pub struct CompositeAnalyzer {
    analyzers: Vec<Analyzer>,
}

impl CompositeAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The standard catalogue: response time, compression, markup size,
    /// additional calls, stylesheet minification.
    pub fn standard(probe: Arc<dyn EncodingProbe>) -> Self {
        Self::standard_with_timeout(probe, Duration::from_secs(10))
    }

    pub fn standard_with_timeout(probe: Arc<dyn EncodingProbe>, probe_timeout: Duration) -> Self {
        Self::new()
            .with_page_analyzer(ResponseTimeAnalyzer)
            .with_page_analyzer(CompressionAnalyzer::new(probe).with_timeout(probe_timeout))
            .with_page_analyzer(MarkupSizeAnalyzer)
            .with_document_analyzer(AdditionalCallAnalyzer)
            .with_document_analyzer(CssMinificationAnalyzer)
    }

    pub fn with_page_analyzer(mut self, analyzer: impl PageAnalyzer + 'static) -> Self {
        self.analyzers.push(Analyzer::Page(Box::new(analyzer)));
        self
    }

    pub fn with_document_analyzer(mut self, analyzer: impl DocumentAnalyzer + 'static) -> Self {
        self.analyzers.push(Analyzer::Document(Box::new(analyzer)));
        self
    }

    pub fn titles(&self) -> Vec<&'static str> {
        self.analyzers.iter().map(Analyzer::title).collect()
    }

    pub fn len(&self) -> usize {
        self.analyzers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.analyzers.is_empty()
    }

    /// Page analyzers run concurrently while the document is parsed and the
    /// document analyzers run; results are merged back in registration order.
    pub async fn analyze(&self, page: &PageRetrieval) -> Analysis {
        debug!("Analyzing {} with {} analyzers", page.url, self.analyzers.len());

        let page_checks = join_all(self.analyzers.iter().map(|analyzer| async move {
            match analyzer {
                Analyzer::Page(check) => Some(
                    check
                        .evaluate(page)
                        .await
                        .unwrap_or_else(|e| degrade(check.title(), e)),
                ),
                Analyzer::Document(_) => None,
            }
        }));

        // The parsed document never lives across an await point.
        let document_checks = async {
            let document = Html::parse_document(&page.html);
            self.analyzers
                .iter()
                .map(|analyzer| match analyzer {
                    Analyzer::Document(check) => Some(
                        check
                            .evaluate(&document, &page.url)
                            .unwrap_or_else(|e| degrade(check.title(), e)),
                    ),
                    Analyzer::Page(_) => None,
                })
                .collect::<Vec<_>>()
        };

        let (page_results, document_results) = tokio::join!(page_checks, document_checks);

        let results = page_results
            .into_iter()
            .zip(document_results)
            .filter_map(|(page_result, document_result)| page_result.or(document_result))
            .collect();

        Analysis { results }
    }
}

fn degrade(title: &str, error: impl std::fmt::Display) -> AnalyzeResult {
    warn!("Analyzer {} failed: {}", title, error);
    AnalyzeResult::failed(title, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, Result};
    use crate::model::{ResultRule, ResultType};
    use async_trait::async_trait;

    struct StaticProbe;

    #[async_trait]
    impl EncodingProbe for StaticProbe {
        async fn content_encoding(
            &self,
            _url: &str,
        ) -> rankone_scanner::error::Result<Option<String>> {
            Ok(Some("gzip".to_string()))
        }
    }

    struct SlowAnalyzer;

    #[async_trait]
    impl PageAnalyzer for SlowAnalyzer {
        fn title(&self) -> &'static str {
            "slow_title"
        }

        async fn evaluate(&self, _page: &PageRetrieval) -> Result<AnalyzeResult> {
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(AnalyzeResult::new(self.title()).with_rule(ResultRule::success("slow_done")))
        }
    }

    struct BrokenAnalyzer;

    impl DocumentAnalyzer for BrokenAnalyzer {
        fn title(&self) -> &'static str {
            "broken_title"
        }

        fn evaluate(&self, _document: &Html, _page_url: &str) -> Result<AnalyzeResult> {
            Err(EngineError::AnalysisFailure("cannot inspect".to_string()))
        }
    }

    fn page() -> PageRetrieval {
        PageRetrieval::new("https://example.com/".to_string())
            .with_html("<html><head><title>t</title></head><body></body></html>")
    }

    #[tokio::test]
    async fn test_standard_catalogue_order() {
        let composite = CompositeAnalyzer::standard(Arc::new(StaticProbe));
        let analysis = composite.analyze(&page()).await;

        let titles: Vec<_> = analysis.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "serverresponseanalyzer_title",
                "gzipanalyzer_title",
                "htmlsizeanalyzer_title",
                "additionalcallanalyzer_title",
                "cssminificationanalyzer_title",
            ]
        );
        assert_eq!(composite.titles(), titles);
        assert!(analysis.results.iter().all(|r| !r.result_rules.is_empty()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_order_survives_completion_order() {
        let composite = CompositeAnalyzer::new()
            .with_page_analyzer(SlowAnalyzer)
            .with_document_analyzer(CssMinificationAnalyzer)
            .with_page_analyzer(ResponseTimeAnalyzer);

        let analysis = composite.analyze(&page()).await;

        let titles: Vec<_> = analysis.results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "slow_title",
                "cssminificationanalyzer_title",
                "serverresponseanalyzer_title"
            ]
        );
    }

    #[tokio::test]
    async fn test_failing_analyzer_degrades_without_aborting() {
        let composite = CompositeAnalyzer::new()
            .with_document_analyzer(BrokenAnalyzer)
            .with_page_analyzer(MarkupSizeAnalyzer);

        let analysis = composite.analyze(&page()).await;

        assert_eq!(analysis.results.len(), 2);
        assert_eq!(analysis.results[0].title, "broken_title");
        assert_eq!(analysis.results[0].worst(), ResultType::Error);
        assert_eq!(analysis.results[0].result_rules[0].code, "analyzer_failed");
        assert_eq!(analysis.results[1].title, "htmlsizeanalyzer_title");
    }

    #[tokio::test]
    async fn test_empty_composite() {
        let composite = CompositeAnalyzer::new();
        assert!(composite.is_empty());

        let analysis = composite.analyze(&page()).await;
        assert!(analysis.results.is_empty());
    }
}
