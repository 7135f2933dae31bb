// Analyzer catalogue: every check produces one AnalyzeResult per page

pub mod additional_call;
pub mod css_minification;
pub mod speed;

use crate::error::{EngineError, Result};
use crate::model::AnalyzeResult;
use async_trait::async_trait;
use rankone_scanner::PageRetrieval;
use scraper::{Html, Selector};

pub use additional_call::AdditionalCallAnalyzer;
pub use css_minification::CssMinificationAnalyzer;
pub use speed::{CompressionAnalyzer, MarkupSizeAnalyzer, ResponseTimeAnalyzer};

/// Check that works from retrieval data and may perform its own I/O.
#[async_trait]
pub trait PageAnalyzer: Send + Sync {
    fn title(&self) -> &'static str;

    async fn evaluate(&self, page: &PageRetrieval) -> Result<AnalyzeResult>;
}

/// Check that inspects the already parsed document of a page.
pub trait DocumentAnalyzer: Send + Sync {
    fn title(&self) -> &'static str;

    fn evaluate(&self, document: &Html, page_url: &str) -> Result<AnalyzeResult>;
}

/// Entry in the composite analyzer's registry.
pub enum Analyzer {
    Page(Box<dyn PageAnalyzer>),
    Document(Box<dyn DocumentAnalyzer>),
}

impl Analyzer {
    pub fn title(&self) -> &'static str {
        match self {
            Analyzer::Page(analyzer) => analyzer.title(),
            Analyzer::Document(analyzer) => analyzer.title(),
        }
    }
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| EngineError::AnalysisFailure(format!("bad selector '{}': {}", css, e)))
}
