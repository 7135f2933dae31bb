// Analysis service: the single entry point that recomputes a page score

use crate::composite::CompositeAnalyzer;
use crate::data::ReportStore;
use crate::error::{EngineError, Result};
use crate::model::{ContentNode, PageAnalysis, StoredReport};
use crate::scoring;
use crate::serializer::ReportSerializer;
use async_trait::async_trait;
use rankone_scanner::PageFetcher;
use std::sync::Arc;
use tracing::info;

#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn create_analysis(
        &self,
        node: &ContentNode,
        focus_keyword: Option<&str>,
    ) -> Result<PageAnalysis>;
}

/// Fetches a node's page, runs the composite analyzer over it, scores the
/// result and replaces the node's stored report.
pub struct AnalyzeService {
    fetcher: PageFetcher,
    analyzer: CompositeAnalyzer,
    store: Arc<dyn ReportStore>,
    serializer: Arc<dyn ReportSerializer>,
}

impl AnalyzeService {
    pub fn new(
        fetcher: PageFetcher,
        analyzer: CompositeAnalyzer,
        store: Arc<dyn ReportStore>,
        serializer: Arc<dyn ReportSerializer>,
    ) -> Self {
        Self {
            fetcher,
            analyzer,
            store,
            serializer,
        }
    }
}

#[async_trait]
impl AnalysisService for AnalyzeService {
    async fn create_analysis(
        &self,
        node: &ContentNode,
        focus_keyword: Option<&str>,
    ) -> Result<PageAnalysis> {
        let url = node.url.as_deref().ok_or_else(|| {
            EngineError::InvalidArgument(format!("node {} has no published url", node.id))
        })?;

        let page = self.fetcher.fetch(url).await?;
        let analysis = self.analyzer.analyze(&page).await;
        let score = scoring::score(analysis);

        info!(
            "Node {} ({}) scored {}",
            node.id, node.name, score.overall_score
        );

        let report = StoredReport {
            node_id: node.id,
            focus_keyword: focus_keyword.map(String::from),
            report: self.serializer.serialize(&score)?,
        };
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.save(&report))
            .await
            .map_err(|e| {
                EngineError::StoreUnavailable(format!("save for node {} aborted: {}", node.id, e))
            })??;

        Ok(PageAnalysis {
            focus_keyword: focus_keyword.map(String::from),
            score,
        })
    }
}
