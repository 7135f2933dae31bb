// Score cache/update engine over a content tree

use crate::data::ReportStore;
use crate::error::{EngineError, Result};
use crate::model::{ContentNode, PageScore, ScoreNode, StoredReport};
use crate::serializer::ReportSerializer;
use crate::service::AnalysisService;
use futures::future::{BoxFuture, FutureExt};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

/// Called with the id and name of every node once its score is resolved.
pub type NodeCallback = Arc<dyn Fn(i64, &str) + Send + Sync>;

/// Mirrors a content forest into score nodes, either from stored reports
/// (`get_cached_scores`) or by recomputing nodes that already have one
/// (`update_scores`).
///
/// Every node is visited exactly once per call and the returned forest has
/// the shape of the input. Dropping an `update_scores` future cancels the
/// traversal between nodes; nothing is emitted for a node until it is fully
/// resolved. Store calls on the update path run on the blocking pool.
pub struct ScoreTree {
    store: Arc<dyn ReportStore>,
    serializer: Arc<dyn ReportSerializer>,
    service: Arc<dyn AnalysisService>,
    concurrency: usize,
    on_node: Option<NodeCallback>,
}

impl ScoreTree {
    pub fn new(
        store: Arc<dyn ReportStore>,
        serializer: Arc<dyn ReportSerializer>,
        service: Arc<dyn AnalysisService>,
    ) -> Self {
        Self {
            store,
            serializer,
            service,
            concurrency: 4,
            on_node: None,
        }
    }

    /// Maximum number of sibling nodes analyzed at once during an update.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_node_callback(mut self, callback: NodeCallback) -> Self {
        self.on_node = Some(callback);
        self
    }

    /// Read path: stored reports only, no network and no writes.
    pub fn get_cached_scores(&self, nodes: Option<&[ContentNode]>) -> Result<Vec<ScoreNode>> {
        let nodes = nodes.ok_or_else(missing_forest)?;
        nodes.iter().map(|node| self.cached_node(node)).collect()
    }

    fn cached_node(&self, node: &ContentNode) -> Result<ScoreNode> {
        let (score, failure) = match self.store.get_by_id(node.id)? {
            Some(report) => match self.serializer.deserialize(&report.report) {
                Ok(score) => (Some(score), None),
                Err(e) => {
                    let e = e.for_node(node.id);
                    warn!("{}", e);
                    (None, Some(e.to_string()))
                }
            },
            None => (None, None),
        };

        let children = node
            .children
            .iter()
            .map(|child| self.cached_node(child))
            .collect::<Result<Vec<_>>>()?;

        Ok(self.emit(node, score, failure, children))
    }

    /// Update path: recomputes every node that has a stored report. Nodes
    /// without one keep an absent score but their subtrees are still visited.
    /// At most `concurrency` analyses are in flight across the whole forest.
    pub async fn update_scores(&self, nodes: Option<&[ContentNode]>) -> Result<Vec<ScoreNode>> {
        let nodes = nodes.ok_or_else(missing_forest)?;
        info!("Updating scores for {} root node(s)", nodes.len());
        let permits = Semaphore::new(self.concurrency);
        self.update_forest(nodes, &permits).await
    }

    fn update_forest<'a>(
        &'a self,
        nodes: &'a [ContentNode],
        permits: &'a Semaphore,
    ) -> BoxFuture<'a, Result<Vec<ScoreNode>>> {
        let pending: Vec<_> = nodes
            .iter()
            .map(|node| self.update_node(node, permits))
            .collect();

        async move {
            stream::iter(pending)
                .buffered(self.concurrency)
                .try_collect::<Vec<_>>()
                .await
        }
        .boxed()
    }

    async fn update_node(&self, node: &ContentNode, permits: &Semaphore) -> Result<ScoreNode> {
        let (score, failure) = match self.lookup(node.id).await? {
            Some(_) => {
                let _permit = permits
                    .acquire()
                    .await
                    .map_err(|e| EngineError::AnalysisFailure(e.to_string()))?;

                // Focus keyword is not carried over from the stored report.
                match self.service.create_analysis(node, None).await {
                    Ok(page_analysis) => (Some(page_analysis.score), None),
                    Err(e) => {
                        warn!("Analysis of node {} failed: {}", node.id, e);
                        (None, Some(e.to_string()))
                    }
                }
            }
            None => {
                debug!("Node {} has no stored report, skipping analysis", node.id);
                (None, None)
            }
        };

        let children = self.update_forest(&node.children, permits).await?;

        Ok(self.emit(node, score, failure, children))
    }

    /// Store lookup off the async worker threads.
    async fn lookup(&self, node_id: i64) -> Result<Option<StoredReport>> {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || store.get_by_id(node_id))
            .await
            .map_err(|e| {
                EngineError::StoreUnavailable(format!("lookup for node {} aborted: {}", node_id, e))
            })?
    }

    fn emit(
        &self,
        node: &ContentNode,
        score: Option<PageScore>,
        failure: Option<String>,
        children: Vec<ScoreNode>,
    ) -> ScoreNode {
        if let Some(ref callback) = self.on_node {
            callback(node.id, &node.name);
        }

        ScoreNode {
            id: node.id,
            name: node.name.clone(),
            score,
            failure,
            children,
        }
    }
}

fn missing_forest() -> EngineError {
    EngineError::InvalidArgument("content node forest is required".to_string())
}
