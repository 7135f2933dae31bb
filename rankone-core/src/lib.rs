pub mod analyzers;
pub mod composite;
pub mod data;
pub mod error;
pub mod model;
pub mod report;
pub mod scoring;
pub mod serializer;
pub mod service;
pub mod tree;

pub use composite::CompositeAnalyzer;
pub use data::{Database, ReportStore};
pub use error::{EngineError, Result};
pub use serializer::{JsonReportSerializer, ReportSerializer};
pub use service::{AnalysisService, AnalyzeService};
pub use tree::ScoreTree;
