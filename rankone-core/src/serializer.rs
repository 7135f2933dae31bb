use crate::error::{EngineError, Result};
use crate::model::PageScore;

/// Converts page scores to and from the opaque payload kept in the report store.
pub trait ReportSerializer: Send + Sync {
    fn serialize(&self, score: &PageScore) -> Result<String>;

    fn deserialize(&self, payload: &str) -> Result<PageScore>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonReportSerializer;

impl ReportSerializer for JsonReportSerializer {
    fn serialize(&self, score: &PageScore) -> Result<String> {
        serde_json::to_string(score).map_err(|e| EngineError::serialization(e.to_string()))
    }

    fn deserialize(&self, payload: &str) -> Result<PageScore> {
        if payload.trim().is_empty() {
            return Err(EngineError::serialization("empty report payload"));
        }
        serde_json::from_str(payload).map_err(|e| EngineError::serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{AnalyzeResult, Analysis, ResultRule};

    #[test]
    fn test_round_trip_keeps_score_and_analysis() {
        let score = PageScore {
            overall_score: 75,
            analysis: Analysis {
                results: vec![
                    AnalyzeResult::new("htmlsizeanalyzer_title").with_rule(
                        ResultRule::warning("htmlsizeanalyzer_html_size_too_large")
                            .with_token("40.2 KB"),
                    ),
                ],
            },
        };

        let serializer = JsonReportSerializer;
        let payload = serializer.serialize(&score).unwrap();
        assert_eq!(serializer.deserialize(&payload).unwrap(), score);
    }

    #[test]
    fn test_payload_shape() {
        let score = PageScore {
            overall_score: 10,
            analysis: Analysis {
                results: vec![AnalyzeResult::new("a").with_rule(ResultRule::error("b"))],
            },
        };

        let value: serde_json::Value =
            serde_json::from_str(&JsonReportSerializer.serialize(&score).unwrap()).unwrap();
        assert_eq!(value["overall_score"], 10);
        assert_eq!(value["analysis"]["results"][0]["result_rules"][0]["type"], "error");
    }

    #[test]
    fn test_empty_payload_is_serialization_failure() {
        let result = JsonReportSerializer.deserialize("");
        assert!(matches!(
            result,
            Err(EngineError::SerializationFailure { .. })
        ));
    }

    #[test]
    fn test_malformed_payload_is_serialization_failure() {
        let result = JsonReportSerializer.deserialize("{\"overall_score\": \"high\"}");
        assert!(matches!(
            result,
            Err(EngineError::SerializationFailure { .. })
        ));
    }
}
