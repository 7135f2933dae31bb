use serde::{Deserialize, Serialize};

/// Outcome of a single rule. Variants are declared in ascending severity so the
/// derived ordering gives Error > Warning > Success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultType {
    Success,
    Warning,
    Error,
}

impl ResultType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResultType::Success => "success",
            ResultType::Warning => "warning",
            ResultType::Error => "error",
        }
    }
}

/// One atomic check outcome. `code` names the message template, `tokens` are
/// its interpolation arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRule {
    pub code: String,
    #[serde(rename = "type")]
    pub result_type: ResultType,
    #[serde(default)]
    pub tokens: Vec<String>,
}

impl ResultRule {
    pub fn new(code: impl Into<String>, result_type: ResultType) -> Self {
        Self {
            code: code.into(),
            result_type,
            tokens: Vec::new(),
        }
    }

    pub fn success(code: impl Into<String>) -> Self {
        Self::new(code, ResultType::Success)
    }

    pub fn warning(code: impl Into<String>) -> Self {
        Self::new(code, ResultType::Warning)
    }

    pub fn error(code: impl Into<String>) -> Self {
        Self::new(code, ResultType::Error)
    }

    pub fn with_token(mut self, token: impl ToString) -> Self {
        self.tokens.push(token.to_string());
        self
    }
}

/// Output of one analyzer. Rules keep evaluation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResult {
    pub title: String,
    #[serde(default)]
    pub result_rules: Vec<ResultRule>,
}

impl AnalyzeResult {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            result_rules: Vec::new(),
        }
    }

    /// Result standing in for an analyzer that could not complete.
    pub fn failed(title: impl Into<String>, reason: impl ToString) -> Self {
        let mut result = Self::new(title);
        result.add_rule(ResultRule::error("analyzer_failed").with_token(reason));
        result
    }

    pub fn add_rule(&mut self, rule: ResultRule) {
        self.result_rules.push(rule);
    }

    pub fn with_rule(mut self, rule: ResultRule) -> Self {
        self.add_rule(rule);
        self
    }

    /// Most severe outcome among the rules, Success when there are none.
    pub fn worst(&self) -> ResultType {
        self.result_rules
            .iter()
            .map(|r| r.result_type)
            .max()
            .unwrap_or(ResultType::Success)
    }
}

/// Full evaluation of one page, in analyzer registration order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Analysis {
    #[serde(default)]
    pub results: Vec<AnalyzeResult>,
}

impl Analysis {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, result: AnalyzeResult) {
        self.results.push(result);
    }

    pub fn rules(&self) -> impl Iterator<Item = &ResultRule> {
        self.results.iter().flat_map(|r| r.result_rules.iter())
    }

    pub fn rule_count(&self) -> usize {
        self.rules().count()
    }

    pub fn count_of(&self, result_type: ResultType) -> usize {
        self.rules().filter(|r| r.result_type == result_type).count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageScore {
    pub overall_score: u8,
    pub analysis: Analysis,
}

/// What the analysis service hands back for one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageAnalysis {
    pub focus_keyword: Option<String>,
    pub score: PageScore,
}

/// Persisted result of a prior analysis, keyed by content node id.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredReport {
    pub node_id: i64,
    pub focus_keyword: Option<String>,
    pub report: String,
}

/// Node of the content tree being scored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub id: i64,
    pub name: String,
    /// Rendering template, carried through but not consulted when scoring.
    #[serde(default)]
    pub template_id: Option<i64>,
    /// Absolute URL the node is published at.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub children: Vec<ContentNode>,
}

impl ContentNode {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_template(mut self, template_id: i64) -> Self {
        self.template_id = Some(template_id);
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_child(mut self, child: ContentNode) -> Self {
        self.children.push(child);
        self
    }
}

/// Scored mirror of a content node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreNode {
    pub id: i64,
    pub name: String,
    pub score: Option<PageScore>,
    /// Set when a score could not be produced for a node that should have one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    pub children: Vec<ScoreNode>,
}

impl ScoreNode {
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(ScoreNode::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_type_severity_order() {
        assert!(ResultType::Error > ResultType::Warning);
        assert!(ResultType::Warning > ResultType::Success);
    }

    #[test]
    fn test_worst_rule() {
        let result = AnalyzeResult::new("title")
            .with_rule(ResultRule::success("a"))
            .with_rule(ResultRule::error("b"))
            .with_rule(ResultRule::warning("c"));

        assert_eq!(result.worst(), ResultType::Error);
        assert_eq!(AnalyzeResult::new("empty").worst(), ResultType::Success);
    }

    #[test]
    fn test_rules_keep_insertion_order() {
        let result = AnalyzeResult::new("title")
            .with_rule(ResultRule::warning("first"))
            .with_rule(ResultRule::success("second"));

        let codes: Vec<_> = result.result_rules.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["first", "second"]);
    }

    #[test]
    fn test_analysis_counts() {
        let mut analysis = Analysis::new();
        analysis.push(AnalyzeResult::new("one").with_rule(ResultRule::success("a")));
        analysis.push(
            AnalyzeResult::new("two")
                .with_rule(ResultRule::warning("b"))
                .with_rule(ResultRule::success("c")),
        );

        assert_eq!(analysis.rule_count(), 3);
        assert_eq!(analysis.count_of(ResultType::Success), 2);
        assert_eq!(analysis.count_of(ResultType::Error), 0);
    }

    #[test]
    fn test_failed_result_carries_reason() {
        let result = AnalyzeResult::failed("gzipanalyzer_title", "boom");

        assert_eq!(result.result_rules.len(), 1);
        assert_eq!(result.result_rules[0].code, "analyzer_failed");
        assert_eq!(result.result_rules[0].tokens, vec!["boom".to_string()]);
    }

    #[test]
    fn test_score_node_count() {
        let node = ScoreNode {
            id: 1,
            name: "root".to_string(),
            score: None,
            failure: None,
            children: vec![ScoreNode {
                id: 2,
                name: "child".to_string(),
                score: None,
                failure: None,
                children: Vec::new(),
            }],
        };

        assert_eq!(node.count(), 2);
    }
}
