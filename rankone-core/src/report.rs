// Report rendering for analyses and score trees

use crate::model::{AnalyzeResult, PageScore, ResultRule, ResultType, ScoreNode};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n";

/// English message templates keyed by rule or title code. `{0}`, `{1}`, ...
/// are replaced by the rule's tokens.
const MESSAGES: &[(&str, &str)] = &[
    ("serverresponseanalyzer_title", "Server response"),
    ("serverresponseanalyzer_responsetime", "The server responded in {0} ms"),
    ("gzipanalyzer_title", "Compression"),
    ("gzipanalyzer_gzip_enabled", "Gzip compression is enabled"),
    ("gzipanalyzer_gzip_disabled", "Gzip compression is not enabled"),
    ("gzipanalyzer_probe_failed", "Compression could not be checked: {0}"),
    ("htmlsizeanalyzer_title", "HTML size"),
    ("htmlsizeanalyzer_html_size_small", "The HTML is {0}, below the 33 KB limit"),
    ("htmlsizeanalyzer_html_size_too_large", "The HTML is {0}, above the 33 KB limit"),
    ("additionalcallanalyzer_title", "Additional requests"),
    (
        "additionalcallanalyzer_requests_ok",
        "{0} additional requests ({1} stylesheets, {2} scripts, {3} images)",
    ),
    (
        "additionalcallanalyzer_too_many_requests",
        "Too many additional requests: {0} ({1} stylesheets, {2} scripts, {3} images)",
    ),
    ("additionalcallanalyzer_no_external_requests", "No requests leave the page's origin"),
    ("additionalcallanalyzer_external_requests", "{0} requests go to other hosts"),
    ("cssminificationanalyzer_title", "CSS minification"),
    ("cssminificationanalyzer_no_stylesheets", "The page uses no stylesheets"),
    ("cssminificationanalyzer_all_minified", "All stylesheets are minified"),
    ("cssminificationanalyzer_not_minified", "Stylesheet {0} is not minified"),
    (
        "cssminificationanalyzer_inline_not_minified",
        "An inline style block spans {0} lines and is not minified",
    ),
    ("analyzer_failed", "The check could not run: {0}"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }
}

/// Looks up the template for `code` and interpolates `tokens`. Unknown codes
/// render as the code followed by its tokens.
pub fn describe(code: &str, tokens: &[String]) -> String {
    match MESSAGES.iter().find(|(key, _)| *key == code) {
        Some((_, template)) => tokens
            .iter()
            .enumerate()
            .fold(template.to_string(), |message, (i, token)| {
                message.replace(&format!("{{{}}}", i), token)
            }),
        None if tokens.is_empty() => code.to_string(),
        None => format!("{} ({})", code, tokens.join(", ")),
    }
}

pub fn describe_rule(rule: &ResultRule) -> String {
    describe(&rule.code, &rule.tokens)
}

fn indicator(result_type: ResultType) -> &'static str {
    match result_type {
        ResultType::Success => "✓",
        ResultType::Warning => "⚠",
        ResultType::Error => "✗",
    }
}

fn push_result(report: &mut String, result: &AnalyzeResult) {
    report.push_str(&format!(
        "{} {}\n",
        indicator(result.worst()),
        describe(&result.title, &[])
    ));
    for rule in &result.result_rules {
        report.push_str(&format!(
            "    [{}] {}\n",
            rule.result_type.as_str().to_uppercase(),
            describe_rule(rule)
        ));
    }
}

pub fn generate_analysis_text_report(url: &str, score: &PageScore) -> String {
    let analysis = &score.analysis;
    let mut report = String::new();

    report.push_str(RULE);
    report.push_str("                          RANKONE PAGE ANALYSIS\n");
    report.push_str(RULE);
    report.push('\n');

    report.push_str(&format!("URL:            {}\n", url));
    report.push_str(&format!("Overall score:  {}/100\n", score.overall_score));
    report.push_str(&format!(
        "Rules:          {} passed, {} warnings, {} errors\n\n",
        analysis.count_of(ResultType::Success),
        analysis.count_of(ResultType::Warning),
        analysis.count_of(ResultType::Error)
    ));

    report.push_str(RULE);
    report.push_str("CHECKS\n");
    report.push_str(RULE);
    report.push('\n');

    for result in &analysis.results {
        push_result(&mut report, result);
    }

    report.push('\n');
    report
}

pub fn generate_tree_text_report(nodes: &[ScoreNode]) -> String {
    if nodes.is_empty() {
        return "  (empty)\n".to_string();
    }

    let mut report = String::new();
    for (i, node) in nodes.iter().enumerate() {
        push_tree_node(&mut report, node, "", i == nodes.len() - 1);
    }
    report
}

fn push_tree_node(report: &mut String, node: &ScoreNode, prefix: &str, is_last: bool) {
    let branch = if is_last { "└── " } else { "├── " };
    let status = match (&node.score, &node.failure) {
        (Some(score), _) => format!("{}/100", score.overall_score),
        (None, Some(failure)) => format!("✗ {}", failure),
        (None, None) => "not analyzed".to_string(),
    };

    report.push_str(&format!(
        "{}{}{} (#{})  [{}]\n",
        prefix, branch, node.name, node.id, status
    ));

    let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
    for (i, child) in node.children.iter().enumerate() {
        push_tree_node(report, child, &child_prefix, i == node.children.len() - 1);
    }
}

pub fn generate_json_report<T: Serialize>(kind: &str, body: &T) -> Result<String, serde_json::Error> {
    let json_report = serde_json::json!({
        "report": {
            "metadata": {
                "generator": "RankOne",
                "version": env!("CARGO_PKG_VERSION"),
                "generated_at": chrono::Utc::now().to_rfc3339(),
                "kind": kind,
            },
            "body": body,
        }
    });

    serde_json::to_string_pretty(&json_report)
}

pub fn save_report(content: &str, path: &Path) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(content.as_bytes())?;
    Ok(())
}
