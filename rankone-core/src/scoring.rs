use crate::model::{Analysis, PageScore, ResultType};

fn weight(result_type: ResultType) -> f64 {
    match result_type {
        ResultType::Success => 1.0,
        ResultType::Warning => 0.5,
        ResultType::Error => 0.0,
    }
}

/// Overall 0..=100 score of an analysis: the mean rule weight scaled to 100.
/// An analysis without rules scores 0.
pub fn overall_score(analysis: &Analysis) -> u8 {
    let count = analysis.rule_count();
    if count == 0 {
        return 0;
    }

    let total: f64 = analysis.rules().map(|rule| weight(rule.result_type)).sum();
    (100.0 * total / count as f64).round().clamp(0.0, 100.0) as u8
}

pub fn score(analysis: Analysis) -> PageScore {
    PageScore {
        overall_score: overall_score(&analysis),
        analysis,
    }
}
