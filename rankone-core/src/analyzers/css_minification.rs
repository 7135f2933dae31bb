// Stylesheet minification heuristics

use super::{DocumentAnalyzer, selector};
use crate::error::Result;
use crate::model::{AnalyzeResult, ResultRule};
use scraper::Html;
use url::Url;

/// Inline blocks with more lines than this are candidates for the heuristic.
const MIN_LINES: usize = 5;
/// Minified CSS packs many declarations per line.
const MIN_AVERAGE_LINE_LENGTH: usize = 200;

pub struct CssMinificationAnalyzer;

/// A linked stylesheet counts as minified when its file name carries `.min.`.
pub fn is_minified_href(href: &str) -> bool {
    let path = Url::parse(href)
        .or_else(|_| Url::parse("http://localhost/").and_then(|base| base.join(href)))
        .map(|url| url.path().to_string())
        .unwrap_or_else(|_| href.to_string());

    path.rsplit('/')
        .next()
        .map(|file| file.to_lowercase().contains(".min."))
        .unwrap_or(false)
}

/// Returns the number of non-blank lines when the inline CSS looks hand-formatted.
pub fn unminified_line_count(css: &str) -> Option<usize> {
    let lines: Vec<&str> = css.lines().map(str::trim).filter(|l| !l.is_empty()).collect();
    if lines.len() <= MIN_LINES {
        return None;
    }

    let average = lines.iter().map(|l| l.len()).sum::<usize>() / lines.len();
    (average < MIN_AVERAGE_LINE_LENGTH).then_some(lines.len())
}

impl DocumentAnalyzer for CssMinificationAnalyzer {
    fn title(&self) -> &'static str {
        "cssminificationanalyzer_title"
    }

    fn evaluate(&self, document: &Html, _page_url: &str) -> Result<AnalyzeResult> {
        let link_selector = selector("link[rel~=stylesheet][href]")?;
        let style_selector = selector("style")?;

        let hrefs: Vec<&str> = document
            .select(&link_selector)
            .filter_map(|element| element.value().attr("href"))
            .collect();
        let inline_blocks: Vec<String> = document
            .select(&style_selector)
            .map(|element| element.text().collect::<String>())
            .collect();

        let mut result = AnalyzeResult::new(self.title());

        if hrefs.is_empty() && inline_blocks.is_empty() {
            result.add_rule(ResultRule::success("cssminificationanalyzer_no_stylesheets"));
            return Ok(result);
        }

        for href in hrefs.iter().filter(|href| !is_minified_href(href)) {
            result.add_rule(
                ResultRule::warning("cssminificationanalyzer_not_minified").with_token(href),
            );
        }

        for lines in inline_blocks.iter().filter_map(|css| unminified_line_count(css)) {
            result.add_rule(
                ResultRule::warning("cssminificationanalyzer_inline_not_minified")
                    .with_token(lines),
            );
        }

        if result.result_rules.is_empty() {
            result.add_rule(ResultRule::success("cssminificationanalyzer_all_minified"));
        }

        Ok(result)
    }
}
