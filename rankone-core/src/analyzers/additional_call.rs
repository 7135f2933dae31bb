// Counts the extra requests a browser makes to render the page

use super::{DocumentAnalyzer, selector};
use crate::error::Result;
use crate::model::{AnalyzeResult, ResultRule};
use scraper::{Html, Selector};
use url::Url;

pub const MAX_ADDITIONAL_CALLS: usize = 30;

/// Reference schemes that are resolved in the page itself.
const INLINE_SCHEMES: &[&str] = &["data:", "javascript:", "about:"];

pub struct AdditionalCallAnalyzer;

/// Resource references found in a document, grouped by kind.
#[derive(Debug, Default, PartialEq)]
pub struct ResourceCalls {
    pub stylesheets: Vec<String>,
    pub scripts: Vec<String>,
    pub images: Vec<String>,
}

impl ResourceCalls {
    pub fn total(&self) -> usize {
        self.stylesheets.len() + self.scripts.len() + self.images.len()
    }

    pub fn all(&self) -> impl Iterator<Item = &String> {
        self.stylesheets
            .iter()
            .chain(self.scripts.iter())
            .chain(self.images.iter())
    }
}

pub fn collect_resource_calls(document: &Html) -> Result<ResourceCalls> {
    let stylesheet_selector = selector("link[rel~=stylesheet][href]")?;
    let script_selector = selector("script[src]")?;
    let image_selector = selector("img[src]")?;

    let attr_values = |sel: &Selector, attr: &str| -> Vec<String> {
        document
            .select(sel)
            .filter_map(|element| element.value().attr(attr))
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty() && !is_inline(value))
            .collect()
    };

    Ok(ResourceCalls {
        stylesheets: attr_values(&stylesheet_selector, "href"),
        scripts: attr_values(&script_selector, "src"),
        images: attr_values(&image_selector, "src"),
    })
}

/// True for references that never cause a network request.
pub fn is_inline(reference: &str) -> bool {
    INLINE_SCHEMES.iter().any(|scheme| {
        reference
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// True when `reference` resolves to a host other than the page's own.
/// Inline `data:` resources never leave the page.
pub fn is_external(page: &Url, reference: &str) -> bool {
    match page.join(reference) {
        Ok(resolved) => {
            resolved.scheme() != "data" && resolved.host_str() != page.host_str()
        }
        Err(_) => false,
    }
}

impl DocumentAnalyzer for AdditionalCallAnalyzer {
    fn title(&self) -> &'static str {
        "additionalcallanalyzer_title"
    }

    fn evaluate(&self, document: &Html, page_url: &str) -> Result<AnalyzeResult> {
        let calls = collect_resource_calls(document)?;
        let total = calls.total();

        let volume_rule = if total > MAX_ADDITIONAL_CALLS {
            ResultRule::warning("additionalcallanalyzer_too_many_requests")
        } else {
            ResultRule::success("additionalcallanalyzer_requests_ok")
        }
        .with_token(total)
        .with_token(calls.stylesheets.len())
        .with_token(calls.scripts.len())
        .with_token(calls.images.len());

        let mut result = AnalyzeResult::new(self.title()).with_rule(volume_rule);

        // Without a parseable page URL there is no origin to compare against.
        if let Ok(page) = Url::parse(page_url) {
            let external = calls.all().filter(|r| is_external(&page, r)).count();
            let origin_rule = if external == 0 {
                ResultRule::success("additionalcallanalyzer_no_external_requests")
            } else {
                ResultRule::warning("additionalcallanalyzer_external_requests").with_token(external)
            };
            result.add_rule(origin_rule);
        }

        Ok(result)
    }
}
