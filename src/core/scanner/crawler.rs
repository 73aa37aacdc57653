// src/core/scanner/crawler.rs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};
use url::Url;

use super::fingerprint_scanner::detect_technologies;
use super::{fan_out_ordered, CrawlSource, ScanContext};
use crate::core::error::ScanError;
use crate::core::models::{FormInput, InputField, ProbeResult, Technology};
use crate::core::probe::ProbeRequest;
use crate::core::target::Target;

/// Links kept per page, in document order.
pub const MAX_LINKS_PER_PAGE: usize = 50;

static RE_IGNORED_EXTENSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:png|jpg|jpeg|gif|svg|ico|css|js|woff|woff2|ttf|eot)$").unwrap());
static RE_IGNORED_ACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)logout|signout|exit").unwrap());
static RE_INTERESTING_SRC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(?:php|asp|aspx|jsp|do|action|html|htm|shtml|cgi|pl|py)$").unwrap());

static PARAMETER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r#"["']([a-zA-Z_][a-zA-Z0-9_]*)["']\s*:\s*"#,
        r"\?([a-zA-Z_][a-zA-Z0-9_]*)=",
        r"&([a-zA-Z_][a-zA-Z0-9_]*)=",
        r"data\.([a-zA-Z_][a-zA-Z0-9_]*)",
        r"params\.([a-zA-Z_][a-zA-Z0-9_]*)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});

static SEL_TITLE: Lazy<Selector> = Lazy::new(|| Selector::parse("title").unwrap());
static SEL_HREF: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href], area[href], link[href]").unwrap());
static SEL_SRC: Lazy<Selector> = Lazy::new(|| Selector::parse("[src]").unwrap());
static SEL_FORM: Lazy<Selector> = Lazy::new(|| Selector::parse("form").unwrap());
static SEL_FIELD: Lazy<Selector> = Lazy::new(|| Selector::parse("input[name], textarea[name], select[name]").unwrap());
static RE_ABSOLUTE_URL: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s"'<>]+"#).unwrap());

/// Longest page title kept, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

// --- Output ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawledPage {
    pub url: String,
    pub depth: usize,
    pub status: u16,
    pub title: Option<String>,
    pub links: Vec<String>,
    pub forms: usize,
}

/// Everything collected during one crawl.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlReport {
    pub pages: Vec<CrawledPage>,
    pub parameters: BTreeSet<String>,
    pub inputs: Vec<FormInput>,
    pub technologies: Vec<Technology>,
    /// Pages that could not be fetched or were not HTML.
    pub failed: usize,
}

/// What a single HTML page yields, before scope filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageData {
    pub title: Option<String>,
    pub links: Vec<Url>,
    pub forms: Vec<FormInput>,
    pub parameters: BTreeSet<String>,
}

// --- The Crawler ---

/// A breadth-first, same-site crawler.
///
/// Pages are fetched one depth level at a time. Only links that stay within
/// the target's scope are followed, never beyond `max_depth` and never more
/// than `max_pages` pages in total.
#[derive(Debug, Clone, Copy)]
pub struct WebCrawler {
    pub max_depth: usize,
    pub max_pages: usize,
}

impl Default for WebCrawler {
    fn default() -> Self {
        Self { max_depth: 3, max_pages: 100 }
    }
}

impl WebCrawler {
    pub fn new(max_depth: usize, max_pages: usize) -> Self {
        Self { max_depth, max_pages }
    }
}

#[async_trait]
impl CrawlSource for WebCrawler {
    async fn crawl(&self, target: &Target, ctx: ScanContext<'_>) -> Result<CrawlReport, ScanError> {
        let mut report = CrawlReport::default();
        let mut technologies: BTreeMap<String, Technology> = BTreeMap::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut frontier: Vec<Url> = target.base_urls(ctx.schemes);
        let mut depth = 0;

        info!(target = %target, max_depth = self.max_depth, max_pages = self.max_pages, "Starting crawl.");

        while !frontier.is_empty() && depth <= self.max_depth && !ctx.cancel.is_cancelled() {
            let mut batch = Vec::new();
            for url in frontier.drain(..) {
                if visited.len() >= self.max_pages {
                    break;
                }
                if should_ignore(&url) || !visited.insert(url.to_string()) {
                    continue;
                }
                batch.push(url);
            }
            if batch.is_empty() {
                break;
            }
            debug!(depth, pages = batch.len(), "Crawling level.");

            let fetched = fan_out_ordered(batch, ctx.concurrency, ctx.cancel, |url| async move {
                let result = ctx.prober.request_with_retry(ProbeRequest::get(url.clone()), ctx.retries).await;
                (url, result)
            })
            .await;

            let mut next = Vec::new();
            let mut queued = HashSet::new();
            for (url, result) in fetched {
                let Some(status) = fetchable(&result) else {
                    report.failed += 1;
                    continue;
                };
                let page = parse_page(&url, &result.body);
                for tech in detect_technologies(&result.body, &result.headers) {
                    technologies.entry(tech.name.clone()).or_insert(tech);
                }

                let links: Vec<Url> = page.links.into_iter().filter(|link| target.in_scope(link)).collect();
                if depth < self.max_depth {
                    for link in &links {
                        let key = link.to_string();
                        if !visited.contains(&key) && queued.insert(key) {
                            next.push(link.clone());
                        }
                    }
                }

                report.parameters.extend(page.parameters);
                report.pages.push(CrawledPage {
                    url: url.to_string(),
                    depth,
                    status,
                    title: page.title,
                    links: links.iter().map(Url::to_string).collect(),
                    forms: page.forms.len(),
                });
                report.inputs.extend(page.forms);
            }

            frontier = next;
            depth += 1;
        }

        report.technologies = technologies.into_values().collect();
        info!(
            target = %target,
            pages = report.pages.len(),
            forms = report.inputs.len(),
            parameters = report.parameters.len(),
            "Crawl finished."
        );
        Ok(report)
    }
}

/// The status of a successfully fetched HTML page, or `None` if the page should be counted as failed.
fn fetchable(result: &ProbeResult) -> Option<u16> {
    let status = result.status?;
    ((200..300).contains(&status) && result.is_html()).then_some(status)
}

/// True for URLs the crawler never visits: static assets and logout-like actions.
pub fn should_ignore(url: &Url) -> bool {
    if url.scheme() != "http" && url.scheme() != "https" {
        return true;
    }
    RE_IGNORED_EXTENSION.is_match(url.path()) || RE_IGNORED_ACTION.is_match(&url[url::Position::BeforePath..])
}

/// Extracts title, links, forms and parameter names from an HTML page.
pub fn parse_page(page_url: &Url, body: &str) -> PageData {
    let document = Html::parse_document(body);
    let mut data = PageData::default();

    data.title = document
        .select(&SEL_TITLE)
        .next()
        .map(|el| el.text().collect::<String>().trim().chars().take(MAX_TITLE_CHARS).collect::<String>())
        .filter(|title| !title.is_empty());

    let mut seen = HashSet::new();
    let hrefs = document.select(&SEL_HREF).filter_map(|el| el.value().attr("href"));
    let srcs = document
        .select(&SEL_SRC)
        .filter_map(|el| el.value().attr("src"))
        .filter(|src| RE_INTERESTING_SRC.is_match(src.split(['?', '#']).next().unwrap_or_default()));
    for raw in hrefs.chain(srcs) {
        if data.links.len() >= MAX_LINKS_PER_PAGE {
            break;
        }
        if let Some(link) = resolve_link(page_url, raw) {
            if seen.insert(link.to_string()) {
                data.links.push(link);
            }
        }
    }

    for form in document.select(&SEL_FORM) {
        data.forms.push(parse_form(page_url, form));
    }
    // Fields outside any form are grouped into one GET "form" on the page itself.
    let standalone: Vec<InputField> = document
        .select(&SEL_FIELD)
        .filter(|el| !el.ancestors().filter_map(ElementRef::wrap).any(|parent| parent.value().name() == "form"))
        .filter_map(input_field)
        .collect();
    if !standalone.is_empty() {
        data.forms.push(FormInput {
            page: page_url.to_string(),
            action: page_url.to_string(),
            method: "GET".to_string(),
            fields: standalone,
        });
    }

    for (name, _) in page_url.query_pairs() {
        data.parameters.insert(name.into_owned());
    }
    for link in &data.links {
        for (name, _) in link.query_pairs() {
            data.parameters.insert(name.into_owned());
        }
    }
    for form in &data.forms {
        data.parameters.extend(form.fields.iter().map(|field| field.name.clone()));
    }
    for found in RE_ABSOLUTE_URL.find_iter(body) {
        if let Ok(url) = Url::parse(found.as_str()) {
            data.parameters.extend(url.query_pairs().map(|(name, _)| name.into_owned()));
        }
    }
    for pattern in PARAMETER_PATTERNS.iter() {
        for caps in pattern.captures_iter(body) {
            if let Some(name) = caps.get(1) {
                data.parameters.insert(name.as_str().to_string());
            }
        }
    }
    data.parameters.retain(|name| is_parameter_name(name));

    data
}

fn resolve_link(page_url: &Url, raw: &str) -> Option<Url> {
    let raw = raw.trim();
    let lowered = raw.to_ascii_lowercase();
    if raw.is_empty()
        || raw.starts_with('#')
        || lowered.starts_with("mailto:")
        || lowered.starts_with("javascript:")
        || lowered.starts_with("tel:")
    {
        return None;
    }
    let mut link = page_url.join(raw).ok()?;
    link.set_fragment(None);
    if should_ignore(&link) {
        return None;
    }
    Some(link)
}

fn parse_form(page_url: &Url, form: ElementRef<'_>) -> FormInput {
    let action = form
        .value()
        .attr("action")
        .map(str::trim)
        .filter(|action| !action.is_empty())
        .and_then(|action| page_url.join(action).ok())
        .unwrap_or_else(|| page_url.clone());
    let method = form.value().attr("method").unwrap_or("get").trim().to_ascii_uppercase();

    let fields = form.select(&SEL_FIELD).filter_map(input_field).collect();

    FormInput { page: page_url.to_string(), action: action.to_string(), method, fields }
}

fn input_field(el: ElementRef<'_>) -> Option<InputField> {
    let name = el.value().attr("name")?.trim();
    if name.is_empty() {
        return None;
    }
    let kind = match el.value().name() {
        "input" => el.value().attr("type").unwrap_or("text").to_ascii_lowercase(),
        other => other.to_string(),
    };
    Some(InputField { name: name.to_string(), kind, required: el.value().attr("required").is_some() })
}

/// A plausible parameter name: 2 to 29 characters of letters, digits, `_` or `-`.
pub fn is_parameter_name(name: &str) -> bool {
    (2..30).contains(&name.len()) && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
