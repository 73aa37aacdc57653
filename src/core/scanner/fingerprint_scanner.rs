// src/core/scanner/fingerprint_scanner.rs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, warn};

use super::{ScanContext, TechnologySource};
use crate::core::error::ScanError;
use crate::core::models::Technology;
use crate::core::probe::ProbeRequest;
use crate::core::target::Target;

/// Where in a response a technology leaves a trace.
#[derive(Debug, Clone, Copy)]
enum Source {
    /// A response header, by lowercase name.
    Header(&'static str),
    /// The `content` of `<meta name=...>`.
    Meta(&'static str),
    Body,
    /// Any `<script src>`.
    Script,
    /// Any `<link href>`.
    Link,
    /// The joined `set-cookie` header.
    Cookie,
}

// (technology, category, source, pattern). Capture group 1, when present, holds the version.
const SIGNATURES: &[(&str, &str, Source, &str)] = &[
    ("Nginx", "Web Server", Source::Header("server"), r"(?i)nginx(?:/([\d.]+))?"),
    ("Nginx", "Web Server", Source::Body, r"<hr><center>nginx</center>"),
    ("Apache", "Web Server", Source::Header("server"), r"(?i)apache(?:/([\d.]+))?"),
    ("Apache", "Web Server", Source::Body, r"Apache Server at"),
    ("IIS", "Web Server", Source::Header("server"), r"Microsoft-IIS(?:/([\d.]+))?"),
    ("LiteSpeed", "Web Server", Source::Header("server"), r"LiteSpeed"),
    ("Cloudflare", "CDN / WAF", Source::Header("server"), r"(?i)cloudflare"),
    ("Cloudflare", "CDN / WAF", Source::Header("cf-ray"), r".+"),
    ("Akamai", "CDN / WAF", Source::Header("x-akamai-transformed"), r".+"),
    ("WordPress", "CMS", Source::Meta("generator"), r"WordPress ([\d.]+)"),
    ("WordPress", "CMS", Source::Body, r"/wp-content/|/wp-includes/|wp-login\.php"),
    ("Drupal", "CMS", Source::Meta("generator"), r"Drupal ?([\d.]+)?"),
    ("Drupal", "CMS", Source::Header("x-generator"), r"Drupal ?([\d.]+)?"),
    ("Drupal", "CMS", Source::Body, r"/sites/default/files/"),
    ("Joomla", "CMS", Source::Meta("generator"), r"Joomla!"),
    ("Shopify", "E-commerce", Source::Header("x-shopid"), r".+"),
    ("Magento", "E-commerce", Source::Cookie, r"(?i)magento|frontend="),
    ("PHP", "Language", Source::Header("x-powered-by"), r"PHP/([\d.]+)"),
    ("PHP", "Language", Source::Cookie, r"PHPSESSID"),
    ("Laravel", "Framework", Source::Cookie, r"laravel_session"),
    ("ASP.NET", "Framework", Source::Header("x-aspnet-version"), r"([\d.]+)"),
    ("ASP.NET", "Framework", Source::Header("x-powered-by"), r"ASP\.NET"),
    ("ASP.NET", "Framework", Source::Body, r"__VIEWSTATE"),
    ("Java", "Language", Source::Cookie, r"JSESSIONID"),
    ("Django", "Framework", Source::Cookie, r"csrftoken"),
    ("Flask", "Framework", Source::Header("server"), r"(?i)werkzeug(?:/([\d.]+))?"),
    ("Express", "Framework", Source::Header("x-powered-by"), r"^Express$"),
    ("Ruby on Rails", "Framework", Source::Cookie, r"_rails_session|_session_id"),
    ("Next.js", "JS Framework", Source::Header("x-powered-by"), r"Next\.js ?([\d.]+)?"),
    ("Next.js", "JS Framework", Source::Script, r"/_next/static/"),
    ("Nuxt.js", "JS Framework", Source::Body, r"__NUXT__"),
    ("Angular", "JS Framework", Source::Body, r#"ng-version="([\d.]+)"|ng-app="#),
    ("Svelte", "JS Framework", Source::Body, r#"class=["']svelte-"#),
    ("Gatsby", "JS Framework", Source::Body, r#"id=["']___gatsby["']"#),
    ("Astro", "JS Framework", Source::Meta("generator"), r"Astro v([\d.]+)"),
    ("React", "JS Library", Source::Body, r"react-dom|data-reactroot|react\.development"),
    ("Vue.js", "JS Library", Source::Body, r"data-v-app|__VUE_"),
    ("jQuery", "JS Library", Source::Script, r"jquery(?:[-.@/](\d+(?:\.\d+)+))?(?:\.slim)?(?:\.min)?\.js"),
    ("jQuery", "JS Library", Source::Body, r#"\.fn\.jquery: "([\d.]+)""#),
    ("Bootstrap", "UI Framework", Source::Link, r"bootstrap(?:@([\d.]+))?[^\s]*\.min\.css"),
    ("Swagger UI", "API", Source::Body, r"swagger-ui(?:-bundle)?\.js|SwaggerUIBundle"),
    ("GraphQL", "API", Source::Body, r"(?i)graphiql|/graphql\b"),
    ("Google Analytics", "Analytics", Source::Script, r"google-analytics\.com/|googletagmanager\.com/"),
];

struct Signature {
    technology: &'static str,
    category: &'static str,
    source: Source,
    pattern: Regex,
}

static COMPILED: Lazy<Vec<Signature>> = Lazy::new(|| {
    SIGNATURES
        .iter()
        .map(|&(technology, category, source, pattern)| Signature {
            technology,
            category,
            source,
            pattern: Regex::new(pattern).unwrap(),
        })
        .collect()
});

static SEL_SCRIPT: Lazy<Selector> = Lazy::new(|| Selector::parse("script[src]").unwrap());
static SEL_LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("link[href]").unwrap());

/// Matches every signature against a response. Results are sorted by name
/// and each technology appears once, with the first version any of its
/// signatures captured.
///
/// `headers` must use lowercase names, as `ProbeResult` does.
pub fn detect_technologies(body: &str, headers: &HashMap<String, String>) -> Vec<Technology> {
    let document = Html::parse_document(body);
    let cookies = headers.get("set-cookie").map(String::as_str);
    let mut found: BTreeMap<&str, Technology> = BTreeMap::new();

    for signature in COMPILED.iter() {
        let re = &signature.pattern;
        let hit = match signature.source {
            Source::Header(name) => version_in(headers.get(name).map(String::as_str), re),
            Source::Meta(name) => meta_version(&document, name, re),
            Source::Body => version_in(Some(body), re),
            Source::Script => attribute_version(&document, &SEL_SCRIPT, "src", re),
            Source::Link => attribute_version(&document, &SEL_LINK, "href", re),
            Source::Cookie => version_in(cookies, re),
        };
        let Some(version) = hit else {
            continue;
        };
        let entry = found.entry(signature.technology).or_insert_with(|| Technology {
            name: signature.technology.to_string(),
            category: signature.category.to_string(),
            version: None,
        });
        if entry.version.is_none() {
            entry.version = version;
        }
    }

    found.into_values().collect()
}

/// Fetches the target's root page and fingerprints it.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpTechnologyDetector;

#[async_trait]
impl TechnologySource for HttpTechnologyDetector {
    async fn detect(&self, target: &Target, ctx: ScanContext<'_>) -> Result<Vec<Technology>, ScanError> {
        info!(target = %target, signatures = SIGNATURES.len(), "Starting technology detection.");
        for base in target.base_urls(ctx.schemes) {
            let response = ctx.prober.request_with_retry(ProbeRequest::get(base.clone()), ctx.retries).await;
            if response.is_failure() {
                warn!(url = %base, error = ?response.error, "Root page unreachable.");
                continue;
            }
            debug!(url = %base, status = ?response.status, bytes = response.body.len(), "Fetched root page.");
            let technologies = detect_technologies(&response.body, &response.headers);
            info!(count = technologies.len(), "Technology detection finished.");
            return Ok(technologies);
        }
        Err(ScanError::stage("technology detection", "no base URL responded"))
    }
}

/// `None` when `re` does not match, otherwise the captured version if any.
fn version_in(text: Option<&str>, re: &Regex) -> Option<Option<String>> {
    let caps = re.captures(text?)?;
    Some(caps.get(1).map(|m| m.as_str().to_string()).filter(|v| !v.is_empty()))
}

fn meta_version(doc: &Html, name: &str, re: &Regex) -> Option<Option<String>> {
    let selector = Selector::parse(&format!("meta[name='{name}']")).ok()?;
    let content = doc.select(&selector).next().and_then(|el| el.value().attr("content"));
    version_in(content, re)
}

fn attribute_version(doc: &Html, selector: &Selector, attribute: &str, re: &Regex) -> Option<Option<String>> {
    doc.select(selector).filter_map(|el| el.value().attr(attribute)).find_map(|value| version_in(Some(value), re))
}
