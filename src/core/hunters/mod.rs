// src/core/hunters/mod.rs

// Vulnerability hunters. Most classes share `InjectionHunter`, which sends a
// short list of payloads through one query parameter and stops at the first
// response its detector accepts. Each class module only supplies the
// parameter name, payload budget, severity and detector.
pub mod command_injection;
pub mod csrf;
pub mod directory_traversal;
pub mod lfi;
pub mod sqli;
pub mod ssrf;
pub mod template_injection;
pub mod xss;

use async_trait::async_trait;
use std::collections::HashSet;
use std::str::FromStr;
use tracing::{debug, info};
use url::Url;

use crate::core::error::ConfigError;
use crate::core::models::{DirectoryFinding, FormInput, ParameterFinding, Severity, VulnKind, Vulnerability};
use crate::core::probe::ProbeRequest;
use crate::core::scanner::ScanContext;
use crate::core::wordlists::WordlistProvider;

/// Tests one endpoint for one vulnerability class.
///
/// Implementations never fail: probe errors are logged and the next payload
/// is tried. At most one vulnerability is reported per endpoint.
#[async_trait]
pub trait Hunter: Send + Sync {
    fn kind(&self) -> VulnKind;

    async fn test_endpoint(&self, endpoint: &Url, ctx: ScanContext<'_>) -> Vec<Vulnerability>;
}

/// Decides whether a response body proves the payload worked, returning the evidence if so.
pub type Detector = fn(payload: &str, body: &str) -> Option<String>;

/// A payload-through-query-parameter hunter.
pub struct InjectionHunter {
    kind: VulnKind,
    parameter: &'static str,
    payloads: Vec<String>,
    severity: Severity,
    detect: Detector,
}

impl InjectionHunter {
    pub fn new(kind: VulnKind, parameter: &'static str, payloads: Vec<String>, severity: Severity, detect: Detector) -> Self {
        Self { kind, parameter, payloads, severity, detect }
    }

    pub fn parameter(&self) -> &str {
        self.parameter
    }

    pub fn payloads(&self) -> &[String] {
        &self.payloads
    }
}

#[async_trait]
impl Hunter for InjectionHunter {
    fn kind(&self) -> VulnKind {
        self.kind
    }

    async fn test_endpoint(&self, endpoint: &Url, ctx: ScanContext<'_>) -> Vec<Vulnerability> {
        for payload in &self.payloads {
            if ctx.cancel.is_cancelled() {
                break;
            }
            let url = inject(endpoint, self.parameter, payload);
            let result = ctx.prober.request(ProbeRequest::get(url.clone())).await;
            if result.is_failure() {
                debug!(url = %url, kind = %self.kind, error = ?result.error, "Payload probe failed.");
                continue;
            }
            if result.status != Some(200) {
                continue;
            }
            if let Some(evidence) = (self.detect)(payload, &result.body) {
                info!(endpoint = %endpoint, kind = %self.kind, "Vulnerability detected.");
                return vec![Vulnerability {
                    kind: self.kind,
                    severity: self.severity,
                    endpoint: endpoint.to_string(),
                    url: url.to_string(),
                    parameter: Some(self.parameter.to_string()),
                    payload: payload.clone(),
                    evidence,
                    method: "GET".to_string(),
                }];
            }
        }
        Vec::new()
    }
}

/// Appends `parameter=payload` to the endpoint's query, percent-encoding the payload.
pub fn inject(endpoint: &Url, parameter: &str, payload: &str) -> Url {
    let mut url = endpoint.clone();
    url.query_pairs_mut().append_pair(parameter, payload);
    url
}

/// The first `max_chars` characters of `text`, with an ellipsis if anything was cut.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(max_chars).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

// --- Registry ---

/// The hunters selected for a scan, in the order their categories were given.
#[derive(Default)]
pub struct HunterRegistry {
    hunters: Vec<Box<dyn Hunter>>,
}

impl HunterRegistry {
    /// Builds one hunter per payload category. Repeated categories (including
    /// aliases such as `rce` and `command_injection`) produce one hunter.
    pub fn from_categories(categories: &[String], provider: &dyn WordlistProvider) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();
        let mut hunters: Vec<Box<dyn Hunter>> = Vec::new();
        for category in categories {
            let kind = VulnKind::from_str(category.trim()).map_err(|_| ConfigError::UnknownCategory(category.clone()))?;
            if !seen.insert(kind) {
                continue;
            }
            let payloads = |limit: usize| provider.get(kind.as_ref()).into_iter().take(limit).collect::<Vec<_>>();
            let hunter: Box<dyn Hunter> = match kind {
                VulnKind::Xss => Box::new(xss::hunter(payloads(xss::PAYLOAD_LIMIT))),
                VulnKind::Lfi => Box::new(lfi::hunter(payloads(lfi::PAYLOAD_LIMIT))),
                VulnKind::Ssrf => Box::new(ssrf::hunter(payloads(ssrf::PAYLOAD_LIMIT))),
                VulnKind::Sqli => Box::new(sqli::hunter(payloads(sqli::PAYLOAD_LIMIT))),
                VulnKind::CommandInjection => Box::new(command_injection::hunter(payloads(command_injection::PAYLOAD_LIMIT))),
                VulnKind::TemplateInjection => Box::new(template_injection::hunter(payloads(template_injection::PAYLOAD_LIMIT))),
                VulnKind::DirectoryTraversal => {
                    Box::new(directory_traversal::hunter(payloads(directory_traversal::PAYLOAD_LIMIT)))
                }
                VulnKind::Csrf => Box::new(csrf::CsrfHunter),
            };
            hunters.push(hunter);
        }
        Ok(Self { hunters })
    }

    pub fn with_hunters(hunters: Vec<Box<dyn Hunter>>) -> Self {
        Self { hunters }
    }

    pub fn hunters(&self) -> &[Box<dyn Hunter>] {
        &self.hunters
    }

    pub fn kinds(&self) -> Vec<VulnKind> {
        self.hunters.iter().map(|hunter| hunter.kind()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.hunters.is_empty()
    }
}

/// The endpoints the inject phase tests, in priority order and capped at `limit`:
/// discovered directories, the root URL, GET form actions, then the root with
/// each known parameter set to `test`.
pub fn injection_endpoints(
    root: &Url,
    directories: &[DirectoryFinding],
    inputs: &[FormInput],
    parameters: &[ParameterFinding],
    limit: usize,
) -> Vec<Url> {
    let mut seen = HashSet::new();
    let directory_urls = directories.iter().filter_map(|dir| Url::parse(&dir.url).ok());
    let form_actions = inputs
        .iter()
        .filter(|form| form.method.eq_ignore_ascii_case("GET"))
        .filter_map(|form| Url::parse(&form.action).ok());
    let parameterized = parameters.iter().map(|param| inject(root, &param.name, "test"));

    directory_urls
        .chain(std::iter::once(root.clone()))
        .chain(form_actions)
        .chain(parameterized)
        .filter(|url| seen.insert(url.to_string()))
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::ParameterOrigin;
    use crate::core::wordlists::BuiltinWordlists;

    #[test]
    fn inject_encodes_and_preserves_existing_query() {
        let endpoint = Url::parse("https://example.test/search?lang=en").unwrap();
        let url = inject(&endpoint, "test", "<script>alert(1)</script>");
        assert_eq!(url.query(), Some("lang=en&test=%3Cscript%3Ealert%281%29%3C%2Fscript%3E"));
        let decoded: Vec<(String, String)> = url.query_pairs().map(|(k, v)| (k.into_owned(), v.into_owned())).collect();
        assert_eq!(decoded[1].1, "<script>alert(1)</script>");
    }

    #[test]
    fn excerpt_is_char_safe() {
        assert_eq!(excerpt("héllo wörld", 5), "héllo...");
        assert_eq!(excerpt("short", 10), "short");
    }

    #[test]
    fn registry_dedupes_aliases_and_rejects_unknown() {
        let categories: Vec<String> = ["xss", "rce", "command_injection", "csrf"].iter().map(|s| s.to_string()).collect();
        let registry = HunterRegistry::from_categories(&categories, &BuiltinWordlists).unwrap();
        assert_eq!(registry.kinds(), vec![VulnKind::Xss, VulnKind::CommandInjection, VulnKind::Csrf]);

        let bad = vec!["xss".to_string(), "bogus".to_string()];
        assert!(matches!(HunterRegistry::from_categories(&bad, &BuiltinWordlists), Err(ConfigError::UnknownCategory(_))));
    }

    #[test]
    fn payload_budgets_are_applied() {
        let xss = xss::hunter(BuiltinWordlists.get("xss").into_iter().take(xss::PAYLOAD_LIMIT).collect());
        assert_eq!(xss.payloads().len(), 5);
        assert_eq!(xss.parameter(), "test");
        let ssrf = ssrf::hunter(BuiltinWordlists.get("ssrf").into_iter().take(ssrf::PAYLOAD_LIMIT).collect());
        assert_eq!(ssrf.payloads().len(), 2);
    }

    #[test]
    fn endpoints_follow_priority_and_cap() {
        let root = Url::parse("https://example.test/").unwrap();
        let directories: Vec<DirectoryFinding> = ["admin", "api"]
            .iter()
            .map(|path| DirectoryFinding {
                url: format!("https://example.test/{path}"),
                path: path.to_string(),
                status: 200,
                content_length: 0,
                content_type: String::new(),
            })
            .collect();
        let parameters: Vec<ParameterFinding> = ["id", "page", "file"]
            .iter()
            .map(|name| ParameterFinding { name: name.to_string(), origin: ParameterOrigin::Wordlist })
            .collect();

        let endpoints = injection_endpoints(&root, &directories, &[], &parameters, 4);
        let endpoints: Vec<&str> = endpoints.iter().map(Url::as_str).collect();
        assert_eq!(
            endpoints,
            vec![
                "https://example.test/admin",
                "https://example.test/api",
                "https://example.test/",
                "https://example.test/?id=test",
            ]
        );
    }
}
