// tests/hunters_test.rs

mod common;

use common::{context, html, https, FnProber, StaticWordlists};
use shadowrecon::core::cancel::CancelSignal;
use shadowrecon::core::hunters::csrf::CsrfHunter;
use shadowrecon::core::hunters::{lfi, sqli, xss, Hunter, HunterRegistry};
use shadowrecon::core::models::{Severity, VulnKind};
use shadowrecon::core::probe::{ConcurrencyBudget, ProbeClient, ProbeOptions, ProbeRequest};
use shadowrecon::core::wordlists::{BuiltinWordlists, WordlistProvider};
use url::Url;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Echoes the `test` query parameter back into the page, optionally HTML-escaped.
struct Echo {
    escape: bool,
}

impl Respond for Echo {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let value = request
            .url
            .query_pairs()
            .find(|(name, _)| name == "test")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default();
        let value = if self.escape { value.replace('<', "&lt;").replace('>', "&gt;") } else { value };
        ResponseTemplate::new(200).set_body_raw(format!("<html><body>Results for {value}</body></html>"), "text/html")
    }
}

fn payloads(category: &str, limit: usize) -> Vec<String> {
    BuiltinWordlists.get(category).into_iter().take(limit).collect()
}

#[tokio::test]
async fn test_reflected_xss_is_detected() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(Echo { escape: false }).mount(&server).await;

    let prober = ProbeClient::new(&ProbeOptions::default(), ConcurrencyBudget::new(4), None).unwrap();
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let endpoint = Url::parse(&format!("{}/search", server.uri())).unwrap();

    let hunter = xss::hunter(payloads("xss", xss::PAYLOAD_LIMIT));
    let found = hunter.test_endpoint(&endpoint, context(&prober, &wordlists, &schemes, &cancel)).await;

    assert_eq!(found.len(), 1);
    let vuln = &found[0];
    assert_eq!(vuln.kind, VulnKind::Xss);
    assert_eq!(vuln.severity, Severity::High);
    assert_eq!(vuln.parameter.as_deref(), Some("test"));
    assert_eq!(vuln.endpoint, endpoint.to_string());
    assert_eq!(vuln.payload, r#"<script>alert("XSS")</script>"#);
    assert!(vuln.url.contains("test=%3Cscript%3E"));
}

#[tokio::test]
async fn test_single_script_payload_round_trip() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(Echo { escape: false }).mount(&server).await;
    let escaping = MockServer::start().await;
    Mock::given(method("GET")).respond_with(Echo { escape: true }).mount(&escaping).await;

    let prober = ProbeClient::new(&ProbeOptions::default(), ConcurrencyBudget::new(4), None).unwrap();
    let wordlists = StaticWordlists::default().with("xss", &["<script>alert(1)</script>"]);
    let (schemes, cancel) = (https(), CancelSignal::never());
    let registry = HunterRegistry::from_categories(&["xss".to_string()], &wordlists).unwrap();
    let hunter = &registry.hunters()[0];

    let endpoint = Url::parse(&format!("{}/search", server.uri())).unwrap();
    let found = hunter.test_endpoint(&endpoint, context(&prober, &wordlists, &schemes, &cancel)).await;
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, VulnKind::Xss);
    assert_eq!(found[0].payload, "<script>alert(1)</script>");

    let endpoint = Url::parse(&format!("{}/search", escaping.uri())).unwrap();
    let found = hunter.test_endpoint(&endpoint, context(&prober, &wordlists, &schemes, &cancel)).await;
    assert!(found.is_empty());
    assert_eq!(escaping.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_escaped_reflection_is_not_xss() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(Echo { escape: true }).mount(&server).await;

    let prober = ProbeClient::new(&ProbeOptions::default(), ConcurrencyBudget::new(4), None).unwrap();
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let endpoint = Url::parse(&format!("{}/search", server.uri())).unwrap();

    let hunter = xss::hunter(payloads("xss", xss::PAYLOAD_LIMIT));
    let found = hunter.test_endpoint(&endpoint, context(&prober, &wordlists, &schemes, &cancel)).await;

    assert!(found.is_empty());
    assert_eq!(server.received_requests().await.unwrap().len(), xss::PAYLOAD_LIMIT);
}

#[tokio::test]
async fn test_lfi_stops_at_first_hit() {
    let prober = FnProber::new(|request: &ProbeRequest| {
        let wants_passwd = request.url.query_pairs().any(|(name, value)| name == "file" && value.contains("passwd"));
        let body = if wants_passwd { "root:x:0:0:root:/root:/bin/bash" } else { "<html>nothing</html>" };
        html(request, 200, body)
    });
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let endpoint = Url::parse("https://example.test/view").unwrap();

    let hunter = lfi::hunter(payloads("lfi", lfi::PAYLOAD_LIMIT));
    let found = hunter.test_endpoint(&endpoint, context(&prober, &wordlists, &schemes, &cancel)).await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].kind, VulnKind::Lfi);
    assert_eq!(found[0].payload, "../../../etc/passwd");
    assert_eq!(prober.requests().len(), 1);
}

#[tokio::test]
async fn test_non_200_responses_are_ignored() {
    let prober = FnProber::new(|request: &ProbeRequest| html(request, 500, "You have an error in your SQL syntax"));
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let endpoint = Url::parse("https://example.test/item").unwrap();

    let hunter = sqli::hunter(payloads("sqli", sqli::PAYLOAD_LIMIT));
    let found = hunter.test_endpoint(&endpoint, context(&prober, &wordlists, &schemes, &cancel)).await;

    assert!(found.is_empty());
    assert_eq!(prober.requests().len(), sqli::PAYLOAD_LIMIT);
}

#[tokio::test]
async fn test_sql_error_is_reported() {
    let prober = FnProber::new(|request: &ProbeRequest| {
        let quoted = request.url.query_pairs().any(|(_, value)| value.contains('\''));
        let body = if quoted { "Warning: mysqli_fetch_array() expects parameter 1" } else { "ok" };
        html(request, 200, body)
    });
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let endpoint = Url::parse("https://example.test/item").unwrap();

    let hunter = sqli::hunter(payloads("sqli", sqli::PAYLOAD_LIMIT));
    let found = hunter.test_endpoint(&endpoint, context(&prober, &wordlists, &schemes, &cancel)).await;

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].payload, "'");
    assert!(found[0].evidence.to_ascii_lowercase().contains("mysqli"));
}

#[tokio::test]
async fn test_csrf_flags_forms_without_tokens() {
    let prober = FnProber::new(|request: &ProbeRequest| {
        let body = if request.url.path() == "/login" {
            "<form method=post><input name=user></form>"
        } else {
            "<form method=post><input type=hidden name=csrf_token value=x></form>"
        };
        html(request, 200, body)
    });
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let ctx = context(&prober, &wordlists, &schemes, &cancel);

    let login = Url::parse("https://example.test/login").unwrap();
    let safe = Url::parse("https://example.test/profile").unwrap();
    assert_eq!(CsrfHunter.test_endpoint(&login, ctx).await.len(), 1);
    assert!(CsrfHunter.test_endpoint(&safe, ctx).await.is_empty());
}

#[test]
fn test_registry_follows_configured_order() {
    let categories: Vec<String> = ["sqli", "xss", "lfi"].iter().map(|s| s.to_string()).collect();
    let registry = HunterRegistry::from_categories(&categories, &BuiltinWordlists).unwrap();
    assert_eq!(registry.kinds(), vec![VulnKind::Sqli, VulnKind::Xss, VulnKind::Lfi]);
}
