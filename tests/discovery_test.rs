// tests/discovery_test.rs

mod common;

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::{context, html, https, paths_prober, FnProber, StaticWordlists};
use shadowrecon::core::cancel::{cancel_pair, CancelSignal};
use shadowrecon::core::models::{ParameterFinding, ParameterOrigin, ProbeFailure, ProbeResult};
use shadowrecon::core::probe::ProbeRequest;
use shadowrecon::core::scanner::directory_scanner::HttpDirectoryScanner;
use shadowrecon::core::scanner::fingerprint_scanner::HttpTechnologyDetector;
use shadowrecon::core::scanner::parameter_scanner::WordlistParameterSource;
use shadowrecon::core::scanner::{DirectorySource, Discovery, ParameterSource, ScanContext, TechnologySource};
use shadowrecon::core::target::Target;
use shadowrecon::core::wordlists::{BuiltinWordlists, DIRECTORIES, PARAMETERS};
use std::time::Duration;

const WORDS: &[&str] = &["admin", "api", "backup", "login", "old"];

#[tokio::test]
async fn test_directory_scan_reports_only_existing_paths() {
    let prober = paths_prober(&["/admin", "/api"]);
    let wordlists = StaticWordlists::default().with(DIRECTORIES, WORDS);
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse("example.test").unwrap();

    let discovery = HttpDirectoryScanner.discover(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    let urls: Vec<&str> = discovery.findings.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec!["https://example.test/admin", "https://example.test/api"]);
    assert_eq!(discovery.probed, 5);
    assert_eq!(discovery.failed, 0);
    assert_eq!(prober.requests().len(), 5);
}

#[tokio::test]
async fn test_directory_scan_is_repeatable() {
    let prober = paths_prober(&["/backup"]);
    let wordlists = StaticWordlists::default().with(DIRECTORIES, WORDS);
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse("example.test").unwrap();
    let ctx = context(&prober, &wordlists, &schemes, &cancel);

    let first = HttpDirectoryScanner.discover(&target, ctx).await.unwrap();
    let second = HttpDirectoryScanner.discover(&target, ctx).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_failed_probes_are_counted_not_fatal() {
    let calls = AtomicUsize::new(0);
    let prober = FnProber::new(move |request: &ProbeRequest| {
        // Every third request fails at the transport level.
        if calls.fetch_add(1, Ordering::SeqCst) % 3 == 2 {
            ProbeResult::failure(request.url.as_str(), ProbeFailure::Connection, Duration::ZERO)
        } else {
            html(request, 200, "<html></html>")
        }
    });
    let words: Vec<String> = (0..9).map(|i| format!("dir{i}")).collect();
    let refs: Vec<&str> = words.iter().map(String::as_str).collect();
    let wordlists = StaticWordlists::default().with(DIRECTORIES, &refs);
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse("example.test").unwrap();

    let discovery = HttpDirectoryScanner.discover(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    assert_eq!(discovery.probed, 9);
    assert_eq!(discovery.failed, 3);
    assert_eq!(discovery.findings.len(), 6);
}

#[tokio::test]
async fn test_multiple_schemes_probe_each_base() {
    let prober = paths_prober(&["/admin"]);
    let wordlists = StaticWordlists::default().with(DIRECTORIES, &["admin"]);
    let schemes = vec!["http".to_string(), "https".to_string()];
    let cancel = CancelSignal::never();
    let target = Target::parse("example.test").unwrap();

    let discovery = HttpDirectoryScanner.discover(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    let urls: Vec<&str> = discovery.findings.iter().map(|d| d.url.as_str()).collect();
    assert_eq!(urls, vec!["http://example.test/admin", "https://example.test/admin"]);
}

#[tokio::test]
async fn test_cancelled_scan_dispatches_nothing() {
    let prober = paths_prober(&["/admin"]);
    let wordlists = StaticWordlists::default().with(DIRECTORIES, WORDS);
    let (handle, cancel) = cancel_pair();
    handle.cancel();
    let schemes = https();
    let target = Target::parse("example.test").unwrap();

    let discovery = HttpDirectoryScanner.discover(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    assert!(discovery.findings.is_empty());
    assert!(prober.requests().is_empty());
}

#[tokio::test]
async fn test_parameter_source_dedupes_wordlist() {
    let prober = paths_prober(&[]);
    let wordlists = StaticWordlists::default().with(PARAMETERS, &["id", " id ", "page", ""]);
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse("example.test").unwrap();

    let discovery =
        WordlistParameterSource.discover(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    let names: Vec<&str> = discovery.findings.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["id", "page"]);
    assert!(discovery.findings.iter().all(|p| p.origin == ParameterOrigin::Wordlist));
    assert!(prober.requests().is_empty());
}

#[tokio::test]
async fn test_deep_mode_adds_credential_parameters() {
    let prober = paths_prober(&[]);
    let wordlists = BuiltinWordlists;
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse("example.test").unwrap();
    let shallow_ctx = context(&prober, &wordlists, &schemes, &cancel);
    let deep_ctx = ScanContext { deep: true, ..shallow_ctx };

    let shallow = WordlistParameterSource.discover(&target, shallow_ctx).await.unwrap();
    let deep = WordlistParameterSource.discover(&target, deep_ctx).await.unwrap();

    let names = |d: &Discovery<ParameterFinding>| d.findings.iter().map(|p| p.name.clone()).collect::<Vec<_>>();
    assert_eq!(shallow.findings.len(), 29);
    assert!(!names(&shallow).contains(&"token".to_string()));
    assert_eq!(deep.findings.len(), 45);
    assert_eq!(&names(&deep)[..29], names(&shallow).as_slice());
    for name in ["token", "csrf", "session", "password", "user_id", "level"] {
        assert!(names(&deep).contains(&name.to_string()), "{name}");
    }
    assert!(prober.requests().is_empty());
}

#[tokio::test]
async fn test_technology_detection_reads_root_page() {
    let prober = FnProber::new(|request: &ProbeRequest| {
        let headers = HashMap::from([
            ("server".to_string(), "nginx/1.25.3".to_string()),
            ("content-type".to_string(), "text/html".to_string()),
        ]);
        ProbeResult::response(request.url.as_str(), 200, headers, "<html><body>hi</body></html>")
    });
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse("example.test").unwrap();

    let technologies =
        HttpTechnologyDetector.detect(&target, context(&prober, &wordlists, &schemes, &cancel)).await.unwrap();

    assert!(technologies.iter().any(|t| t.name == "Nginx"), "{technologies:?}");
    assert_eq!(prober.requests(), vec!["https://example.test/"]);
}

#[tokio::test]
async fn test_technology_detection_fails_when_unreachable() {
    let prober = FnProber::new(|request: &ProbeRequest| {
        ProbeResult::failure(request.url.as_str(), ProbeFailure::Timeout, Duration::ZERO)
    });
    let wordlists = StaticWordlists::default();
    let (schemes, cancel) = (https(), CancelSignal::never());
    let target = Target::parse("example.test").unwrap();

    let outcome = HttpTechnologyDetector.detect(&target, context(&prober, &wordlists, &schemes, &cancel)).await;
    assert!(outcome.is_err());
}
