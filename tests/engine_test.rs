// tests/engine_test.rs

mod common;

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

use common::{html, paths_prober, StaticWordlists};
use shadowrecon::config::ScanConfig;
use shadowrecon::core::engine::{ScanEvent, ShadowEngine};
use shadowrecon::core::error::{ConfigError, ScanError};
use shadowrecon::core::integrations::{ExternalTool, ToolJob};
use shadowrecon::core::models::{CategoryStatus, ExternalFinding, Phase, PhaseStatus, ProbeResult, VulnKind};
use shadowrecon::core::probe::{ProbeRequest, Prober};
use shadowrecon::core::scanner::{Discovery, ScanContext, SubdomainSource};
use shadowrecon::core::target::Target;
use shadowrecon::core::wordlists::DIRECTORIES;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

struct BrokenResolver;

#[async_trait]
impl SubdomainSource for BrokenResolver {
    async fn discover(&self, _target: &Target, _ctx: ScanContext<'_>) -> Result<Discovery<String>, ScanError> {
        Err(ScanError::stage("subdomain enumeration", "resolver exploded"))
    }
}

/// Reports one in-scope and one out-of-scope subdomain.
struct CannedTool;

#[async_trait]
impl ExternalTool for CannedTool {
    fn name(&self) -> &'static str {
        "canned"
    }

    async fn available(&self) -> bool {
        true
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        let finding = |value: &str| ExternalFinding {
            tool: "canned".to_string(),
            kind: "subdomain".to_string(),
            value: value.to_string(),
            detail: None,
        };
        Ok(vec![finding(&format!("dev.{}", job.target.host())), finding("evil.test")])
    }
}

struct MissingTool;

#[async_trait]
impl ExternalTool for MissingTool {
    fn name(&self) -> &'static str {
        "missing"
    }

    async fn available(&self) -> bool {
        false
    }

    async fn run(&self, _job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        unreachable!("never run when unavailable")
    }
}

fn quiet_config() -> ScanConfig {
    let mut config = ScanConfig { analyzers: false, payloads: vec!["xss".to_string()], ..ScanConfig::default() };
    config.tools.curl = true;
    config
}

fn stub_prober() -> Arc<dyn Prober> {
    Arc::new(paths_prober(&["/", "/admin"]))
}

fn phases(results: &shadowrecon::core::models::ScanResults) -> Vec<Phase> {
    results.metadata.phases.iter().map(|record| record.phase).collect()
}

#[tokio::test]
async fn test_failed_stage_does_not_stop_the_scan() {
    let output = tempfile::tempdir().unwrap();
    let config = ScanConfig { inject: true, output_dir: output.path().to_path_buf(), ..quiet_config() };
    let (tx, mut rx) = mpsc::unbounded_channel();

    let engine = ShadowEngine::builder(config)
        .with_prober(stub_prober())
        .with_wordlists(Box::new(StaticWordlists::default().with(DIRECTORIES, &["admin", "missing"])))
        .with_subdomain_source(Box::new(BrokenResolver))
        .with_tools(vec![Box::new(CannedTool), Box::new(MissingTool)])
        .with_events(tx)
        .build()
        .unwrap();

    let results = engine.discover_attack_surface("example.test").await;

    assert!(results.metadata.fatal_error.is_none());
    assert_eq!(
        phases(&results),
        vec![Phase::Mapping, Phase::TechDetect, Phase::Crawl, Phase::Inject, Phase::ExternalTools, Phase::Report]
    );
    assert!(matches!(results.metadata.phase_status(Phase::Mapping), Some(PhaseStatus::Failed(reason)) if reason.contains("resolver exploded")));
    assert_eq!(results.metadata.phase_status(Phase::Crawl), Some(&PhaseStatus::Skipped("disabled".to_string())));
    assert_eq!(results.metadata.phase_status(Phase::Inject), Some(&PhaseStatus::Completed));
    assert_eq!(results.metadata.phase_status(Phase::Report), Some(&PhaseStatus::Completed));
    assert!(results.metadata.phases.windows(2).all(|pair| pair[0].started <= pair[1].started));

    let categories = &results.metadata.categories;
    assert!(matches!(categories["subdomains"], CategoryStatus::Failed(_)));
    assert_eq!(categories["directories"], CategoryStatus::Ran);
    assert_eq!(categories["hunter:xss"], CategoryStatus::Ran);
    assert_eq!(categories["tool:canned"], CategoryStatus::Ran);
    assert!(matches!(categories["tool:missing"], CategoryStatus::Unavailable(_)));

    // Directory discovery still ran, and the tool's in-scope name was merged.
    assert_eq!(results.directories.len(), 1);
    assert!(results.directories[0].url.ends_with("/admin"));
    assert_eq!(results.subdomains, vec!["dev.example.test"]);
    assert_eq!(results.external.len(), 2);
    assert_eq!(results.metadata.counts["directories"], 1);
    assert!(results.attack_surface.is_some());

    let report = &results.metadata.reports["json"];
    assert!(report.starts_with(output.path()));
    assert!(report.exists());

    let mut started = Vec::new();
    let mut finished_last = false;
    while let Ok(event) = rx.try_recv() {
        finished_last = matches!(event, ScanEvent::Finished(_));
        if let ScanEvent::PhaseStarted { phase, .. } = event {
            started.push(phase);
        }
    }
    assert_eq!(started, phases(&results));
    assert!(finished_last);
}

#[tokio::test]
async fn test_invalid_target_is_fatal_but_returns_results() {
    let engine = ShadowEngine::builder(quiet_config()).with_prober(stub_prober()).with_reporter(None).build().unwrap();

    for input in ["*.example.test", "ftp://example.test", "   "] {
        let results = engine.discover_attack_surface(input).await;
        assert!(results.metadata.fatal_error.is_some(), "{input}");
        assert!(results.metadata.phases.is_empty());
        assert_eq!(results.finding_count(), 0);
        assert!(results.metadata.scan_end.is_some());
    }
}

#[tokio::test]
async fn test_cancelled_scan_skips_phases_but_reports() {
    let output = tempfile::tempdir().unwrap();
    let config = ScanConfig { output_dir: output.path().to_path_buf(), ..quiet_config() };
    let prober = Arc::new(paths_prober(&["/"]));
    let engine = ShadowEngine::builder(config).with_prober(prober.clone()).build().unwrap();

    engine.cancel_handle().cancel();
    let results = engine.discover_attack_surface("example.test").await;

    assert!(results.metadata.cancelled);
    for phase in [Phase::Mapping, Phase::TechDetect, Phase::Crawl, Phase::Inject, Phase::ExternalTools] {
        assert_eq!(results.metadata.phase_status(phase), Some(&PhaseStatus::Skipped("cancelled".to_string())));
    }
    assert_eq!(results.metadata.phase_status(Phase::Report), Some(&PhaseStatus::Completed));
    assert!(results.metadata.reports.contains_key("json"));
    assert!(prober.requests().is_empty());
}

#[tokio::test]
async fn test_batch_keeps_going_after_invalid_target() {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let engine = ShadowEngine::builder(quiet_config())
        .with_prober(stub_prober())
        .with_subdomain_source(Box::new(BrokenResolver))
        .with_tools(Vec::new())
        .with_reporter(None)
        .with_events(tx)
        .build()
        .unwrap();

    let targets = vec!["bad host!".to_string(), "example.test".to_string()];
    let results = engine.discover_multiple_targets(&targets).await;

    assert_eq!(results.len(), 2);
    assert!(results[0].metadata.fatal_error.is_some());
    assert!(results[1].metadata.fatal_error.is_none());
    assert_eq!(results[1].target, "example.test");
    assert_eq!(results[1].metadata.phase_status(Phase::Report), Some(&PhaseStatus::Skipped("no reporter".to_string())));

    let mut announced = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let ScanEvent::TargetStarted { index, total, .. } = event {
            announced.push((index, total));
        }
    }
    assert_eq!(announced, vec![(0, 2), (1, 2)]);
}

#[tokio::test]
async fn test_cancelled_batch_scans_nothing() {
    let engine = ShadowEngine::builder(quiet_config()).with_prober(stub_prober()).with_reporter(None).build().unwrap();
    engine.cancel_handle().cancel();
    let targets = vec!["example.test".to_string(), "example.org".to_string()];
    assert!(engine.discover_multiple_targets(&targets).await.is_empty());
}

#[tokio::test]
async fn test_passive_mode_only_maps_and_fingerprints() {
    let prober = Arc::new(paths_prober(&["/", "/admin"]));
    let config = ScanConfig { passive: true, crawl: true, inject: true, ..quiet_config() };
    let engine = ShadowEngine::builder(config)
        .with_prober(prober.clone())
        .with_subdomain_source(Box::new(BrokenResolver))
        .with_tools(vec![Box::new(CannedTool)])
        .with_reporter(None)
        .build()
        .unwrap();

    let results = engine.discover_attack_surface("example.test").await;

    assert_eq!(results.metadata.categories["directories"], CategoryStatus::Skipped("passive mode".to_string()));
    assert_eq!(results.metadata.phase_status(Phase::Crawl), Some(&PhaseStatus::Skipped("disabled".to_string())));
    assert_eq!(results.metadata.phase_status(Phase::Inject), Some(&PhaseStatus::Skipped("disabled".to_string())));
    assert!(matches!(results.metadata.phase_status(Phase::ExternalTools), Some(PhaseStatus::Skipped(_))));
    assert!(results.external.is_empty());
    // Only the fingerprint request reaches the target.
    assert_eq!(prober.requests(), vec!["https://example.test/"]);
}

/// Echoes the `test` parameter into every page unescaped.
struct Reflect;

impl Respond for Reflect {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let echoed: String = request.url.query_pairs().filter(|(k, _)| k == "test").map(|(_, v)| v.into_owned()).collect();
        ResponseTemplate::new(200).set_body_raw(
            format!(r#"<html><body><a href="/about">about</a><p>{echoed}</p></body></html>"#),
            "text/html",
        )
    }
}

#[tokio::test]
async fn test_full_scan_against_live_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET")).respond_with(Reflect).mount(&server).await;

    let config = ScanConfig {
        threads: 4,
        retries: 0,
        crawl: true,
        inject: true,
        max_crawl_depth: 1,
        ..quiet_config()
    };
    let engine = ShadowEngine::builder(config)
        .with_wordlists(Box::new(StaticWordlists::default().with(DIRECTORIES, &["admin"])))
        .with_tools(Vec::new())
        .with_reporter(None)
        .build()
        .unwrap();

    let results = engine.discover_attack_surface(&server.uri()).await;

    assert!(results.metadata.fatal_error.is_none());
    assert_eq!(results.metadata.categories["subdomains"], CategoryStatus::Skipped("IP target".to_string()));
    assert_eq!(results.directories.len(), 1);
    assert_eq!(results.metadata.counts["crawled_pages"], 2);
    assert!(results.vulnerabilities.iter().any(|v| v.kind == VulnKind::Xss && v.endpoint.ends_with("/admin")));
    assert!(results.metadata.peak_concurrency >= 1);
    assert!(results.metadata.peak_concurrency <= 4);
    assert_eq!(results.metadata.phase_status(Phase::ExternalTools), Some(&PhaseStatus::Completed));
}

#[tokio::test]
async fn test_batch_runs_on_a_spawned_task() {
    let config = ScanConfig { inject: true, crawl: true, max_crawl_depth: 1, ..quiet_config() };
    let engine = ShadowEngine::builder(config)
        .with_prober(stub_prober())
        .with_subdomain_source(Box::new(BrokenResolver))
        .with_tools(Vec::new())
        .with_reporter(None)
        .build()
        .unwrap();
    let targets = vec!["bad host!".to_string(), "example.test".to_string()];

    let handle = tokio::spawn(async move { engine.discover_multiple_targets(&targets).await });
    let results = handle.await.unwrap();

    assert_eq!(results.len(), 2);
    assert!(results[0].metadata.fatal_error.is_some());
    assert_eq!(results[1].metadata.phase_status(Phase::Inject), Some(&PhaseStatus::Completed));
}

#[test]
fn test_unrepresentable_delay_is_rejected_at_build() {
    let config = ScanConfig { delay: 1e300, ..quiet_config() };
    let outcome = ShadowEngine::builder(config).with_prober(stub_prober()).build();
    assert!(matches!(outcome, Err(ScanError::Config(ConfigError::Invalid { field: "delay", .. }))));
}

/// Answers every request after a short pause, tracking how many are in flight at once.
#[derive(Default)]
struct CountingProber {
    in_flight: AtomicUsize,
    max: AtomicUsize,
    total: AtomicUsize,
}

#[async_trait]
impl Prober for CountingProber {
    async fn request(&self, request: ProbeRequest) -> ProbeResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max.fetch_max(now, Ordering::SeqCst);
        self.total.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(5)).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let body = if request.url.path() == "/" {
            r#"<html><body><a href="/dir1">one</a><a href="/dir2">two</a>
               <form action="/login"><input name="user"></form></body></html>"#
        } else {
            "<html><body>page</body></html>"
        };
        html(&request, 200, body)
    }
}

#[tokio::test]
async fn test_full_scan_never_exceeds_thread_budget() {
    let words: Vec<String> = (0..60).map(|i| format!("dir{i}")).collect();
    let words: Vec<&str> = words.iter().map(String::as_str).collect();
    let prober = Arc::new(CountingProber::default());
    let config = ScanConfig {
        threads: 3,
        crawl: true,
        inject: true,
        max_crawl_depth: 1,
        payloads: vec!["xss".to_string(), "lfi".to_string(), "sqli".to_string()],
        ..quiet_config()
    };
    let engine = ShadowEngine::builder(config)
        .with_prober(prober.clone())
        .with_wordlists(Box::new(StaticWordlists::default().with(DIRECTORIES, &words)))
        .with_subdomain_source(Box::new(BrokenResolver))
        .with_tools(Vec::new())
        .with_reporter(None)
        .build()
        .unwrap();

    let results = engine.discover_attack_surface("example.test").await;

    assert_eq!(results.directories.len(), 60);
    assert!(results.metadata.counts["crawled_pages"] >= 1);
    assert_eq!(results.metadata.phase_status(Phase::Inject), Some(&PhaseStatus::Completed));
    assert!(prober.total.load(Ordering::SeqCst) > 100);
    let max = prober.max.load(Ordering::SeqCst);
    assert!(max >= 2, "probes never overlapped");
    assert!(max <= 3, "saw {max} probes in flight");
    assert!(results.metadata.peak_concurrency <= 3);
}
