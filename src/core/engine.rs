// src/core/engine.rs

use chrono::Utc;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::config::ScanConfig;
use crate::core::accumulator::ResultsAccumulator;
use crate::core::attack_surface::AttackSurface;
use crate::core::cancel::{cancel_pair, CancelHandle, CancelSignal};
use crate::core::error::ScanError;
use crate::core::hunters::{injection_endpoints, HunterRegistry};
use crate::core::integrations::{enabled_tools, ExternalTool, ToolJob};
use crate::core::models::{
    CategoryStatus, Finding, ParameterOrigin, ParameterFinding, Phase, PhaseRecord, PhaseStatus, ScanMetadata,
    ScanResults,
};
use crate::core::probe::{BudgetedProber, ConcurrencyBudget, ProbeClient, ProbeOptions, Prober};
use crate::core::reporter::{JsonReporter, Reporter};
use crate::core::scanner::crawler::WebCrawler;
use crate::core::scanner::directory_scanner::HttpDirectoryScanner;
use crate::core::scanner::dns_scanner::DnsAnalyzer;
use crate::core::scanner::fingerprint_scanner::HttpTechnologyDetector;
use crate::core::scanner::parameter_scanner::WordlistParameterSource;
use crate::core::scanner::ssl_scanner::CertificateAnalyzer;
use crate::core::scanner::subdomain_scanner::DnsSubdomainScanner;
use crate::core::scanner::{
    fan_out, CrawlSource, Discovery, DirectorySource, ParameterSource, ScanContext, SubdomainSource, TechnologySource,
};
use crate::core::target::Target;
use crate::core::wordlists::{BuiltinWordlists, FileWordlists, WordlistProvider, DIRECTORIES};

/// Progress notifications for a front end.
#[derive(Debug, Clone)]
pub enum ScanEvent {
    TargetStarted { target: String, index: usize, total: usize },
    PhaseStarted { target: String, phase: Phase },
    PhaseFinished { target: String, phase: Phase, status: PhaseStatus },
    Finished(Box<ScanResults>),
}

// --- Phase Cursor ---

/// Tracks the current phase and refuses to move backwards.
#[derive(Debug, Default)]
pub struct PhaseCursor {
    current: Option<Phase>,
    started: Option<chrono::DateTime<Utc>>,
    records: Vec<PhaseRecord>,
}

impl PhaseCursor {
    pub fn current(&self) -> Option<Phase> {
        self.current
    }

    /// Moves to `phase`. Returns `false`, leaving the cursor untouched, when
    /// `phase` is not strictly after the current one.
    pub fn enter(&mut self, phase: Phase) -> bool {
        if self.current.is_some_and(|current| phase <= current) {
            warn!(phase = %phase, current = ?self.current, "Refusing to move the phase cursor backwards.");
            return false;
        }
        self.current = Some(phase);
        self.started = Some(Utc::now());
        true
    }

    /// Records how the current phase ended.
    pub fn finish(&mut self, status: PhaseStatus) -> Option<&PhaseRecord> {
        let phase = self.current?;
        let started = self.started.take()?;
        self.records.push(PhaseRecord { phase, status, started, finished: Utc::now() });
        self.records.last()
    }

    pub fn into_records(self) -> Vec<PhaseRecord> {
        self.records
    }
}

// --- Engine ---

/// The scan orchestrator.
///
/// Runs the phases `mapping → tech_detect → crawl → inject → external_tools →
/// report` for one target at a time. A failing stage is recorded against its
/// phase and category and the scan moves on; every call returns a complete
/// `ScanResults`.
pub struct ShadowEngine {
    config: ScanConfig,
    budget: Arc<ConcurrencyBudget>,
    prober: Option<Arc<dyn Prober>>,
    wordlists: Box<dyn WordlistProvider>,
    subdomains: Box<dyn SubdomainSource>,
    directories: Box<dyn DirectorySource>,
    parameters: Box<dyn ParameterSource>,
    technologies: Box<dyn TechnologySource>,
    crawler: Box<dyn CrawlSource>,
    hunters: HunterRegistry,
    tools: Vec<Box<dyn ExternalTool>>,
    reporter: Option<Box<dyn Reporter>>,
    dns: DnsAnalyzer,
    certificates: CertificateAnalyzer,
    events: Option<mpsc::UnboundedSender<ScanEvent>>,
    cancel_handle: CancelHandle,
    cancel: CancelSignal,
}

/// Assembles a `ShadowEngine`, replacing any default component.
pub struct EngineBuilder {
    config: ScanConfig,
    prober: Option<Arc<dyn Prober>>,
    wordlists: Option<Box<dyn WordlistProvider>>,
    subdomains: Option<Box<dyn SubdomainSource>>,
    directories: Option<Box<dyn DirectorySource>>,
    parameters: Option<Box<dyn ParameterSource>>,
    technologies: Option<Box<dyn TechnologySource>>,
    crawler: Option<Box<dyn CrawlSource>>,
    hunters: Option<HunterRegistry>,
    tools: Option<Vec<Box<dyn ExternalTool>>>,
    reporter: Option<Option<Box<dyn Reporter>>>,
    events: Option<mpsc::UnboundedSender<ScanEvent>>,
}

impl EngineBuilder {
    /// Uses `prober` for every request instead of a per-target HTTP client.
    pub fn with_prober(mut self, prober: Arc<dyn Prober>) -> Self {
        self.prober = Some(prober);
        self
    }

    pub fn with_wordlists(mut self, wordlists: Box<dyn WordlistProvider>) -> Self {
        self.wordlists = Some(wordlists);
        self
    }

    pub fn with_subdomain_source(mut self, source: Box<dyn SubdomainSource>) -> Self {
        self.subdomains = Some(source);
        self
    }

    pub fn with_directory_source(mut self, source: Box<dyn DirectorySource>) -> Self {
        self.directories = Some(source);
        self
    }

    pub fn with_parameter_source(mut self, source: Box<dyn ParameterSource>) -> Self {
        self.parameters = Some(source);
        self
    }

    pub fn with_technology_source(mut self, source: Box<dyn TechnologySource>) -> Self {
        self.technologies = Some(source);
        self
    }

    pub fn with_crawler(mut self, crawler: Box<dyn CrawlSource>) -> Self {
        self.crawler = Some(crawler);
        self
    }

    pub fn with_hunters(mut self, hunters: HunterRegistry) -> Self {
        self.hunters = Some(hunters);
        self
    }

    pub fn with_tools(mut self, tools: Vec<Box<dyn ExternalTool>>) -> Self {
        self.tools = Some(tools);
        self
    }

    /// `None` disables report files entirely.
    pub fn with_reporter(mut self, reporter: Option<Box<dyn Reporter>>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    pub fn with_events(mut self, events: mpsc::UnboundedSender<ScanEvent>) -> Self {
        self.events = Some(events);
        self
    }

    /// Validates the configuration and fills in every component not supplied.
    pub fn build(self) -> Result<ShadowEngine, ScanError> {
        let config = self.config;
        config.validate()?;

        let wordlists: Box<dyn WordlistProvider> = match (self.wordlists, &config.wordlist_file) {
            (Some(wordlists), _) => wordlists,
            (None, Some(path)) => Box::new(FileWordlists::load(path)?),
            (None, None) => Box::new(BuiltinWordlists),
        };
        let hunters = match self.hunters {
            Some(hunters) => hunters,
            None => HunterRegistry::from_categories(&config.payloads, wordlists.as_ref())?,
        };
        let tools = self.tools.unwrap_or_else(|| enabled_tools(&config.tools));
        let reporter = self
            .reporter
            .unwrap_or_else(|| Some(Box::new(JsonReporter::new(config.output_dir.clone())) as Box<dyn Reporter>));
        let (cancel_handle, cancel) = cancel_pair();

        debug!(
            threads = config.threads,
            hunters = hunters.hunters().len(),
            tools = tools.len(),
            "Scan engine assembled."
        );

        Ok(ShadowEngine {
            budget: ConcurrencyBudget::new(config.threads),
            prober: self.prober,
            wordlists,
            subdomains: self.subdomains.unwrap_or_else(|| Box::new(DnsSubdomainScanner::new())),
            directories: self.directories.unwrap_or_else(|| Box::new(HttpDirectoryScanner)),
            parameters: self.parameters.unwrap_or_else(|| Box::new(WordlistParameterSource)),
            technologies: self.technologies.unwrap_or_else(|| Box::new(HttpTechnologyDetector)),
            crawler: self
                .crawler
                .unwrap_or_else(|| Box::new(WebCrawler::new(config.max_crawl_depth, config.max_crawl_pages))),
            hunters,
            tools,
            reporter,
            dns: DnsAnalyzer::new(),
            certificates: CertificateAnalyzer,
            events: self.events,
            cancel_handle,
            cancel,
            config,
        })
    }
}

impl ShadowEngine {
    /// An engine with every default component.
    pub fn new(config: ScanConfig) -> Result<Self, ScanError> {
        Self::builder(config).build()
    }

    pub fn builder(config: ScanConfig) -> EngineBuilder {
        EngineBuilder {
            config,
            prober: None,
            wordlists: None,
            subdomains: None,
            directories: None,
            parameters: None,
            technologies: None,
            crawler: None,
            hunters: None,
            tools: None,
            reporter: None,
            events: None,
        }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// A handle that stops this engine's scans. In-flight probes settle, the
    /// remaining phases are skipped and the results are still reported.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel_handle.clone()
    }

    pub fn budget(&self) -> &Arc<ConcurrencyBudget> {
        &self.budget
    }

    /// Scans targets one after another, waiting the configured delay between
    /// them. Invalid targets produce results carrying a fatal error; the
    /// batch stops early only on cancellation.
    pub async fn discover_multiple_targets(&self, targets: &[String]) -> Vec<ScanResults> {
        let mut all = Vec::with_capacity(targets.len());
        let delay = self.config.delay_duration();
        for (index, target) in targets.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!(remaining = targets.len() - index, "Scan cancelled, skipping remaining targets.");
                break;
            }
            if index > 0 && !delay.is_zero() {
                debug!(delay_secs = self.config.delay, "Waiting before next target.");
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = self.cancel.cancelled() => break,
                }
            }
            self.emit(ScanEvent::TargetStarted { target: target.clone(), index, total: targets.len() });
            all.push(self.discover_attack_surface(target).await);
        }
        all
    }

    /// Runs the full phase sequence against one target.
    pub async fn discover_attack_surface(&self, input: &str) -> ScanResults {
        let clock = Instant::now();
        let metadata = ScanMetadata::new(self.config.flags(), self.config.threads, self.config.timeout);
        let mut results = ScanResults::new(input.trim(), metadata);

        let target = match Target::parse(input) {
            Ok(target) => target,
            Err(e) => {
                error!(target = %input, error = %e, "Rejected scan target.");
                return self.abort(results, clock, ScanError::from(e));
            }
        };
        results.target = target.to_string();

        let prober: Arc<dyn Prober> = match &self.prober {
            // Injected probers share the thread budget with the built-in client.
            Some(prober) => Arc::new(BudgetedProber::new(Arc::clone(prober), Arc::clone(&self.budget))),
            None => {
                let options = ProbeOptions::from_config(&self.config);
                match ProbeClient::new(&options, Arc::clone(&self.budget), Some(target.clone())) {
                    Ok(client) => Arc::new(client),
                    Err(e) => {
                        error!(target = %target, error = %e, "Could not build the HTTP client.");
                        return self.abort(results, clock, e);
                    }
                }
            }
        };

        info!(target = %target, flags = ?results.metadata.flags, "Starting attack surface discovery.");
        let ctx = ScanContext {
            prober: prober.as_ref(),
            wordlists: self.wordlists.as_ref(),
            concurrency: self.config.threads,
            retries: self.config.retries,
            deep: self.config.deep,
            schemes: &self.config.schemes,
            cancel: &self.cancel,
        };
        let mut run = TargetRun {
            engine: self,
            target: &target,
            ctx,
            acc: ResultsAccumulator::new(),
            results,
        };
        let mut cursor = PhaseCursor::default();

        for phase in [Phase::Mapping, Phase::TechDetect, Phase::Crawl, Phase::Inject, Phase::ExternalTools] {
            cursor.enter(phase);
            self.emit(ScanEvent::PhaseStarted { target: run.results.target.clone(), phase });
            let status = if self.cancel.is_cancelled() {
                PhaseStatus::Skipped("cancelled".to_string())
            } else {
                match phase {
                    Phase::Mapping => run.mapping().await,
                    Phase::TechDetect => run.tech_detect().await,
                    Phase::Crawl => run.crawl().await,
                    Phase::Inject => run.inject().await,
                    _ => run.external_tools().await,
                }
            };
            self.finish_phase(&mut cursor, &run.results.target, status);
        }

        // The report phase always runs, so partial results are never lost.
        cursor.enter(Phase::Report);
        self.emit(ScanEvent::PhaseStarted { target: run.results.target.clone(), phase: Phase::Report });
        let mut results = run.finish(clock);
        results.metadata.phases = cursor.records.clone();
        let status = self.report(&mut results);
        let target_name = results.target.clone();
        self.finish_phase(&mut cursor, &target_name, status);
        cursor.enter(Phase::Done);
        results.metadata.phases = cursor.into_records();

        info!(
            target = %results.target,
            findings = results.finding_count(),
            vulnerabilities = results.vulnerabilities.len(),
            duration_secs = results.metadata.duration_seconds,
            cancelled = results.metadata.cancelled,
            "Attack surface discovery finished."
        );
        self.emit(ScanEvent::Finished(Box::new(results.clone())));
        results
    }

    fn finish_phase(&self, cursor: &mut PhaseCursor, target: &str, status: PhaseStatus) {
        match &status {
            PhaseStatus::Completed => info!(target = %target, phase = ?cursor.current(), "Phase completed."),
            PhaseStatus::Skipped(reason) => info!(target = %target, phase = ?cursor.current(), reason = %reason, "Phase skipped."),
            PhaseStatus::Failed(reason) => warn!(target = %target, phase = ?cursor.current(), reason = %reason, "Phase failed."),
        }
        if let Some(record) = cursor.finish(status) {
            let event =
                ScanEvent::PhaseFinished { target: target.to_string(), phase: record.phase, status: record.status.clone() };
            self.emit(event);
        }
    }

    fn report(&self, results: &mut ScanResults) -> PhaseStatus {
        let Some(reporter) = &self.reporter else {
            return PhaseStatus::Skipped("no reporter".to_string());
        };
        match reporter.render(results, &self.config.report_formats) {
            Ok(written) => {
                results.metadata.reports = written;
                PhaseStatus::Completed
            }
            Err(e) => PhaseStatus::Failed(e.to_string()),
        }
    }

    /// Results for a target that never got past validation.
    fn abort(&self, mut results: ScanResults, clock: Instant, error: ScanError) -> ScanResults {
        results.metadata.fatal_error = Some(error.to_string());
        results.metadata.scan_end = Some(Utc::now());
        results.metadata.duration_seconds = clock.elapsed().as_secs_f64();
        results.metadata.cancelled = self.cancel.is_cancelled();
        results.attack_surface = Some(AttackSurface::map(&results));
        self.emit(ScanEvent::Finished(Box::new(results.clone())));
        results
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

// --- Per-target State ---

/// The mutable state of one target's scan. Only the orchestrator touches it;
/// stages receive the read-only `ScanContext` and hand findings back.
struct TargetRun<'a> {
    engine: &'a ShadowEngine,
    target: &'a Target,
    ctx: ScanContext<'a>,
    acc: ResultsAccumulator,
    results: ScanResults,
}

impl TargetRun<'_> {
    fn category(&mut self, name: impl Into<String>, status: CategoryStatus) {
        self.results.metadata.categories.insert(name.into(), status);
    }

    /// Records a discovery outcome and returns its findings, if any.
    fn settle<T>(&mut self, name: &str, outcome: Result<Discovery<T>, ScanError>, errors: &mut Vec<String>) -> Vec<T> {
        match outcome {
            Ok(discovery) => {
                info!(
                    category = name,
                    found = discovery.findings.len(),
                    probed = discovery.probed,
                    failed = discovery.failed,
                    "Discovery finished."
                );
                self.results.metadata.probe_failures += discovery.failed;
                self.category(name, CategoryStatus::Ran);
                discovery.findings
            }
            Err(ScanError::Unavailable(reason)) => {
                warn!(category = name, reason = %reason, "Discovery technique unavailable.");
                self.category(name, CategoryStatus::Unavailable(format!("{reason} is unavailable")));
                Vec::new()
            }
            Err(e) => {
                warn!(category = name, error = %e, "Discovery failed.");
                errors.push(format!("{name}: {e}"));
                self.category(name, CategoryStatus::Failed(e.to_string()));
                Vec::new()
            }
        }
    }

    fn root(&self) -> Option<Url> {
        self.target.base_urls(self.ctx.schemes).into_iter().next()
    }

    async fn mapping(&mut self) -> PhaseStatus {
        let engine = self.engine;
        let (target, ctx) = (self.target, self.ctx);
        let passive = engine.config.passive;
        let analyze_dns = engine.config.analyzers && !target.is_ip();

        let (subdomains, directories, parameters, dns) = tokio::join!(
            async {
                if target.is_ip() {
                    None
                } else {
                    Some(engine.subdomains.discover(target, ctx).await)
                }
            },
            async {
                if passive {
                    None
                } else {
                    Some(engine.directories.discover(target, ctx).await)
                }
            },
            engine.parameters.discover(target, ctx),
            async {
                if analyze_dns {
                    Some(engine.dns.analyze(target.host()).await)
                } else {
                    None
                }
            },
        );

        let mut errors = Vec::new();
        match subdomains {
            Some(outcome) => {
                let names = self.settle("subdomains", outcome, &mut errors);
                self.acc.extend(names.into_iter().map(Finding::Subdomain));
            }
            None => self.category("subdomains", CategoryStatus::Skipped("IP target".to_string())),
        }
        match directories {
            Some(outcome) => {
                let found = self.settle("directories", outcome, &mut errors);
                self.acc.extend(found.into_iter().map(Finding::Directory));
            }
            None => self.category("directories", CategoryStatus::Skipped("passive mode".to_string())),
        }
        let params = self.settle("parameters", parameters, &mut errors);
        self.acc.extend(params.into_iter().map(Finding::Parameter));

        match dns {
            Some(records) => {
                let empty = records.a.is_empty() && records.mx.is_empty() && records.ns.is_empty() && records.txt.is_empty();
                if empty {
                    self.category("dns", CategoryStatus::Failed("no records resolved".to_string()));
                } else {
                    self.category("dns", CategoryStatus::Ran);
                    self.results.dns = Some(records);
                }
            }
            None => self.category("dns", CategoryStatus::Skipped("analyzers disabled or IP target".to_string())),
        }

        if errors.is_empty() {
            PhaseStatus::Completed
        } else {
            PhaseStatus::Failed(errors.join("; "))
        }
    }

    async fn tech_detect(&mut self) -> PhaseStatus {
        let engine = self.engine;
        let status = match engine.technologies.detect(self.target, self.ctx).await {
            Ok(technologies) => {
                info!(count = technologies.len(), "Technologies detected.");
                self.acc.extend(technologies.into_iter().map(Finding::Technology));
                self.category("technologies", CategoryStatus::Ran);
                PhaseStatus::Completed
            }
            Err(e) => {
                self.category("technologies", CategoryStatus::Failed(e.to_string()));
                PhaseStatus::Failed(e.to_string())
            }
        };

        let https = self.target.base_urls(self.ctx.schemes).iter().any(|url| url.scheme() == "https");
        if !engine.config.analyzers || !https {
            self.category("certificate", CategoryStatus::Skipped("analyzers disabled or no https".to_string()));
            return status;
        }
        let port = self.target.port().unwrap_or(443);
        match engine.certificates.analyze(self.target.host(), port).await {
            Ok(Some(certificate)) => {
                for domain in &certificate.domains {
                    let in_scope = Url::parse(&format!("https://{domain}/")).is_ok_and(|url| self.target.in_scope(&url));
                    if in_scope && domain != self.target.host() {
                        self.acc.add(Finding::Subdomain(domain.clone()));
                    }
                }
                self.results.certificate = Some(certificate);
                self.category("certificate", CategoryStatus::Ran);
            }
            Ok(None) => self.category("certificate", CategoryStatus::Failed("no certificate presented".to_string())),
            Err(e) => {
                warn!(error = %e, "Certificate analysis failed.");
                self.category("certificate", CategoryStatus::Failed(e.to_string()));
            }
        }
        status
    }

    async fn crawl(&mut self) -> PhaseStatus {
        if !self.results.metadata.flags.crawl {
            self.category("crawler", CategoryStatus::Skipped("disabled".to_string()));
            return PhaseStatus::Skipped("disabled".to_string());
        }
        let engine = self.engine;
        match engine.crawler.crawl(self.target, self.ctx).await {
            Ok(report) => {
                self.results.metadata.probe_failures += report.failed;
                self.results.metadata.counts.insert("crawled_pages".to_string(), report.pages.len());
                let params = report
                    .parameters
                    .into_iter()
                    .map(|name| Finding::Parameter(ParameterFinding { name, origin: ParameterOrigin::Crawler }));
                let added = self.acc.extend(params);
                self.acc.extend(report.inputs.into_iter().map(Finding::FormInput));
                self.acc.extend(report.technologies.into_iter().map(Finding::Technology));
                info!(pages = report.pages.len(), new_parameters = added, "Crawl finished.");
                self.category("crawler", CategoryStatus::Ran);
                PhaseStatus::Completed
            }
            Err(e) => {
                self.category("crawler", CategoryStatus::Failed(e.to_string()));
                PhaseStatus::Failed(e.to_string())
            }
        }
    }

    async fn inject(&mut self) -> PhaseStatus {
        if !self.results.metadata.flags.inject {
            return PhaseStatus::Skipped("disabled".to_string());
        }
        let engine = self.engine;
        let hunters = &engine.hunters;
        if hunters.is_empty() {
            return PhaseStatus::Skipped("no payload categories".to_string());
        }
        let Some(root) = self.root() else {
            return PhaseStatus::Failed("no base URL for target".to_string());
        };
        let endpoints = injection_endpoints(
            &root,
            self.acc.directories(),
            self.acc.inputs(),
            self.acc.parameters(),
            engine.config.max_inject_endpoints,
        );
        info!(endpoints = endpoints.len(), hunters = hunters.hunters().len(), "Starting injection tests.");

        let ctx = self.ctx;
        let registered = hunters.hunters();
        let endpoints = &endpoints;
        // Owned (hunter, endpoint) indices keep the spawned scan future `Send`.
        let work: Vec<(usize, usize)> =
            (0..registered.len()).flat_map(|h| (0..endpoints.len()).map(move |e| (h, e))).collect();
        let found =
            fan_out(work, ctx.concurrency, ctx.cancel, move |(h, e)| registered[h].test_endpoint(&endpoints[e], ctx)).await;

        let added = self.acc.extend(found.into_iter().flatten().map(Finding::Vulnerability));
        for kind in hunters.kinds() {
            self.category(format!("hunter:{kind}"), CategoryStatus::Ran);
        }
        info!(vulnerabilities = added, "Injection tests finished.");
        PhaseStatus::Completed
    }

    async fn external_tools(&mut self) -> PhaseStatus {
        if !self.results.metadata.flags.external {
            return PhaseStatus::Skipped("no tools enabled".to_string());
        }
        let Some(root) = self.root() else {
            return PhaseStatus::Failed("no base URL for target".to_string());
        };
        let engine = self.engine;
        let wordlist = engine.wordlists.get(DIRECTORIES);
        let parameters: Vec<String> = self.acc.parameters().iter().map(|p| p.name.clone()).collect();
        let job = ToolJob {
            target: self.target,
            root: &root,
            wordlist: &wordlist,
            parameters: &parameters,
            timeout: Duration::from_secs(engine.config.tool_timeout),
            cancel: self.ctx.cancel,
        };

        let mut ran = 0;
        let mut errors = Vec::new();
        for tool in &engine.tools {
            let name = format!("tool:{}", tool.name());
            if self.ctx.cancel.is_cancelled() {
                self.category(name, CategoryStatus::Skipped("cancelled".to_string()));
                continue;
            }
            if !tool.available().await {
                self.category(name, CategoryStatus::Unavailable("not installed".to_string()));
                continue;
            }
            match tool.run(&job).await {
                Ok(findings) => {
                    ran += 1;
                    for finding in findings {
                        if finding.kind == "subdomain" {
                            let in_scope = Url::parse(&format!("https://{}/", finding.value))
                                .is_ok_and(|url| self.target.in_scope(&url));
                            if in_scope {
                                self.acc.add(Finding::Subdomain(finding.value.clone()));
                            }
                        }
                        self.acc.add(Finding::External(finding));
                    }
                    self.category(name, CategoryStatus::Ran);
                }
                Err(ScanError::Cancelled) => self.category(name, CategoryStatus::Skipped("cancelled".to_string())),
                Err(e) => {
                    warn!(tool = tool.name(), error = %e, "External tool failed.");
                    errors.push(e.to_string());
                    self.category(name, CategoryStatus::Failed(e.to_string()));
                }
            }
        }

        if ran == 0 && !errors.is_empty() {
            PhaseStatus::Failed(errors.join("; "))
        } else {
            PhaseStatus::Completed
        }
    }

    /// Moves the accumulated findings into the results and fills in the summary metadata.
    fn finish(self, clock: Instant) -> ScanResults {
        let TargetRun { engine, acc, mut results, .. } = self;
        acc.fill(&mut results);

        let counts = &mut results.metadata.counts;
        counts.insert("subdomains".to_string(), results.subdomains.len());
        counts.insert("directories".to_string(), results.directories.len());
        counts.insert("parameters".to_string(), results.parameters.len());
        counts.insert("technologies".to_string(), results.technologies.len());
        counts.insert("vulnerabilities".to_string(), results.vulnerabilities.len());
        counts.insert("inputs".to_string(), results.inputs.len());
        counts.insert("external".to_string(), results.external.len());

        results.metadata.scan_end = Some(Utc::now());
        results.metadata.duration_seconds = clock.elapsed().as_secs_f64();
        results.metadata.peak_concurrency = engine.budget.peak();
        results.metadata.cancelled = engine.cancel.is_cancelled();
        results.attack_surface = Some(AttackSurface::map(&results));
        results
    }
}
