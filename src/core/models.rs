// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use crate::core::attack_surface::AttackSurface;

// --- Probe Models ---

/// Why a probe produced no HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ProbeFailure {
    Timeout,
    Connection,
    Protocol,
}

/// The outcome of a single HTTP probe.
///
/// A probe never fails with an error value: transport problems are reported
/// through `error`, with `status` left empty. Header names are lowercased so
/// lookups are case-insensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeResult {
    pub url: String,
    pub status: Option<u16>,
    pub headers: HashMap<String, String>,
    pub body: String,
    /// Set when the body hit the size cap and was cut short.
    pub truncated: bool,
    pub content_length: usize,
    pub content_type: String,
    #[serde(with = "duration_millis")]
    pub elapsed: Duration,
    pub error: Option<ProbeFailure>,
}

impl ProbeResult {
    /// Builds a successful result. Header names are lowercased on the way in.
    pub fn response(url: impl Into<String>, status: u16, headers: HashMap<String, String>, body: impl Into<String>) -> Self {
        let headers: HashMap<String, String> = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        let body = body.into();
        let content_type = headers.get("content-type").cloned().unwrap_or_default();
        Self {
            url: url.into(),
            status: Some(status),
            content_length: body.len(),
            content_type,
            headers,
            body,
            truncated: false,
            elapsed: Duration::ZERO,
            error: None,
        }
    }

    /// Builds a result for a probe that never got a response.
    pub fn failure(url: impl Into<String>, kind: ProbeFailure, elapsed: Duration) -> Self {
        Self {
            url: url.into(),
            status: None,
            headers: HashMap::new(),
            body: String::new(),
            truncated: false,
            content_length: 0,
            content_type: String::new(),
            elapsed,
            error: Some(kind),
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }

    /// Timeouts and connection errors are worth retrying; protocol errors are not.
    pub fn is_transient_failure(&self) -> bool {
        matches!(self.error, Some(ProbeFailure::Timeout | ProbeFailure::Connection))
    }

    pub fn is_html(&self) -> bool {
        if self.content_type.is_empty() {
            let head: String = self.body.chars().take(512).collect::<String>().to_ascii_lowercase();
            return head.contains("<html") || head.contains("<!doctype html");
        }
        self.content_type.to_ascii_lowercase().contains("html")
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}

// --- Findings ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Severity {
    Critical,
    High,
    Medium,
    Low,
    Info,
}

/// The vulnerability classes a hunter can report.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum VulnKind {
    Xss,
    Lfi,
    Ssrf,
    Sqli,
    #[strum(to_string = "command_injection", serialize = "rce")]
    #[serde(rename = "command_injection")]
    CommandInjection,
    #[strum(to_string = "template_injection", serialize = "ssti")]
    #[serde(rename = "template_injection")]
    TemplateInjection,
    #[strum(to_string = "directory_traversal", serialize = "traversal")]
    #[serde(rename = "directory_traversal")]
    DirectoryTraversal,
    Csrf,
}

/// A path that answered with an existence status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryFinding {
    pub url: String,
    pub path: String,
    pub status: u16,
    pub content_length: usize,
    pub content_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ParameterOrigin {
    Wordlist,
    Crawler,
    External,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterFinding {
    pub name: String,
    pub origin: ParameterOrigin,
}

/// A single detected technology, such as a web server or library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub category: String,
    pub version: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputField {
    pub name: String,
    pub kind: String,
    pub required: bool,
}

/// A form discovered on a crawled page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    /// The page the form was found on.
    pub page: String,
    /// The absolute URL the form submits to.
    pub action: String,
    pub method: String,
    pub fields: Vec<InputField>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vulnerability {
    pub kind: VulnKind,
    pub severity: Severity,
    /// The endpoint that was tested, without the injected payload.
    pub endpoint: String,
    /// The exact URL that triggered the detection.
    pub url: String,
    pub parameter: Option<String>,
    pub payload: String,
    pub evidence: String,
    pub method: String,
}

/// Something reported by a wrapped command-line tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalFinding {
    pub tool: String,
    pub kind: String,
    pub value: String,
    pub detail: Option<String>,
}

/// Every kind of observation a scan stage can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Finding {
    Subdomain(String),
    Directory(DirectoryFinding),
    Parameter(ParameterFinding),
    Technology(Technology),
    FormInput(FormInput),
    Vulnerability(Vulnerability),
    External(ExternalFinding),
}

// --- Passive Analyzer Models ---

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsRecords {
    pub a: Vec<String>,
    pub mx: Vec<String>,
    pub ns: Vec<String>,
    pub txt: Vec<String>,
    /// True when a random label under the domain resolves.
    pub wildcard: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
    /// Subject alternative names with any leading `*.` removed.
    pub domains: Vec<String>,
}

// --- Phases ---

/// The ordered stages of a single-target scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Mapping,
    TechDetect,
    Crawl,
    Inject,
    ExternalTools,
    Report,
    Done,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum PhaseStatus {
    Completed,
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub status: PhaseStatus,
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
}

/// Whether a discovery or hunting category actually ran.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum CategoryStatus {
    Ran,
    Unavailable(String),
    Failed(String),
    Skipped(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseFlags {
    pub deep: bool,
    pub crawl: bool,
    pub inject: bool,
    pub passive: bool,
    pub external: bool,
}

// --- Aggregate Results ---

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scan_start: DateTime<Utc>,
    pub scan_end: Option<DateTime<Utc>>,
    pub duration_seconds: f64,
    pub flags: PhaseFlags,
    pub threads: usize,
    pub timeout_seconds: u64,
    pub phases: Vec<PhaseRecord>,
    pub categories: BTreeMap<String, CategoryStatus>,
    pub counts: BTreeMap<String, usize>,
    pub probe_failures: usize,
    pub peak_concurrency: usize,
    pub cancelled: bool,
    pub fatal_error: Option<String>,
    pub reports: BTreeMap<String, PathBuf>,
}

impl ScanMetadata {
    pub fn new(flags: PhaseFlags, threads: usize, timeout_seconds: u64) -> Self {
        Self {
            scan_start: Utc::now(),
            scan_end: None,
            duration_seconds: 0.0,
            flags,
            threads,
            timeout_seconds,
            phases: Vec::new(),
            categories: BTreeMap::new(),
            counts: BTreeMap::new(),
            probe_failures: 0,
            peak_concurrency: 0,
            cancelled: false,
            fatal_error: None,
            reports: BTreeMap::new(),
        }
    }

    pub fn phase_status(&self, phase: Phase) -> Option<&PhaseStatus> {
        self.phases.iter().find(|record| record.phase == phase).map(|record| &record.status)
    }
}

/// Everything learned about one target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResults {
    pub target: String,
    pub subdomains: Vec<String>,
    pub directories: Vec<DirectoryFinding>,
    pub parameters: Vec<ParameterFinding>,
    pub technologies: Vec<Technology>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub inputs: Vec<FormInput>,
    pub external: Vec<ExternalFinding>,
    pub dns: Option<DnsRecords>,
    pub certificate: Option<CertificateInfo>,
    pub attack_surface: Option<AttackSurface>,
    pub metadata: ScanMetadata,
}

impl ScanResults {
    pub fn new(target: impl Into<String>, metadata: ScanMetadata) -> Self {
        Self {
            target: target.into(),
            subdomains: Vec::new(),
            directories: Vec::new(),
            parameters: Vec::new(),
            technologies: Vec::new(),
            vulnerabilities: Vec::new(),
            inputs: Vec::new(),
            external: Vec::new(),
            dns: None,
            certificate: None,
            attack_surface: None,
            metadata,
        }
    }

    pub fn finding_count(&self) -> usize {
        self.subdomains.len()
            + self.directories.len()
            + self.parameters.len()
            + self.technologies.len()
            + self.vulnerabilities.len()
            + self.inputs.len()
            + self.external.len()
    }

    pub fn count_by_severity(&self, severity: Severity) -> usize {
        self.vulnerabilities.iter().filter(|v| v.severity == severity).count()
    }
}
