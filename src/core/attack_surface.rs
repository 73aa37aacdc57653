// src/core/attack_surface.rs

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::core::models::{ScanResults, Severity};

// --- Keyword Tables ---

const HIGH_VALUE_SUBDOMAINS: &[&str] = &[
    "admin", "administrator", "panel", "dashboard", "api", "dev", "staging", "test", "internal", "mail", "webmail",
    "ftp", "vpn", "remote",
];

const HIGH_VALUE_ENDPOINTS: &[&str] = &[
    "/admin", "/administrator", "/panel", "/dashboard", "/api", "/graphql", "/login", "/signin", "/upload", "/uploads",
    "/files", "/backup",
];

const LFI_KEYWORDS: &[&str] = &["file", "path", "page", "include"];
const SSRF_KEYWORDS: &[&str] = &["url", "redirect", "proxy", "fetch"];
const XSS_KEYWORDS: &[&str] = &["q", "search", "query", "term"];

// Subdomain labels that imply an API even when no technology rule fired.
const API_HINTS: &[&str] = &["api", "rest", "graphql"];

/// A lead worth following up manually.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackVector {
    pub kind: String,
    pub target: String,
    pub description: String,
    pub priority: Severity,
}

/// A summary view over one scan's findings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttackSurface {
    pub target: String,
    pub totals: BTreeMap<String, usize>,
    pub endpoints: Vec<String>,
    pub high_value_targets: Vec<String>,
    pub attack_vectors: Vec<AttackVector>,
    pub technologies: Vec<String>,
    pub duration_seconds: f64,
}

impl AttackSurface {
    /// Folds finished results into the summary.
    pub fn map(results: &ScanResults) -> Self {
        let endpoints: BTreeSet<String> = results.directories.iter().map(|dir| dir.url.clone()).collect();
        let technologies: BTreeSet<String> = results.technologies.iter().map(|tech| tech.name.clone()).collect();

        let mut totals = BTreeMap::new();
        totals.insert("subdomains".to_string(), results.subdomains.len());
        totals.insert("endpoints".to_string(), endpoints.len());
        totals.insert("parameters".to_string(), results.parameters.len());
        totals.insert("technologies".to_string(), technologies.len());
        totals.insert("inputs".to_string(), results.inputs.len());
        totals.insert("vulnerabilities".to_string(), results.vulnerabilities.len());
        totals.insert("external".to_string(), results.external.len());

        let high_value_targets = high_value_targets(&results.target, &results.subdomains, &endpoints);
        let attack_vectors = attack_vectors(results, &endpoints);

        Self {
            target: results.target.clone(),
            totals,
            endpoints: endpoints.into_iter().collect(),
            high_value_targets,
            attack_vectors,
            technologies: technologies.into_iter().collect(),
            duration_seconds: results.metadata.duration_seconds,
        }
    }

    /// A 0-100 score weighted by vulnerability severity and exposed surface.
    pub fn exposure_score(&self, results: &ScanResults) -> u32 {
        let vulns: u32 = results
            .vulnerabilities
            .iter()
            .map(|v| match v.severity {
                Severity::Critical => 25,
                Severity::High => 15,
                Severity::Medium => 8,
                Severity::Low => 3,
                Severity::Info => 1,
            })
            .sum();
        let surface = (self.high_value_targets.len() as u32) * 3 + (self.attack_vectors.len() as u32) * 2;
        (vulns + surface).min(100)
    }
}

fn high_value_targets(target: &str, subdomains: &[String], endpoints: &BTreeSet<String>) -> Vec<String> {
    let zone = format!(".{}", target.to_ascii_lowercase());
    let mut found = BTreeSet::new();
    for subdomain in subdomains {
        // Only the labels below the target's zone are matched.
        let lowered = subdomain.to_ascii_lowercase();
        let lowered = lowered.strip_suffix(&zone).unwrap_or(&lowered);
        if HIGH_VALUE_SUBDOMAINS.iter().any(|pattern| lowered.contains(pattern)) {
            found.insert(subdomain.clone());
        }
    }
    for endpoint in endpoints {
        let lowered = endpoint.to_ascii_lowercase();
        if HIGH_VALUE_ENDPOINTS.iter().any(|pattern| lowered.contains(pattern)) {
            found.insert(endpoint.clone());
        }
    }
    found.into_iter().collect()
}

fn attack_vectors(results: &ScanResults, endpoints: &BTreeSet<String>) -> Vec<AttackVector> {
    let mut vectors = Vec::new();
    for param in &results.parameters {
        let name = param.name.to_ascii_lowercase();
        // Single-letter keywords must match the whole name.
        let matches = |keywords: &[&str]| {
            keywords.iter().any(|keyword| if keyword.len() == 1 { name == *keyword } else { name.contains(keyword) })
        };
        if matches(LFI_KEYWORDS) {
            vectors.push(vector("lfi", &param.name, format!("Potential LFI via parameter: {}", param.name), Severity::High));
        }
        if matches(SSRF_KEYWORDS) {
            vectors.push(vector("ssrf", &param.name, format!("Potential SSRF via parameter: {}", param.name), Severity::High));
        }
        if matches(XSS_KEYWORDS) {
            vectors.push(vector("xss", &param.name, format!("Potential XSS via parameter: {}", param.name), Severity::Medium));
        }
    }

    if results.technologies.iter().any(|tech| tech.name.eq_ignore_ascii_case("wordpress")) {
        vectors.push(vector(
            "cms",
            "wordpress",
            "WordPress installation detected - check for vulnerable plugins".to_string(),
            Severity::Medium,
        ));
    }

    let api_subdomain = results.subdomains.iter().any(|sub| {
        let label = sub.split('.').next().unwrap_or_default().to_ascii_lowercase();
        API_HINTS.iter().any(|hint| label.contains(hint))
    });
    let api_endpoint = endpoints.iter().any(|url| url.contains("/api") || url.contains("/graphql"));
    if api_subdomain || api_endpoint {
        vectors.push(vector(
            "api",
            "api_endpoints",
            "API endpoints detected - test for injection vulnerabilities".to_string(),
            Severity::High,
        ));
    }
    vectors
}

fn vector(kind: &str, target: &str, description: String, priority: Severity) -> AttackVector {
    AttackVector { kind: kind.to_string(), target: target.to_string(), description, priority }
}
