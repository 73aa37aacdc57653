// src/core/accumulator.rs

use std::collections::HashSet;

use crate::core::models::{
    DirectoryFinding, ExternalFinding, Finding, FormInput, ParameterFinding, ScanResults, Technology, VulnKind,
    Vulnerability,
};

/// Append-only, deduplicating collector for the findings of one scan.
///
/// Owned by the orchestrator; stages hand their findings back as values and
/// the orchestrator folds them in here, so no two tasks ever share it.
#[derive(Debug, Default)]
pub struct ResultsAccumulator {
    subdomains: Vec<String>,
    directories: Vec<DirectoryFinding>,
    parameters: Vec<ParameterFinding>,
    technologies: Vec<Technology>,
    vulnerabilities: Vec<Vulnerability>,
    inputs: Vec<FormInput>,
    external: Vec<ExternalFinding>,

    // --- Dedup Indexes ---
    seen_subdomains: HashSet<String>,
    seen_directories: HashSet<String>,
    seen_parameters: HashSet<String>,
    seen_technologies: HashSet<String>,
    seen_vulnerabilities: HashSet<(String, VulnKind)>,
    seen_inputs: HashSet<(String, String, String)>,
    seen_external: HashSet<(String, String, String)>,
}

impl ResultsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finding, returning `false` when an equal one is already present.
    ///
    /// Subdomains, parameters and technologies are keyed by name, directories
    /// by full URL (so `http` and `https` hits stay distinct), vulnerabilities
    /// by endpoint and kind, and forms by page, action and method.
    pub fn add(&mut self, finding: Finding) -> bool {
        match finding {
            Finding::Subdomain(name) => {
                let name = name.trim_end_matches('.').to_ascii_lowercase();
                insert(&mut self.seen_subdomains, name.clone(), &mut self.subdomains, name)
            }
            Finding::Directory(dir) => insert(&mut self.seen_directories, dir.url.clone(), &mut self.directories, dir),
            Finding::Parameter(param) => {
                insert(&mut self.seen_parameters, param.name.clone(), &mut self.parameters, param)
            }
            Finding::Technology(tech) => {
                insert(&mut self.seen_technologies, tech.name.to_ascii_lowercase(), &mut self.technologies, tech)
            }
            Finding::Vulnerability(vuln) => {
                let key = (vuln.endpoint.clone(), vuln.kind);
                insert(&mut self.seen_vulnerabilities, key, &mut self.vulnerabilities, vuln)
            }
            Finding::FormInput(form) => {
                let key = (form.page.clone(), form.action.clone(), form.method.clone());
                insert(&mut self.seen_inputs, key, &mut self.inputs, form)
            }
            Finding::External(ext) => {
                let key = (ext.tool.clone(), ext.kind.clone(), ext.value.clone());
                insert(&mut self.seen_external, key, &mut self.external, ext)
            }
        }
    }

    /// Adds every finding, returning how many were new.
    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) -> usize {
        findings.into_iter().map(|finding| self.add(finding)).filter(|added| *added).count()
    }

    pub fn subdomains(&self) -> &[String] {
        &self.subdomains
    }

    pub fn directories(&self) -> &[DirectoryFinding] {
        &self.directories
    }

    pub fn parameters(&self) -> &[ParameterFinding] {
        &self.parameters
    }

    pub fn technologies(&self) -> &[Technology] {
        &self.technologies
    }

    pub fn vulnerabilities(&self) -> &[Vulnerability] {
        &self.vulnerabilities
    }

    pub fn inputs(&self) -> &[FormInput] {
        &self.inputs
    }

    pub fn external(&self) -> &[ExternalFinding] {
        &self.external
    }

    pub fn len(&self) -> usize {
        self.subdomains.len()
            + self.directories.len()
            + self.parameters.len()
            + self.technologies.len()
            + self.vulnerabilities.len()
            + self.inputs.len()
            + self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Copies the collected findings into `results`, with subdomains sorted.
    pub fn fill(&self, results: &mut ScanResults) {
        let mut subdomains = self.subdomains.clone();
        subdomains.sort();
        results.subdomains = subdomains;
        results.directories = self.directories.clone();
        results.parameters = self.parameters.clone();
        results.technologies = self.technologies.clone();
        results.vulnerabilities = self.vulnerabilities.clone();
        results.inputs = self.inputs.clone();
        results.external = self.external.clone();
    }
}

fn insert<K: Eq + std::hash::Hash, T>(index: &mut HashSet<K>, key: K, items: &mut Vec<T>, item: T) -> bool {
    if !index.insert(key) {
        return false;
    }
    items.push(item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{ParameterOrigin, Severity};

    fn directory(url: &str) -> DirectoryFinding {
        DirectoryFinding {
            url: url.to_string(),
            path: "admin".to_string(),
            status: 200,
            content_length: 10,
            content_type: "text/html".to_string(),
        }
    }

    fn vulnerability(endpoint: &str, kind: VulnKind, payload: &str) -> Vulnerability {
        Vulnerability {
            kind,
            severity: Severity::High,
            endpoint: endpoint.to_string(),
            url: format!("{endpoint}?x={payload}"),
            parameter: Some("x".to_string()),
            payload: payload.to_string(),
            evidence: String::new(),
            method: "GET".to_string(),
        }
    }

    #[test]
    fn subdomains_dedupe_case_insensitively() {
        let mut acc = ResultsAccumulator::new();
        assert!(acc.add(Finding::Subdomain("api.example.test".into())));
        assert!(!acc.add(Finding::Subdomain("API.example.test.".into())));
        assert_eq!(acc.subdomains(), ["api.example.test".to_string()]);
    }

    #[test]
    fn directories_keep_scheme_variants() {
        let mut acc = ResultsAccumulator::new();
        acc.add(Finding::Directory(directory("https://example.test/admin")));
        acc.add(Finding::Directory(directory("http://example.test/admin")));
        acc.add(Finding::Directory(directory("https://example.test/admin")));
        assert_eq!(acc.directories().len(), 2);
    }

    #[test]
    fn vulnerabilities_keyed_by_endpoint_and_kind() {
        let mut acc = ResultsAccumulator::new();
        let endpoint = "https://example.test/search";
        assert!(acc.add(Finding::Vulnerability(vulnerability(endpoint, VulnKind::Xss, "a"))));
        assert!(!acc.add(Finding::Vulnerability(vulnerability(endpoint, VulnKind::Xss, "b"))));
        assert!(acc.add(Finding::Vulnerability(vulnerability(endpoint, VulnKind::Lfi, "a"))));
        assert_eq!(acc.vulnerabilities().len(), 2);
    }

    #[test]
    fn extend_counts_new_findings_only() {
        let mut acc = ResultsAccumulator::new();
        let param = |name: &str, origin| Finding::Parameter(ParameterFinding { name: name.to_string(), origin });
        let added = acc.extend(vec![
            param("id", ParameterOrigin::Wordlist),
            param("id", ParameterOrigin::Crawler),
            param("page", ParameterOrigin::Crawler),
        ]);
        assert_eq!(added, 2);
        assert_eq!(acc.parameters()[0].origin, ParameterOrigin::Wordlist);
        assert_eq!(acc.len(), 2);
    }
}
