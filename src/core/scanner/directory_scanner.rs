// src/core/scanner/directory_scanner.rs

use async_trait::async_trait;
use std::collections::HashSet;
use tracing::{debug, info};
use url::Url;

use super::{fan_out, DirectorySource, Discovery, ScanContext};
use crate::core::error::ScanError;
use crate::core::models::{DirectoryFinding, ProbeResult};
use crate::core::probe::ProbeRequest;
use crate::core::target::Target;
use crate::core::wordlists::{DIRECTORIES, DIRECTORIES_DEEP};

/// Status codes taken as evidence that a path exists.
pub const EXISTENCE_STATUSES: [u16; 6] = [200, 201, 202, 301, 302, 403];

/// Enumerates paths by requesting `<base>/<word>` for every word under every base URL.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpDirectoryScanner;

#[async_trait]
impl DirectorySource for HttpDirectoryScanner {
    async fn discover(&self, target: &Target, ctx: ScanContext<'_>) -> Result<Discovery<DirectoryFinding>, ScanError> {
        let mut words = ctx.wordlists.get(DIRECTORIES);
        if ctx.deep {
            words.extend(ctx.wordlists.get(DIRECTORIES_DEEP));
        }

        let mut seen = HashSet::new();
        let candidates: Vec<(Url, String)> = target
            .base_urls(ctx.schemes)
            .iter()
            .flat_map(|base| words.iter().filter_map(move |word| candidate_url(base, word).map(|url| (url, word.clone()))))
            .filter(|(url, _)| seen.insert(url.to_string()))
            .collect();

        info!(target = %target, candidates = candidates.len(), "Starting directory enumeration.");

        let probed = candidates.len();
        let results = fan_out(candidates, ctx.concurrency, ctx.cancel, |(url, word)| async move {
            let result = ctx.prober.request_with_retry(ProbeRequest::get(url), ctx.retries).await;
            (word, result)
        })
        .await;

        let mut discovery = Discovery::empty();
        discovery.probed = probed;
        for (word, result) in results {
            if result.is_failure() {
                discovery.failed += 1;
                continue;
            }
            if let Some(finding) = classify(&word, &result) {
                debug!(url = %finding.url, status = finding.status, "Directory found.");
                discovery.findings.push(finding);
            }
        }
        discovery.findings.sort_by(|a, b| a.url.cmp(&b.url));

        info!(
            target = %target,
            found = discovery.findings.len(),
            failed = discovery.failed,
            "Directory enumeration finished."
        );
        Ok(discovery)
    }
}

fn candidate_url(base: &Url, word: &str) -> Option<Url> {
    let word = word.trim().trim_start_matches('/');
    if word.is_empty() {
        return None;
    }
    base.join(word).ok()
}

/// Turns a probe into a finding when its status signals existence.
pub fn classify(word: &str, result: &ProbeResult) -> Option<DirectoryFinding> {
    let status = result.status?;
    if !EXISTENCE_STATUSES.contains(&status) {
        return None;
    }
    Some(DirectoryFinding {
        url: result.url.clone(),
        path: word.trim_start_matches('/').to_string(),
        status,
        content_length: result.content_length,
        content_type: result.content_type.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn only_existence_statuses_become_findings() {
        for status in EXISTENCE_STATUSES {
            let result = ProbeResult::response("https://example.test/admin", status, HashMap::new(), "");
            assert!(classify("admin", &result).is_some(), "status {status}");
        }
        for status in [204, 400, 401, 404, 500] {
            let result = ProbeResult::response("https://example.test/admin", status, HashMap::new(), "");
            assert!(classify("admin", &result).is_none(), "status {status}");
        }
    }

    #[test]
    fn candidate_urls_join_under_root() {
        let base = Url::parse("https://example.test/").unwrap();
        assert_eq!(candidate_url(&base, "admin").unwrap().as_str(), "https://example.test/admin");
        assert_eq!(candidate_url(&base, "/api").unwrap().as_str(), "https://example.test/api");
        assert!(candidate_url(&base, "  ").is_none());
    }
}
