// src/core/scanner/subdomain_scanner.rs

use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use std::collections::{BTreeSet, HashSet};
use std::net::IpAddr;
use tracing::{debug, info, warn};

use super::dns_scanner::random_label;
use super::{fan_out, Discovery, ScanContext, SubdomainSource};
use crate::core::error::ScanError;
use crate::core::target::Target;
use crate::core::wordlists::{SUBDOMAINS, SUBDOMAINS_DEEP};

/// Brute-forces subdomains by resolving `<word>.<host>` for every word.
///
/// Answers that match the addresses of a random, surely-nonexistent label
/// are discarded so wildcard DNS does not turn every word into a finding.
pub struct DnsSubdomainScanner {
    resolver: TokioAsyncResolver,
}

impl Default for DnsSubdomainScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsSubdomainScanner {
    pub fn new() -> Self {
        Self { resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()) }
    }

    pub fn with_resolver(resolver: TokioAsyncResolver) -> Self {
        Self { resolver }
    }

    async fn resolve(&self, name: &str) -> Result<HashSet<IpAddr>, ResolveError> {
        let lookup = self.resolver.lookup_ip(name).await?;
        Ok(lookup.iter().collect())
    }

    /// Addresses a random label resolves to, empty when there is no wildcard.
    async fn wildcard_addresses(&self, host: &str) -> HashSet<IpAddr> {
        let probe = format!("{}.{}", random_label(), host);
        match self.resolve(&probe).await {
            Ok(addresses) => {
                warn!(host, addresses = addresses.len(), "Wildcard DNS detected.");
                addresses
            }
            Err(_) => HashSet::new(),
        }
    }
}

#[async_trait]
impl SubdomainSource for DnsSubdomainScanner {
    async fn discover(&self, target: &Target, ctx: ScanContext<'_>) -> Result<Discovery<String>, ScanError> {
        if target.is_ip() {
            debug!(target = %target, "Skipping subdomain enumeration for an IP target.");
            return Ok(Discovery::empty());
        }

        let host = target.host();
        let mut words = ctx.wordlists.get(SUBDOMAINS);
        if ctx.deep {
            words.extend(ctx.wordlists.get(SUBDOMAINS_DEEP));
        }
        let candidates: BTreeSet<String> = words
            .iter()
            .map(|word| word.trim().trim_end_matches('.').to_ascii_lowercase())
            .filter(|word| !word.is_empty())
            .map(|word| format!("{word}.{host}"))
            .collect();

        info!(target = %target, candidates = candidates.len(), "Starting subdomain enumeration.");
        let wildcard = self.wildcard_addresses(host).await;

        let probed = candidates.len();
        let outcomes = fan_out(candidates, ctx.concurrency, ctx.cancel, |name| async move {
            let outcome = self.resolve(&name).await;
            (name, outcome)
        })
        .await;

        let mut discovery = Discovery::empty();
        discovery.probed = probed;
        for (name, outcome) in outcomes {
            match outcome {
                Ok(addresses) if !wildcard.is_empty() && addresses.is_subset(&wildcard) => {
                    debug!(name = %name, "Discarding wildcard answer.");
                }
                Ok(_) => {
                    debug!(name = %name, "Subdomain resolved.");
                    discovery.findings.push(name);
                }
                Err(e) => {
                    if !matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                        discovery.failed += 1;
                    }
                }
            }
        }

        // Every lookup failing for reasons other than NXDOMAIN means the
        // resolver itself is unreachable.
        if probed > 0 && discovery.failed == probed {
            return Err(ScanError::Unavailable("DNS resolution".to_string()));
        }

        discovery.findings.sort();
        info!(target = %target, found = discovery.findings.len(), "Subdomain enumeration finished.");
        Ok(discovery)
    }
}
