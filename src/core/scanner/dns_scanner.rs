// src/core/scanner/dns_scanner.rs

use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::{ResolveError, ResolveErrorKind};
use hickory_resolver::TokioAsyncResolver;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::core::models::DnsRecords;

/// Collects the basic DNS footprint of a domain: A/AAAA, MX, NS and TXT
/// records, plus whether the zone answers for arbitrary labels.
pub struct DnsAnalyzer {
    resolver: TokioAsyncResolver,
}

impl Default for DnsAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DnsAnalyzer {
    pub fn new() -> Self {
        Self { resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default()) }
    }

    /// Runs every lookup concurrently. Lookups that fail leave their list
    /// empty; the failure is logged and the others are unaffected.
    ///
    /// # Arguments
    /// * `domain` - The domain name to analyze, without scheme or port.
    ///
    /// # Returns
    /// A `DnsRecords` struct with each record set sorted.
    pub async fn analyze(&self, domain: &str) -> DnsRecords {
        info!(target = %domain, "Starting DNS analysis.");
        let wildcard_probe = format!("{}.{}", random_label(), domain);

        let (a, mx, ns, txt, wildcard) = tokio::join!(
            self.lookup_addresses(domain),
            self.lookup_mx(domain),
            self.lookup_ns(domain),
            self.lookup_txt(domain),
            self.resolver.lookup_ip(wildcard_probe.as_str()),
        );

        let records = DnsRecords {
            a: sorted(a),
            mx: sorted(mx),
            ns: sorted(ns),
            txt: sorted(txt),
            wildcard: wildcard.is_ok(),
        };
        info!(
            a = records.a.len(),
            mx = records.mx.len(),
            ns = records.ns.len(),
            txt = records.txt.len(),
            wildcard = records.wildcard,
            "DNS analysis finished."
        );
        records
    }

    async fn lookup_addresses(&self, domain: &str) -> Result<Vec<String>, ResolveError> {
        debug!(domain, "Looking up address records.");
        Ok(self.resolver.lookup_ip(domain).await?.iter().map(|ip| ip.to_string()).collect())
    }

    async fn lookup_mx(&self, domain: &str) -> Result<Vec<String>, ResolveError> {
        debug!(domain, "Looking up MX records.");
        let lookup = self.resolver.mx_lookup(domain).await?;
        Ok(lookup.iter().map(|mx| format!("{} {}", mx.preference(), mx.exchange())).collect())
    }

    async fn lookup_ns(&self, domain: &str) -> Result<Vec<String>, ResolveError> {
        debug!(domain, "Looking up NS records.");
        Ok(self.resolver.ns_lookup(domain).await?.iter().map(|ns| ns.to_string()).collect())
    }

    async fn lookup_txt(&self, domain: &str) -> Result<Vec<String>, ResolveError> {
        debug!(domain, "Looking up TXT records.");
        Ok(self.resolver.txt_lookup(domain).await?.iter().map(|txt| txt.to_string()).collect())
    }
}

fn sorted(lookup: Result<Vec<String>, ResolveError>) -> Vec<String> {
    match lookup {
        Ok(mut records) => {
            records.sort();
            records.dedup();
            records
        }
        Err(e) => {
            if !matches!(e.kind(), ResolveErrorKind::NoRecordsFound { .. }) {
                warn!(error = %e, "DNS lookup failed.");
            }
            Vec::new()
        }
    }
}

/// A random 20-character label that is assumed not to exist.
pub(crate) fn random_label() -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(20).map(char::from).collect::<String>().to_ascii_lowercase()
}
