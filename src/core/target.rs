// src/core/target.rs

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use url::{Host, Url};

use crate::core::error::TargetError;

// A single DNS label: 1-63 alphanumerics or hyphens, never starting or ending with a hyphen.
static RE_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z0-9](?:[a-z0-9-]{0,61}[a-z0-9])?$").unwrap());

/// A validated scan target.
///
/// The host is stored lowercased and without a trailing dot. When the user
/// supplied an explicit scheme it is remembered and overrides the configured
/// scheme list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    host: String,
    port: Option<u16>,
    scheme: Option<String>,
    is_ip: bool,
}

impl Target {
    /// Parses a user-supplied target such as `example.com`, `10.0.0.1:8080`
    /// or `https://Example.com/login`. Any path, query or fragment is dropped.
    pub fn parse(input: &str) -> Result<Self, TargetError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(TargetError::Empty);
        }
        if trimmed.starts_with("*.") || trimmed.contains("://*.") {
            return Err(TargetError::Wildcard(trimmed.to_string()));
        }

        let (url, scheme) = match trimmed.split_once("://") {
            Some((scheme, _)) => {
                let scheme = scheme.to_ascii_lowercase();
                if scheme != "http" && scheme != "https" {
                    return Err(TargetError::UnsupportedScheme(scheme));
                }
                (Url::parse(trimmed).map_err(|e| TargetError::Malformed(e.to_string()))?, Some(scheme))
            }
            None => {
                let url = Url::parse(&format!("https://{trimmed}")).map_err(|e| TargetError::Malformed(e.to_string()))?;
                (url, None)
            }
        };

        if !url.username().is_empty() || url.password().is_some() {
            return Err(TargetError::Malformed("credentials are not allowed in targets".to_string()));
        }

        let (host, is_ip) = match url.host() {
            Some(Host::Domain(domain)) => (normalize_domain(domain)?, false),
            Some(Host::Ipv4(addr)) => (addr.to_string(), true),
            Some(Host::Ipv6(addr)) => (format!("[{addr}]"), true),
            None => return Err(TargetError::InvalidHost(trimmed.to_string())),
        };

        Ok(Self { host, port: url.port(), scheme, is_ip })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn scheme(&self) -> Option<&str> {
        self.scheme.as_deref()
    }

    pub fn is_ip(&self) -> bool {
        self.is_ip
    }

    /// `host[:port]`, suitable for building URLs.
    pub fn authority(&self) -> String {
        match self.port {
            Some(port) => format!("{}:{}", self.host, port),
            None => self.host.clone(),
        }
    }

    /// The root URL for every scheme the target should be probed under.
    /// An explicit scheme on the target wins over the configured list.
    pub fn base_urls(&self, schemes: &[String]) -> Vec<Url> {
        let schemes: Vec<&str> = match &self.scheme {
            Some(scheme) => vec![scheme.as_str()],
            None if schemes.is_empty() => vec!["https"],
            None => schemes.iter().map(String::as_str).collect(),
        };
        schemes
            .into_iter()
            .filter_map(|scheme| Url::parse(&format!("{}://{}/", scheme, self.authority())).ok())
            .collect()
    }

    /// True when `url` points at this host or one of its subdomains.
    pub fn in_scope(&self, url: &Url) -> bool {
        match url.host() {
            Some(Host::Domain(domain)) if !self.is_ip => {
                let domain = domain.trim_end_matches('.').to_ascii_lowercase();
                domain == self.host || domain.ends_with(&format!(".{}", self.host))
            }
            Some(Host::Ipv4(addr)) => self.is_ip && addr.to_string() == self.host,
            Some(Host::Ipv6(addr)) => self.is_ip && format!("[{addr}]") == self.host,
            _ => false,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scheme {
            Some(scheme) => write!(f, "{}://{}", scheme, self.authority()),
            None => f.write_str(&self.authority()),
        }
    }
}

fn normalize_domain(domain: &str) -> Result<String, TargetError> {
    let domain = domain.trim_end_matches('.').to_ascii_lowercase();
    if domain.is_empty() || domain.len() > 253 {
        return Err(TargetError::InvalidHost(domain));
    }
    if domain.split('.').any(|label| label == "*") {
        return Err(TargetError::Wildcard(domain));
    }
    if !domain.split('.').all(|label| RE_LABEL.is_match(label)) {
        return Err(TargetError::InvalidHost(domain));
    }
    Ok(domain)
}
