// src/core/hunters/ssrf.rs

use super::{excerpt, InjectionHunter};
use crate::core::models::{Severity, VulnKind};

pub const PARAMETER: &str = "url";
pub const PAYLOAD_LIMIT: usize = 2;

pub fn hunter(payloads: Vec<String>) -> InjectionHunter {
    InjectionHunter::new(VulnKind::Ssrf, PARAMETER, payloads, Severity::Critical, detect)
}

/// Cloud metadata keys showing up in the response mean the server fetched the payload URL.
pub fn detect(_payload: &str, body: &str) -> Option<String> {
    (body.contains("instance-id") || body.contains("ami-id"))
        .then(|| format!("SSRF successful - cloud metadata exposed: {}", excerpt(body, 100)))
}
