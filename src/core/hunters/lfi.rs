// src/core/hunters/lfi.rs

use super::{excerpt, InjectionHunter};
use crate::core::models::{Severity, VulnKind};

pub const PARAMETER: &str = "file";
pub const PAYLOAD_LIMIT: usize = 3;

pub fn hunter(payloads: Vec<String>) -> InjectionHunter {
    InjectionHunter::new(VulnKind::Lfi, PARAMETER, payloads, Severity::High, detect)
}

/// Looks for `/etc/passwd` entries in the response.
pub fn detect(_payload: &str, body: &str) -> Option<String> {
    (body.contains("root:") || body.contains("daemon:"))
        .then(|| format!("File inclusion successful: {}", excerpt(body, 100)))
}
