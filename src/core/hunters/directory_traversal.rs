// src/core/hunters/directory_traversal.rs

use super::{excerpt, InjectionHunter};
use crate::core::models::{Severity, VulnKind};

pub const PARAMETER: &str = "file";
pub const PAYLOAD_LIMIT: usize = 3;

pub fn hunter(payloads: Vec<String>) -> InjectionHunter {
    InjectionHunter::new(VulnKind::DirectoryTraversal, PARAMETER, payloads, Severity::High, detect)
}

/// Markers from `/etc/passwd` or `win.ini`.
pub fn detect(_payload: &str, body: &str) -> Option<String> {
    (body.contains("root:") || body.contains("daemon:") || body.contains("[fonts]"))
        .then(|| format!("Directory traversal successful: {}", excerpt(body, 100)))
}
