// src/core/hunters/command_injection.rs

use once_cell::sync::Lazy;
use regex::Regex;

use super::{excerpt, InjectionHunter};
use crate::core::models::{Severity, VulnKind};

pub const PARAMETER: &str = "cmd";
pub const PAYLOAD_LIMIT: usize = 3;

// Output of `id`, or the web server account a `whoami` would print.
static RE_COMMAND_OUTPUT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:uid|gid|groups)=\d+|\bwww-data\b").unwrap());

pub fn hunter(payloads: Vec<String>) -> InjectionHunter {
    InjectionHunter::new(VulnKind::CommandInjection, PARAMETER, payloads, Severity::Critical, detect)
}

pub fn detect(_payload: &str, body: &str) -> Option<String> {
    RE_COMMAND_OUTPUT
        .is_match(body)
        .then(|| format!("Command injection successful: {}", excerpt(body, 100)))
}
