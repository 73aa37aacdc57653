// src/core/hunters/template_injection.rs

use super::{excerpt, InjectionHunter};
use crate::core::models::{Severity, VulnKind};

pub const PARAMETER: &str = "template";
pub const PAYLOAD_LIMIT: usize = 3;

pub fn hunter(payloads: Vec<String>) -> InjectionHunter {
    InjectionHunter::new(VulnKind::TemplateInjection, PARAMETER, payloads, Severity::High, detect)
}

/// The `7*7` payloads evaluate to `49`. A verbatim reflection of the payload
/// means it was not evaluated, so that case is not reported.
pub fn detect(payload: &str, body: &str) -> Option<String> {
    (body.contains("49") && !body.contains(payload))
        .then(|| format!("Template expression evaluated: {}", excerpt(body, 100)))
}
