// src/core/hunters/xss.rs

use super::{excerpt, InjectionHunter};
use crate::core::models::{Severity, VulnKind};

pub const PARAMETER: &str = "test";
pub const PAYLOAD_LIMIT: usize = 5;

pub fn hunter(payloads: Vec<String>) -> InjectionHunter {
    InjectionHunter::new(VulnKind::Xss, PARAMETER, payloads, Severity::High, detect)
}

/// Reflected XSS: the payload comes back verbatim and carries a `<script` tag.
pub fn detect(payload: &str, body: &str) -> Option<String> {
    let executable = payload.to_ascii_lowercase().contains("<script");
    (executable && body.contains(payload)).then(|| format!("Payload reflected in response: {}", excerpt(payload, 50)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbatim_reflection_is_detected() {
        let payload = "<script>alert(1)</script>";
        let body = format!("<p>You searched for {payload}</p>");
        assert!(detect(payload, &body).unwrap().contains("alert(1)"));
    }

    #[test]
    fn escaped_reflection_is_ignored() {
        let payload = "<script>alert(1)</script>";
        assert!(detect(payload, "<p>&lt;script&gt;alert(1)&lt;/script&gt;</p>").is_none());
    }

    #[test]
    fn inert_payloads_are_ignored() {
        assert!(detect("hello", "hello world").is_none());
    }

    #[test]
    fn only_script_tags_count_as_executable() {
        for payload in [r#"<img src=x onerror=alert("XSS")>"#, "<svg onload=alert(1)>"] {
            let body = format!("<p>{payload}</p>");
            assert!(detect(payload, &body).is_none(), "{payload}");
        }
        let upper = "<SCRIPT>alert(1)</SCRIPT>";
        assert!(detect(upper, upper).is_some());
    }
}
