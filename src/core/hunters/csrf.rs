// src/core/hunters/csrf.rs

use async_trait::async_trait;
use tracing::{debug, info};
use url::Url;

use super::Hunter;
use crate::core::models::{Severity, VulnKind, Vulnerability};
use crate::core::probe::ProbeRequest;
use crate::core::scanner::ScanContext;

const TOKEN_MARKERS: &[&str] = &["csrf", "_token", "authenticity_token", "anti-forgery", "xsrf"];

/// Flags pages that contain a form but no anti-CSRF token anywhere in the markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsrfHunter;

#[async_trait]
impl Hunter for CsrfHunter {
    fn kind(&self) -> VulnKind {
        VulnKind::Csrf
    }

    async fn test_endpoint(&self, endpoint: &Url, ctx: ScanContext<'_>) -> Vec<Vulnerability> {
        let result = ctx.prober.request(ProbeRequest::get(endpoint.clone())).await;
        if result.is_failure() || result.status != Some(200) {
            debug!(url = %endpoint, status = ?result.status, "Skipping CSRF check.");
            return Vec::new();
        }
        if !lacks_csrf_token(&result.body) {
            return Vec::new();
        }
        info!(endpoint = %endpoint, "Form without CSRF token found.");
        vec![Vulnerability {
            kind: VulnKind::Csrf,
            severity: Severity::Medium,
            endpoint: endpoint.to_string(),
            url: endpoint.to_string(),
            parameter: None,
            payload: "No CSRF token detected".to_string(),
            evidence: "Forms found without CSRF protection".to_string(),
            method: "GET".to_string(),
        }]
    }
}

pub fn lacks_csrf_token(body: &str) -> bool {
    let lowered = body.to_ascii_lowercase();
    lowered.contains("<form") && !TOKEN_MARKERS.iter().any(|marker| lowered.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_markers() {
        assert!(lacks_csrf_token("<form method=post><input name=email></form>"));
        assert!(!lacks_csrf_token("<form><input type=hidden name=csrf_token value=abc></form>"));
        assert!(!lacks_csrf_token("<form><input type=hidden name=_token></form>"));
        assert!(!lacks_csrf_token("<p>no forms here</p>"));
    }
}
