// src/core/integrations/curl.rs

use async_trait::async_trait;
use tracing::{debug, info};

use super::{finding, run_command, Availability, ExternalTool, ToolJob};
use crate::core::error::ScanError;
use crate::core::models::ExternalFinding;

const NAME: &str = "curl";
const METHODS: [&str; 7] = ["GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS"];

/// HTTP method probing with `curl`.
#[derive(Default)]
pub struct Curl {
    availability: Availability,
}

/// The status code curl printed with `-w %{http_code}`, when the method is allowed.
///
/// A `405` or a transport failure (`000`) means not allowed.
pub fn allowed_status(stdout: &str) -> Option<u16> {
    let code: u16 = stdout.trim().parse().ok()?;
    (code != 0 && code != 405).then_some(code)
}

#[async_trait]
impl ExternalTool for Curl {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn available(&self) -> bool {
        self.availability.check(NAME, &["--version"]).await
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        let mut findings = Vec::new();
        for method in METHODS {
            let args: Vec<String> = vec![
                "-X".into(),
                method.into(),
                "--max-time".into(),
                "10".into(),
                "-s".into(),
                "-o".into(),
                "/dev/null".into(),
                "-w".into(),
                "%{http_code}".into(),
                "-k".into(),
                job.root.to_string(),
            ];
            let output = run_command(NAME, &args, job.timeout, job.cancel).await?;
            match allowed_status(&output.stdout) {
                Some(code) => findings.push(finding(NAME, "http_method", method, Some(format!("status {code}")))),
                None => debug!(method, "Method not allowed."),
            }
        }
        info!(target = %job.target, allowed = findings.len(), "curl method probing finished.");
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interprets_status_codes() {
        assert_eq!(allowed_status("200"), Some(200));
        assert_eq!(allowed_status("403\n"), Some(403));
        assert_eq!(allowed_status("405"), None);
        assert_eq!(allowed_status("000"), None);
        assert_eq!(allowed_status(""), None);
    }
}
