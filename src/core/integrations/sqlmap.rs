// src/core/integrations/sqlmap.rs

use async_trait::async_trait;
use tracing::{debug, info};

use super::{finding, require_output, run_command, Availability, ExternalTool, ToolJob};
use crate::core::error::ScanError;
use crate::core::hunters::inject;
use crate::core::models::ExternalFinding;

const NAME: &str = "sqlmap";

/// SQL injection confirmation through `sqlmap` in batch mode.
#[derive(Default)]
pub struct Sqlmap {
    availability: Availability,
}

/// Parses sqlmap's injection summary. Each `Parameter:` line opens a finding,
/// and the `Type:` and `Payload:` lines below it become its detail. Without a
/// summary block, the `... is vulnerable` notices are reported instead.
pub fn parse_output(stdout: &str) -> Vec<ExternalFinding> {
    let mut findings: Vec<ExternalFinding> = Vec::new();
    let mut notices: Vec<ExternalFinding> = Vec::new();
    for line in stdout.lines().map(str::trim) {
        if line.contains("is vulnerable") {
            let notice = line.split("is vulnerable").next().unwrap_or_default();
            let notice = notice.rsplit(']').next().unwrap_or_default().trim();
            notices.push(finding(NAME, "sql_injection", notice, None));
            continue;
        }
        if let Some(parameter) = line.strip_prefix("Parameter:") {
            findings.push(finding(NAME, "sql_injection", parameter.trim(), None));
            continue;
        }
        let Some(current) = findings.last_mut() else {
            continue;
        };
        let note = line
            .strip_prefix("Type:")
            .map(|t| format!("type: {}", t.trim()))
            .or_else(|| line.strip_prefix("Payload:").map(|p| format!("payload: {}", p.trim())));
        if let Some(note) = note {
            current.detail = Some(match current.detail.take() {
                Some(existing) => format!("{existing}; {note}"),
                None => note,
            });
        }
    }
    if findings.is_empty() {
        notices
    } else {
        findings
    }
}

#[async_trait]
impl ExternalTool for Sqlmap {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn available(&self) -> bool {
        self.availability.check(NAME, &["--version"]).await
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        let Some(first) = job.parameters.first() else {
            debug!(target = %job.target, "No parameters known, skipping sqlmap.");
            return Ok(Vec::new());
        };
        let url = inject(job.root, first, "1");
        let mut args: Vec<String> = vec![
            "-u".into(),
            url.to_string(),
            "--batch".into(),
            "--random-agent".into(),
            "--level".into(),
            "1".into(),
            "--risk".into(),
            "1".into(),
            "--threads".into(),
            "5".into(),
            "--timeout".into(),
            "30".into(),
        ];
        args.push("-p".into());
        args.push(job.parameters.iter().take(5).cloned().collect::<Vec<_>>().join(","));
        let output = run_command(NAME, &args, job.timeout, job.cancel).await?;
        require_output(NAME, &output)?;
        let findings = parse_output(&output.stdout);
        info!(target = %job.target, found = findings.len(), "sqlmap finished.");
        Ok(findings)
    }
}
