// src/core/integrations/subfinder.rs

use async_trait::async_trait;
use std::collections::BTreeSet;
use tracing::{debug, info};

use super::{finding, require_output, run_command, Availability, ExternalTool, ToolJob};
use crate::core::error::ScanError;
use crate::core::models::ExternalFinding;
use crate::core::target::Target;

const NAME: &str = "subfinder";

/// Passive subdomain enumeration with `subfinder`.
#[derive(Default)]
pub struct Subfinder {
    availability: Availability,
}

/// One name per line; keeps names inside the target's zone, deduplicated and sorted.
pub fn parse_output(stdout: &str, target: &Target) -> Vec<ExternalFinding> {
    let suffix = format!(".{}", target.host());
    let names: BTreeSet<String> = stdout
        .lines()
        .map(|line| line.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|name| name.ends_with(&suffix))
        .collect();
    names.into_iter().map(|name| finding(NAME, "subdomain", name, None)).collect()
}

#[async_trait]
impl ExternalTool for Subfinder {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn available(&self) -> bool {
        self.availability.check(NAME, &["-version"]).await
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        if job.target.is_ip() {
            debug!(target = %job.target, "Skipping subfinder for an IP target.");
            return Ok(Vec::new());
        }
        let args: Vec<String> = vec!["-d".into(), job.target.host().to_string(), "-silent".into()];
        let output = run_command(NAME, &args, job.timeout, job.cancel).await?;
        require_output(NAME, &output)?;
        let findings = parse_output(&output.stdout, job.target);
        info!(target = %job.target, found = findings.len(), "subfinder finished.");
        Ok(findings)
    }
}
