// src/core/integrations/nmap.rs

use async_trait::async_trait;
use tracing::info;

use super::{finding, require_output, run_command, Availability, ExternalTool, ToolJob};
use crate::core::error::ScanError;
use crate::core::models::ExternalFinding;

const NAME: &str = "nmap";
const COMMON_PORTS: &str = "21,22,23,25,53,80,110,143,443,445,993,995,3306,3389,5432,6379,8080,8443";

/// Open-port discovery through `nmap`'s greppable output.
#[derive(Default)]
pub struct Nmap {
    availability: Availability,
}

/// Parses `-oG` output, keeping ports whose state is `open`.
///
/// A host line looks like
/// `Host: 10.0.0.1 ()	Ports: 22/open/tcp//ssh///, 80/open/tcp//http///`.
pub fn parse_greppable(stdout: &str) -> Vec<ExternalFinding> {
    let mut findings = Vec::new();
    for line in stdout.lines() {
        let Some((_, ports)) = line.split_once("Ports:") else {
            continue;
        };
        // Further tab-separated fields (Ignored State etc.) follow the port list.
        let ports = ports.split('\t').next().unwrap_or_default();
        for entry in ports.split(',') {
            let fields: Vec<&str> = entry.trim().split('/').collect();
            if fields.len() < 3 || fields[1] != "open" {
                continue;
            }
            let service = fields.get(4).filter(|s| !s.is_empty()).map(|s| s.to_string());
            findings.push(finding(NAME, "open_port", format!("{}/{}", fields[0], fields[2]), service));
        }
    }
    findings
}

#[async_trait]
impl ExternalTool for Nmap {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn available(&self) -> bool {
        self.availability.check(NAME, &["--version"]).await
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        let host = job.target.host().trim_start_matches('[').trim_end_matches(']').to_string();
        let args: Vec<String> =
            vec!["-p".into(), COMMON_PORTS.into(), "--open".into(), "-T4".into(), "-oG".into(), "-".into(), host];
        let output = run_command(NAME, &args, job.timeout, job.cancel).await?;
        require_output(NAME, &output)?;
        let findings = parse_greppable(&output.stdout);
        info!(target = %job.target, open_ports = findings.len(), "nmap finished.");
        Ok(findings)
    }
}
