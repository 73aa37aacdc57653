// src/core/integrations/nuclei.rs

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{info, warn};

use super::{finding, require_output, run_command, Availability, ExternalTool, ToolJob};
use crate::core::error::ScanError;
use crate::core::models::ExternalFinding;

const NAME: &str = "nuclei";

/// Template scanning with `nuclei`, reading its JSON lines.
#[derive(Default)]
pub struct Nuclei {
    availability: Availability,
}

#[derive(Debug, Deserialize)]
struct NucleiEvent {
    #[serde(rename = "template-id")]
    template_id: String,
    #[serde(rename = "matched-at", default)]
    matched_at: Option<String>,
    #[serde(default)]
    host: Option<String>,
    #[serde(default)]
    info: NucleiInfo,
}

#[derive(Debug, Default, Deserialize)]
struct NucleiInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    severity: Option<String>,
}

/// Parses `-jsonl` output, skipping lines that are not result objects.
pub fn parse_jsonl(stdout: &str) -> Vec<ExternalFinding> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str::<NucleiEvent>(line) {
            Ok(event) => Some(event),
            Err(e) => {
                warn!(error = %e, "Skipping unparseable nuclei line.");
                None
            }
        })
        .map(|event| {
            let location = event.matched_at.or(event.host).unwrap_or_default();
            let severity = event.info.severity.unwrap_or_else(|| "unknown".to_string());
            let detail = match event.info.name {
                Some(name) => format!("[{severity}] {name} at {location}"),
                None => format!("[{severity}] at {location}"),
            };
            finding(NAME, "template_match", event.template_id, Some(detail))
        })
        .collect()
}

#[async_trait]
impl ExternalTool for Nuclei {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn available(&self) -> bool {
        self.availability.check(NAME, &["-version"]).await
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        let args: Vec<String> = vec!["-u".into(), job.root.to_string(), "-jsonl".into(), "-silent".into()];
        let output = run_command(NAME, &args, job.timeout, job.cancel).await?;
        require_output(NAME, &output)?;
        let findings = parse_jsonl(&output.stdout);
        info!(target = %job.target, found = findings.len(), "nuclei finished.");
        Ok(findings)
    }
}
