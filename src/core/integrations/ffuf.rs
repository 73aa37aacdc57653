// src/core/integrations/ffuf.rs

use async_trait::async_trait;
use serde::Deserialize;
use tracing::info;

use super::{finding, require_output, run_command, Availability, ExternalTool, ScratchFile, ToolJob};
use crate::core::error::ScanError;
use crate::core::models::ExternalFinding;

const NAME: &str = "ffuf";
const MATCH_CODES: &str = "200,201,202,204,301,302,307,401,403,405";

/// Path fuzzing through `ffuf`, reading its JSON report.
#[derive(Default)]
pub struct Ffuf {
    availability: Availability,
}

#[derive(Debug, Deserialize)]
struct FfufReport {
    #[serde(default)]
    results: Vec<FfufHit>,
}

#[derive(Debug, Deserialize)]
struct FfufHit {
    url: String,
    status: u16,
    #[serde(default)]
    length: u64,
}

/// Parses an ffuf `-of json` report into directory findings.
pub fn parse_report(json: &str) -> Result<Vec<ExternalFinding>, ScanError> {
    let report: FfufReport = serde_json::from_str(json).map_err(|e| ScanError::stage(NAME, e))?;
    Ok(report
        .results
        .into_iter()
        .map(|hit| finding(NAME, "directory", hit.url, Some(format!("status {} length {}", hit.status, hit.length))))
        .collect())
}

#[async_trait]
impl ExternalTool for Ffuf {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn available(&self) -> bool {
        self.availability.check(NAME, &["-h"]).await
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        let wordlist = ScratchFile::with_lines(NAME, job.wordlist)?;
        let report = ScratchFile::new("ffuf-report", "json");
        let fuzz_url = format!("{}/FUZZ", job.root.as_str().trim_end_matches('/'));
        let args: Vec<String> = vec![
            "-u".into(),
            fuzz_url,
            "-w".into(),
            wordlist.path_string(),
            "-mc".into(),
            MATCH_CODES.into(),
            "-o".into(),
            report.path_string(),
            "-of".into(),
            "json".into(),
            "-t".into(),
            "50".into(),
            "-s".into(),
        ];
        let output = run_command(NAME, &args, job.timeout, job.cancel).await?;
        let json = match std::fs::read_to_string(report.path()) {
            Ok(json) => json,
            Err(_) => {
                require_output(NAME, &output)?;
                return Ok(Vec::new());
            }
        };
        let findings = parse_report(&json)?;
        info!(target = %job.target, found = findings.len(), "ffuf finished.");
        Ok(findings)
    }
}
