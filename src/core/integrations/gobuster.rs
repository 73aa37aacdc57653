// src/core/integrations/gobuster.rs

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::info;

use super::{finding, require_output, run_command, Availability, ExternalTool, ScratchFile, ToolJob};
use crate::core::error::ScanError;
use crate::core::models::ExternalFinding;

const NAME: &str = "gobuster";

static RE_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(/?\S+)\s+\(Status:\s*(\d{3})\)(?:\s*\[Size:\s*(\d+)\])?").unwrap());

/// Directory brute-forcing through `gobuster dir`.
#[derive(Default)]
pub struct Gobuster {
    availability: Availability,
}

/// Parses quiet-mode lines such as `/admin (Status: 301) [Size: 0]`.
pub fn parse_output(stdout: &str, base: &str) -> Vec<ExternalFinding> {
    let base = base.trim_end_matches('/');
    stdout
        .lines()
        .filter_map(|line| RE_LINE.captures(line))
        .map(|caps| {
            let path = caps[1].trim_start_matches('/');
            let detail = match caps.get(3) {
                Some(size) => format!("status {} size {}", &caps[2], size.as_str()),
                None => format!("status {}", &caps[2]),
            };
            finding(NAME, "directory", format!("{base}/{path}"), Some(detail))
        })
        .collect()
}

#[async_trait]
impl ExternalTool for Gobuster {
    fn name(&self) -> &'static str {
        NAME
    }

    async fn available(&self) -> bool {
        self.availability.check(NAME, &["--help"]).await
    }

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError> {
        let wordlist = ScratchFile::with_lines(NAME, job.wordlist)?;
        let args: Vec<String> = vec![
            "dir".into(),
            "-u".into(),
            job.root.to_string(),
            "-w".into(),
            wordlist.path_string(),
            "-t".into(),
            "50".into(),
            "--timeout".into(),
            "10s".into(),
            "-q".into(),
            "-k".into(),
        ];
        let output = run_command(NAME, &args, job.timeout, job.cancel).await?;
        require_output(NAME, &output)?;
        let findings = parse_output(&output.stdout, job.root.as_str());
        info!(target = %job.target, found = findings.len(), "gobuster finished.");
        Ok(findings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quiet_lines() {
        let stdout = "/admin                (Status: 301) [Size: 0]\n\
                      /api (Status: 200) [Size: 1532]\n\
                      Progress: 100 / 100\n\
                      login (Status: 403)\n";
        let findings = parse_output(stdout, "https://example.test/");
        let values: Vec<&str> = findings.iter().map(|f| f.value.as_str()).collect();
        assert_eq!(values, vec!["https://example.test/admin", "https://example.test/api", "https://example.test/login"]);
        assert_eq!(findings[1].detail.as_deref(), Some("status 200 size 1532"));
        assert_eq!(findings[2].detail.as_deref(), Some("status 403"));
    }
}
