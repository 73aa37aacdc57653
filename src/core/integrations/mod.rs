// src/core/integrations/mod.rs

// Wrappers around external command-line tools. Every tool probes for its
// binary once, runs under a hard timeout, and turns its output into
// `ExternalFinding`s with a pure parser that can be tested without the tool.
pub mod curl;
pub mod ffuf;
pub mod gobuster;
pub mod nmap;
pub mod nuclei;
pub mod sqlmap;
pub mod subfinder;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ToolToggles;
use crate::core::cancel::CancelSignal;
use crate::core::error::ScanError;
use crate::core::models::ExternalFinding;
use crate::core::target::Target;

/// What a tool needs to know about the current target.
pub struct ToolJob<'a> {
    pub target: &'a Target,
    pub root: &'a Url,
    /// Words for tools that brute-force paths.
    pub wordlist: &'a [String],
    /// Known parameter names, for tools that inject into them.
    pub parameters: &'a [String],
    pub timeout: Duration,
    pub cancel: &'a CancelSignal,
}

#[async_trait]
pub trait ExternalTool: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the binary can be launched. Probed once and cached.
    async fn available(&self) -> bool;

    async fn run(&self, job: &ToolJob<'_>) -> Result<Vec<ExternalFinding>, ScanError>;
}

/// Builds the enabled tools in a fixed order.
pub fn enabled_tools(toggles: &ToolToggles) -> Vec<Box<dyn ExternalTool>> {
    let mut tools: Vec<Box<dyn ExternalTool>> = Vec::new();
    if toggles.subfinder {
        tools.push(Box::new(subfinder::Subfinder::default()));
    }
    if toggles.nmap {
        tools.push(Box::new(nmap::Nmap::default()));
    }
    if toggles.ffuf {
        tools.push(Box::new(ffuf::Ffuf::default()));
    }
    if toggles.gobuster {
        tools.push(Box::new(gobuster::Gobuster::default()));
    }
    if toggles.curl {
        tools.push(Box::new(curl::Curl::default()));
    }
    if toggles.nuclei {
        tools.push(Box::new(nuclei::Nuclei::default()));
    }
    if toggles.sqlmap {
        tools.push(Box::new(sqlmap::Sqlmap::default()));
    }
    tools
}

// --- Process Helpers ---

/// Caches whether a binary can be launched.
#[derive(Debug, Default)]
pub struct Availability {
    cell: OnceCell<bool>,
}

impl Availability {
    pub async fn check(&self, program: &str, args: &[&str]) -> bool {
        *self
            .cell
            .get_or_init(|| async {
                let launched = Command::new(program)
                    .args(args)
                    .stdin(Stdio::null())
                    .stdout(Stdio::null())
                    .stderr(Stdio::null())
                    .kill_on_drop(true)
                    .status()
                    .await
                    .is_ok();
                if launched {
                    debug!(program, "External tool found.");
                } else {
                    info!(program, "External tool not installed.");
                }
                launched
            })
            .await
    }
}

/// Output of a finished tool process.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

/// Runs a program to completion, killing it on timeout or cancellation.
pub async fn run_command(program: &str, args: &[String], timeout: Duration, cancel: &CancelSignal) -> Result<ToolOutput, ScanError> {
    debug!(program, args = ?args, "Running external tool.");
    let child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .output();

    tokio::select! {
        outcome = tokio::time::timeout(timeout, child) => match outcome {
            Err(_) => {
                warn!(program, timeout_secs = timeout.as_secs(), "External tool timed out.");
                Err(ScanError::stage(program, format!("timed out after {}s", timeout.as_secs())))
            }
            Ok(Err(e)) => Err(ScanError::stage(program, e)),
            Ok(Ok(output)) => Ok(ToolOutput {
                success: output.status.success(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            }),
        },
        _ = cancel.cancelled() => Err(ScanError::Cancelled),
    }
}

/// Fails with the tool's stderr when it exited unsuccessfully without output.
pub fn require_output(program: &str, output: &ToolOutput) -> Result<(), ScanError> {
    if !output.success && output.stdout.trim().is_empty() {
        let reason = output.stderr.lines().find(|line| !line.trim().is_empty()).unwrap_or("exited with an error");
        return Err(ScanError::stage(program, reason.trim()));
    }
    Ok(())
}

/// A uniquely named file in the temp directory that is removed on drop.
pub struct ScratchFile {
    path: PathBuf,
}

impl ScratchFile {
    pub fn new(prefix: &str, extension: &str) -> Self {
        let nanos = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_nanos()).unwrap_or_default();
        let name = format!("shadowrecon-{prefix}-{}-{nanos}.{extension}", std::process::id());
        Self { path: std::env::temp_dir().join(name) }
    }

    pub fn with_lines(prefix: &str, lines: &[String]) -> Result<Self, ScanError> {
        let file = Self::new(prefix, "txt");
        std::fs::write(&file.path, lines.join("\n")).map_err(|e| ScanError::stage(prefix, e))?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn path_string(&self) -> String {
        self.path.display().to_string()
    }
}

impl Drop for ScratchFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

pub(crate) fn finding(tool: &str, kind: &str, value: impl Into<String>, detail: Option<String>) -> ExternalFinding {
    ExternalFinding { tool: tool.to_string(), kind: kind.to_string(), value: value.into(), detail }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_binary_is_unavailable() {
        let availability = Availability::default();
        assert!(!availability.check("shadowrecon-no-such-binary", &["--version"]).await);
    }

    #[tokio::test]
    async fn missing_binary_fails_to_run() {
        let outcome = run_command("shadowrecon-no-such-binary", &[], Duration::from_secs(5), &CancelSignal::never()).await;
        assert!(matches!(outcome, Err(ScanError::Stage { .. })));
    }

    #[test]
    fn scratch_files_are_cleaned_up() {
        let path = {
            let file = ScratchFile::with_lines("test", &["a".to_string(), "b".to_string()]).unwrap();
            assert_eq!(std::fs::read_to_string(file.path()).unwrap(), "a\nb");
            file.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn enabled_tools_follow_toggles() {
        let toggles = ToolToggles { ffuf: true, curl: true, ..ToolToggles::default() };
        let names: Vec<&str> = enabled_tools(&toggles).iter().map(|tool| tool.name()).collect();
        assert_eq!(names, vec!["ffuf", "curl"]);
    }
}
