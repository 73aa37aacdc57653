// src/core/reporter.rs

use chrono::Utc;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::core::error::ScanError;
use crate::core::models::ScanResults;

/// Writes finished results somewhere durable.
pub trait Reporter: Send + Sync {
    /// Renders `results` in every supported format out of `formats`, returning
    /// where each one was written. Unsupported formats are skipped.
    fn render(&self, results: &ScanResults, formats: &[String]) -> Result<BTreeMap<String, PathBuf>, ScanError>;
}

/// Writes `<output_dir>/shadowrecon_<host>_<timestamp>.json`.
pub struct JsonReporter {
    output_dir: PathBuf,
}

impl JsonReporter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self { output_dir: output_dir.into() }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn write_json(&self, results: &ScanResults) -> Result<PathBuf, ScanError> {
        std::fs::create_dir_all(&self.output_dir)
            .map_err(|e| ScanError::Report(format!("{}: {e}", self.output_dir.display())))?;
        let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = self.output_dir.join(format!("shadowrecon_{}_{timestamp}.json", file_stem(&results.target)));
        let json = serde_json::to_string_pretty(results).map_err(|e| ScanError::Report(e.to_string()))?;
        std::fs::write(&path, json).map_err(|e| ScanError::Report(format!("{}: {e}", path.display())))?;
        Ok(path)
    }
}

impl Reporter for JsonReporter {
    fn render(&self, results: &ScanResults, formats: &[String]) -> Result<BTreeMap<String, PathBuf>, ScanError> {
        let mut written = BTreeMap::new();
        for format in formats {
            match format.trim().to_ascii_lowercase().as_str() {
                "json" => {
                    let path = self.write_json(results)?;
                    info!(target = %results.target, path = %path.display(), "JSON report written.");
                    written.insert("json".to_string(), path);
                }
                other => warn!(format = other, "Report format not supported, skipping."),
            }
        }
        Ok(written)
    }
}

// Dots and anything outside [A-Za-z0-9-] become underscores.
fn file_stem(target: &str) -> String {
    target.chars().map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' }).collect()
}
