// src/core/error.rs

use thiserror::Error;

/// Reasons a user-supplied target string is rejected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,
    #[error("unsupported scheme '{0}', only http and https are allowed")]
    UnsupportedScheme(String),
    #[error("wildcard targets are not supported: {0}")]
    Wildcard(String),
    #[error("'{0}' is not a valid hostname or IP address")]
    InvalidHost(String),
    #[error("target could not be parsed: {0}")]
    Malformed(String),
}

/// Problems with the scan configuration or its supporting files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
    #[error("unknown payload category '{0}'")]
    UnknownCategory(String),
}

/// Failures raised by a scan stage. None of these abort a whole scan on their
/// own; the orchestrator records them against the phase that produced them.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Target(#[from] TargetError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("{0} is unavailable")]
    Unavailable(String),
    #[error("{stage} failed: {reason}")]
    Stage { stage: String, reason: String },
    #[error("failed to write report: {0}")]
    Report(String),
    #[error("scan cancelled")]
    Cancelled,
}

impl ScanError {
    pub fn stage(stage: impl Into<String>, reason: impl ToString) -> Self {
        Self::Stage { stage: stage.into(), reason: reason.to_string() }
    }
}
