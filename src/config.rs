// src/config.rs

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::error::ConfigError;
use crate::core::models::{PhaseFlags, VulnKind};

pub const CONFIG_FILE: &str = "shadowrecon.toml";

/// Longest accepted pause between targets: one day.
pub const MAX_DELAY_SECS: u64 = 86_400;

/// Toggles for the wrapped command-line tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolToggles {
    pub nuclei: bool,
    pub subfinder: bool,
    pub ffuf: bool,
    pub nmap: bool,
    pub sqlmap: bool,
    pub gobuster: bool,
    pub curl: bool,
}

impl ToolToggles {
    pub fn any(&self) -> bool {
        self.nuclei || self.subfinder || self.ffuf || self.nmap || self.sqlmap || self.gobuster || self.curl
    }
}

/// Every knob a scan reads. Missing keys in a config file fall back to the
/// values in `Default`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub threads: usize,
    pub timeout: u64,
    pub retries: u32,
    /// Seconds to wait between consecutive targets.
    pub delay: f64,
    pub user_agent: String,
    pub headers: BTreeMap<String, String>,
    pub cookies: Option<String>,
    pub proxy: Option<String>,
    pub verify_ssl: bool,
    pub max_redirects: usize,
    /// Schemes tried for targets given without one.
    pub schemes: Vec<String>,
    pub deep: bool,
    pub crawl: bool,
    pub inject: bool,
    /// Restricts the scan to the mapping and technology phases.
    pub passive: bool,
    /// Runs the DNS and certificate analyzers during mapping.
    pub analyzers: bool,
    pub max_crawl_depth: usize,
    pub max_crawl_pages: usize,
    pub max_inject_endpoints: usize,
    pub payloads: Vec<String>,
    pub wordlist_file: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub report_formats: Vec<String>,
    /// Upper bound on a single external tool invocation, in seconds.
    pub tool_timeout: u64,
    pub tools: ToolToggles,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            threads: 100,
            timeout: 30,
            retries: 2,
            delay: 0.0,
            user_agent: "ShadowRecon/1.0".to_string(),
            headers: BTreeMap::new(),
            cookies: None,
            proxy: None,
            verify_ssl: false,
            max_redirects: 5,
            schemes: vec!["https".to_string()],
            deep: false,
            crawl: false,
            inject: false,
            passive: false,
            analyzers: true,
            max_crawl_depth: 3,
            max_crawl_pages: 100,
            max_inject_endpoints: 10,
            payloads: ["xss", "lfi", "ssrf", "sqli"].iter().map(|s| s.to_string()).collect(),
            wordlist_file: None,
            output_dir: PathBuf::from("."),
            report_formats: vec!["json".to_string()],
            tool_timeout: 300,
            tools: ToolToggles::default(),
        }
    }
}

fn project_directory() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "shadowrecon", env!("CARGO_PKG_NAME"))
}

/// The default location of `shadowrecon.toml`.
pub fn get_config_path() -> PathBuf {
    match project_directory() {
        Some(dirs) => dirs.config_dir().join(CONFIG_FILE),
        None => PathBuf::from(".").join(CONFIG_FILE),
    }
}

impl ScanConfig {
    /// Loads the user's configuration file if one exists, otherwise the
    /// defaults, then applies environment overrides and validates the result.
    pub fn load() -> Result<Self, ConfigError> {
        let path = get_config_path();
        let config = if path.exists() {
            info!(path = %path.display(), "Loading configuration file.");
            Self::read_file(&path)?
        } else {
            debug!(path = %path.display(), "No configuration file found, using defaults.");
            Self::default()
        };
        config.finish()
    }

    /// Loads an explicit configuration file. Unlike `load`, a missing file is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::read_file(path.as_ref())?.finish()
    }

    pub fn from_toml(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    fn read_file(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(toml::from_str(&source)?)
    }

    fn finish(mut self) -> Result<Self, ConfigError> {
        self.apply_env_overrides()?;
        self.validate()?;
        Ok(self)
    }

    /// `SHADOWRECON_THREADS`, `SHADOWRECON_TIMEOUT` and `SHADOWRECON_PROXY`
    /// take precedence over the file.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(value) = std::env::var("SHADOWRECON_THREADS") {
            self.threads = value.parse().map_err(|_| ConfigError::Invalid {
                field: "SHADOWRECON_THREADS",
                reason: format!("'{value}' is not a positive integer"),
            })?;
        }
        if let Ok(value) = std::env::var("SHADOWRECON_TIMEOUT") {
            self.timeout = value.parse().map_err(|_| ConfigError::Invalid {
                field: "SHADOWRECON_TIMEOUT",
                reason: format!("'{value}' is not a number of seconds"),
            })?;
        }
        if let Ok(value) = std::env::var("SHADOWRECON_PROXY") {
            if !value.trim().is_empty() {
                self.proxy = Some(value.trim().to_string());
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::Invalid { field: "threads", reason: "must be at least 1".to_string() });
        }
        if self.timeout == 0 {
            return Err(ConfigError::Invalid { field: "timeout", reason: "must be at least 1 second".to_string() });
        }
        if !self.delay.is_finite() || self.delay < 0.0 {
            return Err(ConfigError::Invalid { field: "delay", reason: "must be a non-negative number".to_string() });
        }
        if self.delay > MAX_DELAY_SECS as f64 {
            return Err(ConfigError::Invalid {
                field: "delay",
                reason: format!("must not exceed {MAX_DELAY_SECS} seconds"),
            });
        }
        for scheme in &self.schemes {
            if scheme != "http" && scheme != "https" {
                return Err(ConfigError::Invalid { field: "schemes", reason: format!("unsupported scheme '{scheme}'") });
            }
        }
        for category in &self.payloads {
            VulnKind::from_str(category).map_err(|_| ConfigError::UnknownCategory(category.clone()))?;
        }
        for format in &self.report_formats {
            if format != "json" {
                warn!(format = %format, "Unsupported report format will be ignored.");
            }
        }
        Ok(())
    }

    pub fn timeout_duration(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    /// The inter-target pause. Out-of-range values count as no pause.
    pub fn delay_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.delay).unwrap_or(Duration::ZERO).min(Duration::from_secs(MAX_DELAY_SECS))
    }

    pub fn flags(&self) -> PhaseFlags {
        PhaseFlags {
            deep: self.deep,
            crawl: self.crawl && !self.passive,
            inject: self.inject && !self.passive,
            passive: self.passive,
            external: self.tools.any() && !self.passive,
        }
    }

    /// Merges a `"Name: value, Other: value"` list into the custom headers.
    pub fn add_header_list(&mut self, list: &str) {
        self.headers.extend(parse_header_list(list));
    }
}

/// Parses a comma-separated `Name: value` list. Entries without a colon are skipped.
pub fn parse_header_list(list: &str) -> BTreeMap<String, String> {
    list.split(',')
        .filter_map(|entry| entry.split_once(':'))
        .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
        .filter(|(name, _)| !name.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ScanConfig::default();
        assert_eq!(config.threads, 100);
        assert_eq!(config.timeout, 30);
        assert_eq!(config.retries, 2);
        assert_eq!(config.user_agent, "ShadowRecon/1.0");
        assert!(!config.verify_ssl);
        assert_eq!(config.max_redirects, 5);
        assert_eq!(config.payloads, vec!["xss", "lfi", "ssrf", "sqli"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults_for_missing_keys() {
        let config = ScanConfig::from_toml(
            r#"
            threads = 8
            crawl = true
            payloads = ["xss", "rce"]

            [tools]
            ffuf = true
            "#,
        )
        .unwrap();
        assert_eq!(config.threads, 8);
        assert!(config.crawl);
        assert_eq!(config.timeout, 30);
        assert!(config.tools.ffuf);
        assert!(!config.tools.nmap);
        assert!(config.flags().external);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(ScanConfig::from_toml("threads = 0"), Err(ConfigError::Invalid { field: "threads", .. })));
        assert!(matches!(ScanConfig::from_toml(r#"payloads = ["nope"]"#), Err(ConfigError::UnknownCategory(_))));
        assert!(matches!(ScanConfig::from_toml(r#"schemes = ["ftp"]"#), Err(ConfigError::Invalid { .. })));
        assert!(matches!(ScanConfig::from_toml("threads = \"many\""), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn rejects_delays_too_large_for_a_duration() {
        let config = ScanConfig { delay: 1e300, ..ScanConfig::default() };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { field: "delay", .. })));
        assert!(matches!(ScanConfig::from_toml("delay = 86400.5"), Err(ConfigError::Invalid { field: "delay", .. })));

        assert_eq!(config.delay_duration(), Duration::ZERO);
        let short = ScanConfig { delay: 0.25, ..ScanConfig::default() };
        assert!(short.validate().is_ok());
        assert_eq!(short.delay_duration(), Duration::from_millis(250));
    }

    #[test]
    fn passive_mode_disables_active_phases() {
        let config = ScanConfig { crawl: true, inject: true, passive: true, ..ScanConfig::default() };
        let flags = config.flags();
        assert!(!flags.crawl);
        assert!(!flags.inject);
        assert!(flags.passive);
    }

    #[test]
    fn header_list_parsing() {
        let headers = parse_header_list("X-Api-Key: abc123, Accept:text/html,broken,: empty");
        assert_eq!(headers.len(), 2);
        assert_eq!(headers["X-Api-Key"], "abc123");
        assert_eq!(headers["Accept"], "text/html");
    }

    #[test]
    fn from_file_reports_missing_file() {
        let missing = std::env::temp_dir().join("shadowrecon-definitely-missing.toml");
        assert!(matches!(ScanConfig::from_file(&missing), Err(ConfigError::Io { .. })));
    }

    #[test]
    fn from_file_reads_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        std::io::Write::write_all(&mut file, b"timeout = 5\nschemes = [\"http\"]\n").unwrap();
        let config = ScanConfig::from_file(file.path()).unwrap();
        assert_eq!(config.timeout, 5);
        assert_eq!(config.schemes, vec!["http"]);
    }
}
