//! Static, read-only descriptions of every vulnerability class a hunter can
//! report, with remediation advice. The terminal front end shows these next to
//! each finding.

use crate::core::models::{Severity, VulnKind};
use std::fmt;

/// Groups vulnerability classes for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FindingCategory {
    /// Payloads that end up executed or interpreted by the server.
    Injection,
    /// Payloads that make the server read files or URLs it should not.
    Access,
    /// Weaknesses in how the application treats the browser.
    Client,
}

impl fmt::Display for FindingCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FindingCategory::Injection => write!(f, "Server-Side Injection"),
            FindingCategory::Access => write!(f, "Unauthorized Resource Access"),
            FindingCategory::Client => write!(f, "Client-Side Weakness"),
        }
    }
}

/// Human-readable information about one vulnerability class.
pub struct FindingDetail {
    /// The class this entry describes.
    pub kind: VulnKind,
    /// A short title for the class.
    pub title: &'static str,
    pub category: FindingCategory,
    /// The severity the hunter reports for this class.
    pub severity: Severity,
    /// What the finding means and how it was detected.
    pub description: &'static str,
    /// Steps to fix the issue.
    pub remediation: &'static str,
}

static FINDINGS: &[FindingDetail] = &[
    // --- Injection ---
    FindingDetail {
        kind: VulnKind::Xss,
        title: "Reflected Cross-Site Scripting",
        category: FindingCategory::Injection,
        severity: Severity::High,
        description: "A script payload sent in a query parameter came back in the page unescaped. An attacker can craft a link that runs JavaScript in a victim's browser with the victim's session.",
        remediation: "HTML-encode every user-controlled value at the point it is written into the page, and add a Content-Security-Policy that forbids inline scripts."
    },
    FindingDetail {
        kind: VulnKind::Sqli,
        title: "SQL Injection",
        category: FindingCategory::Injection,
        severity: Severity::High,
        description: "A quote or boolean payload made the application return a database error message. The parameter is concatenated into a SQL statement, which usually allows reading or modifying the database.",
        remediation: "Use parameterized queries or prepared statements for every database call, and stop returning raw database errors to clients."
    },
    FindingDetail {
        kind: VulnKind::CommandInjection,
        title: "OS Command Injection",
        category: FindingCategory::Injection,
        severity: Severity::Critical,
        description: "A shell metacharacter payload produced the output of the `id` or `whoami` command. The parameter reaches a shell, giving an attacker command execution as the web server user.",
        remediation: "Never build shell command lines from request data. Call programs directly with an argument list and validate inputs against a strict allow-list."
    },
    FindingDetail {
        kind: VulnKind::TemplateInjection,
        title: "Server-Side Template Injection",
        category: FindingCategory::Injection,
        severity: Severity::High,
        description: "An arithmetic template expression was evaluated by the server instead of being echoed back. Template engines usually expose enough of the runtime to reach code execution.",
        remediation: "Pass user input to templates only as data, never as template source. Enable the engine's sandbox mode where it has one."
    },
    // --- Access ---
    FindingDetail {
        kind: VulnKind::Lfi,
        title: "Local File Inclusion",
        category: FindingCategory::Access,
        severity: Severity::High,
        description: "A path payload caused the contents of a system file such as /etc/passwd to appear in the response. The application opens files named by the request.",
        remediation: "Map user choices to a fixed set of files on the server instead of accepting paths, and run the application with the least file system access it needs."
    },
    FindingDetail {
        kind: VulnKind::DirectoryTraversal,
        title: "Directory Traversal",
        category: FindingCategory::Access,
        severity: Severity::High,
        description: "Relative path sequences such as ../ escaped the intended directory and exposed operating system files.",
        remediation: "Canonicalize requested paths and reject any that resolve outside the allowed base directory. Decode input fully before validating it."
    },
    FindingDetail {
        kind: VulnKind::Ssrf,
        title: "Server-Side Request Forgery",
        category: FindingCategory::Access,
        severity: Severity::Critical,
        description: "A cloud metadata URL passed in a parameter was fetched by the server and its answer returned. Attackers can use this to read instance credentials and reach internal services.",
        remediation: "Only fetch URLs from an allow-list of hosts, block link-local and private address ranges, and require IMDSv2 or an equivalent token on cloud instances."
    },
    // --- Client ---
    FindingDetail {
        kind: VulnKind::Csrf,
        title: "Missing CSRF Protection",
        category: FindingCategory::Client,
        severity: Severity::Medium,
        description: "The page contains a form but no anti-forgery token. Another site could submit the form on behalf of a logged-in user.",
        remediation: "Add a per-session or per-request anti-CSRF token to every state-changing form and verify it on the server. Set session cookies with SameSite=Lax or Strict."
    },
];

/// Retrieves the detail for a vulnerability class.
///
/// # Arguments
///
/// * `kind` - The class reported by a hunter.
///
/// # Returns
///
/// The matching `FindingDetail`, or `None` if the class has no entry.
pub fn get_finding_detail(kind: VulnKind) -> Option<&'static FindingDetail> {
    FINDINGS.iter().find(|f| f.kind == kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn every_class_is_described() {
        for kind in VulnKind::iter() {
            let detail = get_finding_detail(kind);
            assert!(detail.is_some(), "no entry for {kind}");
        }
    }

    #[test]
    fn severities_match_hunters() {
        assert_eq!(get_finding_detail(VulnKind::Ssrf).map(|d| d.severity), Some(Severity::Critical));
        assert_eq!(get_finding_detail(VulnKind::Csrf).map(|d| d.severity), Some(Severity::Medium));
    }
}
