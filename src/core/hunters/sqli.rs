// src/core/hunters/sqli.rs

use once_cell::sync::Lazy;
use regex::Regex;

use super::InjectionHunter;
use crate::core::models::{Severity, VulnKind};

pub const PARAMETER: &str = "id";
pub const PAYLOAD_LIMIT: usize = 5;

// Error strings leaked by common database drivers.
static RE_SQL_ERROR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(you have an error in your sql syntax|warning: mysqli?_|unclosed quotation mark after the character string|quoted string not properly terminated|pg::syntaxerror|syntax error at or near|postgresql query failed|sqlite3?::|sqlite_error|sqlstate\[\w+\]|ora-\d{5}|microsoft ole db provider for sql server|odbc sql server driver)",
    )
    .unwrap()
});

pub fn hunter(payloads: Vec<String>) -> InjectionHunter {
    InjectionHunter::new(VulnKind::Sqli, PARAMETER, payloads, Severity::High, detect)
}

/// Error-based detection: the response contains a database error message.
pub fn detect(_payload: &str, body: &str) -> Option<String> {
    RE_SQL_ERROR.find(body).map(|m| format!("Database error in response: {}", m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn database_errors_are_detected() {
        let mysql = "Warning: mysqli_fetch_array() expects parameter 1";
        assert!(detect("'", mysql).is_some());
        let mssql = "Unclosed quotation mark after the character string ''.";
        assert!(detect("'", mssql).unwrap().contains("Unclosed quotation mark"));
        assert!(detect("'", "ORA-01756: quoted string not properly terminated").is_some());
    }

    #[test]
    fn normal_pages_are_ignored() {
        assert!(detect("'", "<html><body>Product 42</body></html>").is_none());
    }
}
