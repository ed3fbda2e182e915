use std::fmt::Display;

use serde::Serialize;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Notice,
    Warning,
}

/// A recoverable problem met while building a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Collects diagnostics for the caller and mirrors them to the log.
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn notice(&mut self, title: &str, message: impl Into<String>) {
        let message = message.into();
        info!(title, message = %message, "Query notice");
        self.push(Severity::Notice, title, message);
    }

    pub fn warning(&mut self, title: &str, message: impl Into<String>) {
        let message = message.into();
        warn!(title, message = %message, "Query warning");
        self.push(Severity::Warning, title, message);
    }

    fn push(&mut self, severity: Severity, title: &str, message: String) {
        self.entries.push(Diagnostic {
            severity,
            title: title.to_string(),
            message,
        });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn has_warnings(&self) -> bool {
        self.entries.iter().any(|entry| entry.severity == Severity::Warning)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use crate::builder::{Diagnostics, Severity};

    #[test]
    pub fn test_diagnostics_collect_in_order() {
        let mut diagnostics = Diagnostics::default();
        diagnostics.notice("Condition ignored", "table foo is not used");
        assert!(!diagnostics.has_warnings());

        diagnostics.warning("Unreliable alias match", "pages");
        let entries = diagnostics.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].severity, Severity::Notice);
        assert_eq!(entries[1].to_string(), "Unreliable alias match: pages");
        assert!(diagnostics.has_warnings());

        diagnostics.clear();
        assert!(diagnostics.entries().is_empty());
    }
}
