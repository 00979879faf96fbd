use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a validation finding, ordered `Info < Warning < Error`.
///
/// Only `Error` findings are blocking-eligible; `Warning` findings are
/// surfaced but never block on their own, and `Info` findings are advisory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Outcome of a single validator (or the composite): validity, message,
/// severity. Pure data; the aggregation rule lives in the composite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub is_valid: bool,
    pub message: String,
    pub severity: Severity,
}

impl Verdict {
    /// A clean pass with no message.
    pub fn passed() -> Self {
        Self {
            is_valid: true,
            message: String::new(),
            severity: Severity::Info,
        }
    }

    /// A blocking-eligible violation.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    /// Allowed, but flagged for the operator.
    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            severity: Severity::Warning,
        }
    }

    /// Advisory note (suggestions, tips). Never affects aggregation.
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            is_valid: true,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    /// True when this verdict neither blocks nor warns.
    pub fn is_clean(&self) -> bool {
        self.is_valid && self.severity == Severity::Info
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Error > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn test_constructors() {
        let v = Verdict::passed();
        assert!(v.is_valid);
        assert!(v.is_clean());
        assert!(v.message.is_empty());

        let v = Verdict::error("bad");
        assert!(!v.is_valid);
        assert_eq!(v.severity, Severity::Error);

        let v = Verdict::warning("careful");
        assert!(v.is_valid);
        assert_eq!(v.severity, Severity::Warning);
        assert!(!v.is_clean());
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Severity::Error).unwrap(), "\"error\"");
        assert_eq!(serde_json::to_string(&Severity::Warning).unwrap(), "\"warning\"");
    }
}
