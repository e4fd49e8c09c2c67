//! Validation reports for config items and groups.
//!
//! A [`ValidationResult`] collects every problem found in a config tree so
//! that a caller can report them all at once instead of failing on the first.

use std::fmt;

use crate::error::ConfigError;

/// Outcome of checking a single config item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldValidation {
    pub passed: bool,
    pub message: Option<String>,
}

impl FieldValidation {
    pub fn pass() -> Self {
        Self {
            passed: true,
            message: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            passed: false,
            message: Some(message.into()),
        }
    }
}

/// One line of a validation report.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationEntry {
    /// Dotted path of the field or group, e.g. `node_vulnerabilities.min`.
    /// Group-level rules use the group's own path.
    pub path: String,
    pub passed: bool,
    pub message: Option<String>,
}

/// Aggregated validation outcome of a config group and all its children.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationResult {
    entries: Vec<ValidationEntry>,
}

impl ValidationResult {
    /// Record the outcome of an item.
    pub fn record_field(&mut self, path: impl Into<String>, outcome: FieldValidation) {
        self.entries.push(ValidationEntry {
            path: path.into(),
            passed: outcome.passed,
            message: outcome.message,
        });
    }

    /// Record a violated cross-field rule of the group being validated.
    pub fn add_group_error(&mut self, message: impl Into<String>) {
        self.entries.push(ValidationEntry {
            path: String::new(),
            passed: false,
            message: Some(message.into()),
        });
    }

    /// Fold a child group's result into this one under `prefix`.
    pub fn merge(&mut self, prefix: &str, child: ValidationResult) {
        for mut entry in child.entries {
            entry.path = if entry.path.is_empty() {
                prefix.to_string()
            } else {
                format!("{}.{}", prefix, entry.path)
            };
            self.entries.push(entry);
        }
    }

    /// True when every item and every group rule passed.
    pub fn passed(&self) -> bool {
        self.entries.iter().all(|e| e.passed)
    }

    pub fn entries(&self) -> &[ValidationEntry] {
        &self.entries
    }

    pub fn failures(&self) -> impl Iterator<Item = &ValidationEntry> {
        self.entries.iter().filter(|e| !e.passed)
    }

    /// Messages of the failures recorded at exactly `path`.
    pub fn messages_for(&self, path: &str) -> Vec<&str> {
        self.failures()
            .filter(|e| e.path == path)
            .filter_map(|e| e.message.as_deref())
            .collect()
    }

    /// Convert a failing report into a hard error.
    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.passed() {
            Ok(())
        } else {
            Err(ConfigError::Invalid(self.to_string()))
        }
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.passed() {
            return write!(f, "all {} checks passed", self.entries.len());
        }
        let mut first = true;
        for entry in self.failures() {
            if !first {
                writeln!(f)?;
            }
            first = false;
            let path = if entry.path.is_empty() { "<root>" } else { &entry.path };
            write!(f, "  - {}: {}", path, entry.message.as_deref().unwrap_or("failed"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_prefixes_paths() {
        let mut child = ValidationResult::default();
        child.record_field("min", FieldValidation::fail("too small"));
        child.add_group_error("min above max");

        let mut parent = ValidationResult::default();
        parent.record_field("matrix", FieldValidation::pass());
        parent.merge("node_vulnerabilities", child);

        assert!(!parent.passed());
        assert_eq!(parent.entries().len(), 3);
        assert_eq!(parent.messages_for("node_vulnerabilities.min"), vec!["too small"]);
        assert_eq!(parent.messages_for("node_vulnerabilities"), vec!["min above max"]);
    }

    #[test]
    fn test_into_result() {
        let mut ok = ValidationResult::default();
        ok.record_field("use", FieldValidation::pass());
        assert!(ok.into_result().is_ok());

        let mut bad = ValidationResult::default();
        bad.add_group_error("broken");
        let err = bad.into_result().unwrap_err();
        assert!(err.to_string().contains("<root>: broken"));
    }
}
