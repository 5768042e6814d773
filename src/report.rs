//! Mismatch recording and the aggregated failure report
//!
//! Mismatches are recorded, never thrown: the walk keeps going and every
//! independent difference across the whole graph ends up in one report.

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One violated expectation, qualified by the path it was found at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    /// Path from the comparison root, e.g. `tables[Orders].rows[0].Amount`.
    /// Empty at the root itself.
    pub path: String,
    pub message: String,
}

/// Everything one comparison call found.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub failures: Vec<Failure>,
}

impl ComparisonReport {
    pub fn is_equivalent(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Failure> {
        self.failures.iter()
    }

    /// True when some failure message mentions the given text.
    pub fn mentions(&self, needle: &str) -> bool {
        self.failures
            .iter()
            .any(|f| f.message.contains(needle) || f.path.contains(needle))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl fmt::Display for ComparisonReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return f.write_str("No differences found");
        }

        writeln!(
            f,
            "Found {} difference(s) between actual and expected:",
            self.failures.len()
        )?;

        for failure in &self.failures {
            let path = if failure.path.is_empty() {
                "(root)"
            } else {
                failure.path.as_str()
            };
            writeln!(f, "  - at {}: {}", path, failure.message)?;
        }

        Ok(())
    }
}

/// Records formatted failures during a walk. Appends the caller's reason
/// clause, if one was given, to every message it records.
#[derive(Debug, Default)]
pub(crate) struct FailureSink {
    failures: Vec<Failure>,
    because: Option<String>,
}

impl FailureSink {
    pub(crate) fn new(because: Option<String>) -> Self {
        Self {
            failures: Vec::new(),
            because: because.map(|reason| phrase_reason(&reason)),
        }
    }

    pub(crate) fn fail(&mut self, path: String, message: impl Into<String>) {
        let mut message = message.into();

        if let Some(because) = &self.because {
            message.push(' ');
            message.push_str(because);
        }

        self.failures.push(Failure { path, message });
    }

    pub(crate) fn len(&self) -> usize {
        self.failures.len()
    }

    pub(crate) fn into_report(self) -> ComparisonReport {
        ComparisonReport {
            failures: self.failures,
        }
    }
}

/// Prepends "because" to a reason unless it already starts with it.
pub(crate) fn phrase_reason(reason: &str) -> String {
    let trimmed = reason.trim();

    if trimmed.to_ascii_lowercase().starts_with("because") {
        trimmed.to_string()
    } else {
        format!("because {trimmed}")
    }
}
