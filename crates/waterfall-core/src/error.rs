use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaterfallError {
    #[error("Invalid transactions: {} offending field(s) — {}", .issues.len(), IssueList(.issues))]
    Validation { issues: Vec<RecordIssue> },

    #[error("Invalid configuration: {field} — {reason}")]
    Configuration { field: String, reason: String },

    #[error("Computation invariant violated: {0}")]
    Computation(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl WaterfallError {
    pub fn configuration(field: &str, reason: impl Into<String>) -> Self {
        WaterfallError::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    /// Machine-readable tag used in the `error.kind` field of a response.
    pub fn kind(&self) -> &'static str {
        match self {
            WaterfallError::Validation { .. } => "validation_error",
            WaterfallError::Configuration { .. } => "configuration_error",
            WaterfallError::Computation(_) => "computation_error",
            WaterfallError::SerializationError(_) => "request_error",
        }
    }
}

impl From<serde_json::Error> for WaterfallError {
    fn from(e: serde_json::Error) -> Self {
        WaterfallError::SerializationError(e.to_string())
    }
}

/// One offending field of one raw transaction record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordIssue {
    /// Zero-based position of the record in the submitted batch
    pub index: usize,
    /// Wire name of the offending field
    pub field: String,
    /// The raw value as submitted
    pub value: String,
    pub reason: String,
}

impl fmt::Display for RecordIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "record {} {} '{}': {}",
            self.index, self.field, self.value, self.reason
        )
    }
}

struct IssueList<'a>(&'a [RecordIssue]);

impl fmt::Display for IssueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}
