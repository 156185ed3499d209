//! FHIR OperationOutcome model
//!
//! Servers return OperationOutcome bodies alongside error statuses, and as
//! informational results of operations.

use super::complex::CodeableConcept;
use super::resource::ResourceBase;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// FHIR OperationOutcome resource
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcome {
    #[serde(flatten)]
    pub base: ResourceBase,

    #[serde(default)]
    pub issue: Vec<OperationOutcomeIssue>,

    /// Additional content beyond core fields
    #[serde(flatten)]
    pub additional: HashMap<String, Value>,
}

crate::impl_resource!(OperationOutcome, "OperationOutcome");

/// A single issue associated with the action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OperationOutcomeIssue {
    pub severity: IssueSeverity,

    pub code: IssueType,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<CodeableConcept>,

    /// Additional diagnostic information about the issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<String>,

    /// FHIRPath of element(s) related to issue
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<Vec<String>>,
}

/// Severity of the issue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum IssueSeverity {
    Fatal,
    Error,
    Warning,
    Information,
}

/// Type of issue
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum IssueType {
    Invalid,
    Structure,
    Required,
    Value,
    Invariant,
    Security,
    Login,
    Unknown,
    Expired,
    Forbidden,
    Suppressed,
    Processing,
    NotSupported,
    Duplicate,
    MultipleMatches,
    NotFound,
    Deleted,
    TooLong,
    CodeInvalid,
    Extension,
    TooCostly,
    BusinessRule,
    Conflict,
    Incomplete,
    Transient,
    LockError,
    NoStore,
    Exception,
    Timeout,
    Throttled,
    Informational,
}

impl OperationOutcome {
    pub fn new() -> Self {
        Self {
            base: ResourceBase::new("OperationOutcome"),
            issue: Vec::new(),
            additional: HashMap::new(),
        }
    }

    /// Outcome holding a single error issue
    pub fn error(code: IssueType, diagnostics: impl Into<String>) -> Self {
        let mut outcome = Self::new();
        outcome.issue.push(OperationOutcomeIssue {
            severity: IssueSeverity::Error,
            code,
            details: None,
            diagnostics: Some(diagnostics.into()),
            expression: None,
        });
        outcome
    }

    /// True if any issue is an error or fatal
    pub fn has_errors(&self) -> bool {
        self.issue
            .iter()
            .any(|issue| issue.severity <= IssueSeverity::Error)
    }

    /// Diagnostics of all issues, joined for display
    pub fn summary(&self) -> String {
        self.issue
            .iter()
            .filter_map(|issue| {
                issue
                    .diagnostics
                    .as_deref()
                    .or_else(|| issue.details.as_ref()?.text.as_deref())
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Default for OperationOutcome {
    fn default() -> Self {
        Self::new()
    }
}
