// ABOUTME: Stack and change-set status classification.
// ABOUTME: Stack statuses are opaque strings classified by suffix convention.

use std::fmt;

/// Status name CloudFormation reports after a fresh creation rolled back.
pub const ROLLBACK_COMPLETE: &str = "ROLLBACK_COMPLETE";

/// An opaque stack status string from the control plane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StackStatus(String);

impl StackStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_complete(&self) -> bool {
        self.0.ends_with("_COMPLETE")
    }

    pub fn is_failed(&self) -> bool {
        self.0.ends_with("_FAILED")
    }

    /// No further automatic transition occurs from a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.is_complete() || self.is_failed()
    }
}

impl fmt::Display for StackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A change-set status string. Unlike stack statuses these have a small
/// closed set of interesting values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetStatus(String);

impl ChangeSetStatus {
    pub fn new(status: impl Into<String>) -> Self {
        Self(status.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_create_complete(&self) -> bool {
        self.0 == "CREATE_COMPLETE"
    }

    pub fn is_failed(&self) -> bool {
        self.0 == "FAILED"
    }

    pub fn is_delete_complete(&self) -> bool {
        self.0 == "DELETE_COMPLETE"
    }
}

impl fmt::Display for ChangeSetStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
