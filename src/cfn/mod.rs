// ABOUTME: Control-plane client boundary: capability traits and wire types.
// ABOUTME: Defines StackOps, ChangeSetOps, IdentityOps and CfnError.

mod aws;
mod status;

pub use aws::{AwsClient, AwsOptions};
pub use status::{ChangeSetStatus, ROLLBACK_COMPLETE, StackStatus};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from the control plane. Classification by message substring is a
/// documented fallback: CloudFormation reports "not found" and "no changes"
/// as generic validation faults without a dedicated error code.
#[derive(Debug, Error)]
pub enum CfnError {
    #[error("stack does not exist: {0}")]
    StackNotExists(String),

    #[error("{0}")]
    NoChanges(String),

    #[error("{0}")]
    Api(String),
}

impl CfnError {
    /// Classify a control-plane fault message for a given stack.
    pub fn from_message(stack_name: &str, message: String) -> Self {
        if message.contains("does not exist") {
            CfnError::StackNotExists(stack_name.to_string())
        } else if is_no_changes_message(&message) {
            CfnError::NoChanges(message)
        } else {
            CfnError::Api(message)
        }
    }

    pub fn is_not_exists(&self) -> bool {
        matches!(self, CfnError::StackNotExists(_))
    }

    pub fn is_no_changes(&self) -> bool {
        matches!(self, CfnError::NoChanges(_))
    }
}

/// The "no changes" class of change-set failure. The phrase appears either
/// as a creation fault or as the FAILED status reason.
pub fn is_no_changes_message(message: &str) -> bool {
    message.contains("didn't contain changes")
}

#[derive(Debug, Clone)]
pub struct StackDescription {
    pub name: String,
    pub status: StackStatus,
    pub outputs: Vec<StackOutput>,
}

#[derive(Debug, Clone)]
pub struct StackOutput {
    pub key: String,
    pub value: String,
}

/// Handle for one change set: CloudFormation addresses them by stack name
/// plus change-set name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSetId {
    pub stack_name: String,
    pub change_set_name: String,
}

#[derive(Debug, Clone)]
pub struct ChangeSetDescription {
    pub id: ChangeSetId,
    pub status: ChangeSetStatus,
    pub status_reason: Option<String>,
    pub changes: Vec<ResourceChange>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeAction {
    Add,
    Modify,
    Remove,
    Unknown,
}

#[derive(Debug, Clone)]
pub struct ResourceChange {
    pub action: ChangeAction,
    pub resource_type: String,
    pub logical_id: String,
    pub physical_id: Option<String>,
    /// True when applying this change recreates the resource.
    pub replacement: bool,
    pub details: Vec<ChangeDetail>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Evaluation {
    Static,
    Dynamic,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeSource {
    ResourceReference,
    ParameterReference,
    ResourceAttribute,
    DirectModification,
    Automatic,
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recreation {
    Never,
    Conditionally,
    Always,
}

#[derive(Debug, Clone)]
pub struct ChangeDetail {
    pub attribute: Option<String>,
    pub property_name: Option<String>,
    pub evaluation: Evaluation,
    pub change_source: ChangeSource,
    pub causing_entity: Option<String>,
    pub requires_recreation: Recreation,
}

#[derive(Debug, Clone)]
pub struct StackEvent {
    pub timestamp: DateTime<Utc>,
    pub resource_type: String,
    pub logical_id: String,
    pub resource_status: String,
    pub reason: Option<String>,
}

impl StackEvent {
    pub fn is_failed(&self) -> bool {
        self.resource_status.ends_with("_FAILED")
    }
}

#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub account_id: String,
    pub arn: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeSetType {
    Create,
    Update,
}

#[derive(Debug, Clone)]
pub struct CreateChangeSetInput {
    pub stack_name: String,
    pub change_set_name: String,
    pub template_body: String,
    pub parameters: BTreeMap<String, String>,
    pub change_set_type: ChangeSetType,
}

/// Stack lifecycle operations.
#[async_trait]
pub trait StackOps: Send + Sync {
    async fn describe_stack(&self, name: &str) -> Result<StackDescription, CfnError>;

    async fn delete_stack(&self, name: &str) -> Result<(), CfnError>;

    /// Fetch the currently deployed template body, for diffing.
    async fn get_template(&self, name: &str) -> Result<String, CfnError>;

    /// Events newest-first, as the control plane reports them.
    async fn describe_stack_events(&self, name: &str) -> Result<Vec<StackEvent>, CfnError>;
}

/// Change-set lifecycle operations.
#[async_trait]
pub trait ChangeSetOps: Send + Sync {
    async fn create_change_set(&self, input: &CreateChangeSetInput)
    -> Result<ChangeSetId, CfnError>;

    async fn describe_change_set(
        &self,
        id: &ChangeSetId,
    ) -> Result<ChangeSetDescription, CfnError>;

    async fn execute_change_set(&self, id: &ChangeSetId) -> Result<(), CfnError>;
}

/// Caller identity, for account mismatch detection and `whoami`.
#[async_trait]
pub trait IdentityOps: Send + Sync {
    async fn caller_identity(&self) -> Result<CallerIdentity, CfnError>;
}
