// ABOUTME: Error type for the change-set orchestration.
// ABOUTME: Distinguishes user aborts from control-plane failures.

use crate::cfn::CfnError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Aborted by user.")]
    AbortedByUser,

    #[error("change set failed: {reason}")]
    ChangeSetFailed { reason: String },

    #[error("change set was removed before execution")]
    ChangeSetRemoved,

    #[error("stack update failed, terminal status {status}")]
    StackUpdateFailed { status: String },

    #[error("account mismatch: manifest expects {expected}, credentials resolve to {actual}")]
    AccountMismatch { expected: String, actual: String },

    #[error(transparent)]
    Cfn(#[from] CfnError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
