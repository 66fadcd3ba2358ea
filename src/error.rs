// ABOUTME: Application-wide error types for cirrus.
// ABOUTME: Uses thiserror for ergonomic error handling.

use crate::deploy::DeployError;
use crate::manifest::ManifestError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("manifest file not found in {0} or any parent directory")]
    ManifestNotFound(PathBuf),

    #[error("stack name is required")]
    MissingStackName,

    #[error("invalid parameter, expected Key=Value: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Deploy(#[from] DeployError),

    #[error("credential cache error: {0}")]
    Credentials(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the failure is a declined confirmation prompt. The top
    /// level prints a dedicated message for this instead of an error dump.
    pub fn is_aborted_by_user(&self) -> bool {
        matches!(self, Error::Deploy(DeployError::AbortedByUser))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
