// ABOUTME: Error types for manifest parsing and resolution.
// ABOUTME: Validation failures carry every violation, not just the first.

use super::template::TemplateError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ManifestError {
    /// The manifest failed the structural schema check. All violations are
    /// reported at once.
    #[error("manifest schema validation failure: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("expected manifest version {supported}, got {0:?}", supported = super::SUPPORTED_VERSION)]
    UnsupportedVersion(String),

    /// The requested (tenant, stack) pair has no matching target.
    #[error("no deployment of stack {stack} for tenant {tenant}")]
    NotFound { tenant: String, stack: String },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("parameter file {path}: {reason}")]
    ParameterFile { path: PathBuf, reason: String },

    #[error("read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("unmarshal manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
