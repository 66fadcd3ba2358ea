// ABOUTME: Command handlers for the CLI subcommands.
// ABOUTME: Shared helpers for manifest discovery and identity printing.

pub mod deploy;
pub mod list;
pub mod update;
pub mod whoami;

use cirrus::cfn::{CallerIdentity, IdentityOps};
use cirrus::error::{Error, Result};
use cirrus::output::field;
use std::env;
use std::io::Write;
use std::path::PathBuf;

const MANIFEST_NAMES: [&str; 2] = [".cirrus.yml", "cirrus.yml"];

/// Walk up from the working directory looking for a manifest file.
pub fn find_manifest() -> Result<PathBuf> {
    let start = env::current_dir()?;
    let mut dir = start.as_path();

    loop {
        for name in MANIFEST_NAMES {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }

        match dir.parent() {
            Some(parent) => dir = parent,
            None => return Err(Error::ManifestNotFound(start)),
        }
    }
}

/// Fetch and print the caller identity, returning it for further checks.
pub async fn print_identity<W: Write, C: IdentityOps>(
    w: &mut W,
    client: &C,
    region: Option<&str>,
) -> Result<CallerIdentity> {
    let identity = client
        .caller_identity()
        .await
        .map_err(cirrus::deploy::DeployError::from)?;

    field(w, "Account", &identity.account_id)?;
    field(w, "Role", &identity.arn)?;
    if let Some(region) = region.filter(|r| !r.is_empty()) {
        field(w, "Region", region)?;
    }

    Ok(identity)
}
