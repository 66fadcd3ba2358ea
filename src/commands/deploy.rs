// ABOUTME: The deploy subcommand: resolve manifest deployments and drive
// ABOUTME: each one through the change-set orchestrator in sequence.

use super::{find_manifest, print_identity};
use cirrus::cfn::{AwsClient, AwsOptions};
use cirrus::deploy::{DeployError, Deployer};
use cirrus::error::Result;
use cirrus::manifest::Manifest;
use cirrus::output::{StdinPrompt, field};
use std::io;
use std::path::{Path, PathBuf};

pub struct Options {
    pub yes: bool,
    pub manifest: Option<PathBuf>,
    pub stack: Option<String>,
    pub tenant: Option<String>,
    pub diff: bool,
}

pub async fn run(aws: &AwsOptions, opts: Options) -> Result<()> {
    let manifest_path = match opts.manifest {
        Some(path) => path,
        None => find_manifest()?,
    };

    let mut stdout = io::stdout();
    field(&mut stdout, "Manifest", &manifest_path.display().to_string())?;

    let manifest = Manifest::load(&manifest_path)?;
    let base = manifest_path.parent().unwrap_or(Path::new("."));

    let deployments =
        manifest.deployments_matching(opts.tenant.as_deref(), opts.stack.as_deref(), base)?;
    tracing::debug!(count = deployments.len(), "resolved deployments");

    let mut identity = None;

    for (i, mut deployment) in deployments.into_iter().enumerate() {
        if i > 0 {
            println!();
        }

        // The manifest's resolved region wins over the global flag.
        let client = AwsClient::connect(&AwsOptions {
            profile: aws.profile.clone(),
            region: if deployment.region.is_empty() {
                aws.region.clone()
            } else {
                Some(deployment.region.clone())
            },
        })
        .await;

        if identity.is_none() {
            identity = Some(print_identity(&mut stdout, &client, None).await?);
        }

        // One authenticated principal per invocation; a deployment pinned
        // to a different account must not proceed.
        if let Some(identity) = &identity {
            if !deployment.account_id.is_empty()
                && deployment.account_id != identity.account_id
            {
                return Err(DeployError::AccountMismatch {
                    expected: deployment.account_id.clone(),
                    actual: identity.account_id.clone(),
                }
                .into());
            }
        }

        // Unprotected stacks still confirm unless --yes was given.
        if !deployment.protected && !opts.yes {
            deployment.protected = true;
        }

        let mut deployer = Deployer::new(&client);
        deployer.show_diff = opts.diff;

        deployer
            .deploy(&deployment, &mut stdout, &mut StdinPrompt)
            .await?;
    }

    Ok(())
}
