// ABOUTME: The update subcommand: ad-hoc create or update of one stack
// ABOUTME: from a template file, without a manifest.

use super::print_identity;
use cirrus::cfn::{AwsClient, AwsOptions};
use cirrus::deploy::Deployer;
use cirrus::error::{Error, Result};
use cirrus::manifest::{Deployment, read_parameter_file};
use cirrus::output::StdinPrompt;
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

pub struct Options {
    pub parameters: Vec<String>,
    pub parameter_files: Vec<PathBuf>,
    pub yes: bool,
    pub stack_name: Option<String>,
    pub diff: bool,
    pub template: PathBuf,
}

pub async fn run(aws: &AwsOptions, opts: Options) -> Result<()> {
    let stack_name = derive_stack_name(&opts).ok_or(Error::MissingStackName)?;

    // Files first, then explicit parameters override.
    let mut parameters = BTreeMap::new();
    for path in &opts.parameter_files {
        for (key, value) in read_parameter_file(path)? {
            parameters.insert(key, value);
        }
    }
    for spec in &opts.parameters {
        let (key, value) = spec
            .split_once('=')
            .ok_or_else(|| Error::InvalidParameter(spec.clone()))?;
        parameters.insert(key.to_string(), value.to_string());
    }

    let template_body = std::fs::read_to_string(&opts.template)?;

    let deployment = Deployment {
        stack_name,
        template_body,
        parameters,
        // Ad-hoc updates always confirm execution unless --yes was given.
        protected: !opts.yes,
        ..Default::default()
    };

    let client = AwsClient::connect(aws).await;
    let mut stdout = io::stdout();

    print_identity(&mut stdout, &client, aws.region.as_deref()).await?;

    let mut deployer = Deployer::new(&client);
    deployer.show_diff = opts.diff;

    deployer
        .deploy(&deployment, &mut stdout, &mut StdinPrompt)
        .await?;

    Ok(())
}

/// The stack name falls back to the first parameter file's stem, then the
/// template file's stem. Stems stop at the first dot.
fn derive_stack_name(opts: &Options) -> Option<String> {
    if let Some(name) = &opts.stack_name {
        if !name.is_empty() {
            return Some(name.clone());
        }
    }

    opts.parameter_files
        .iter()
        .find_map(|p| file_stem(p))
        .or_else(|| file_stem(&opts.template))
}

fn file_stem(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    let stem = name.split('.').next().unwrap_or_default();
    if stem.is_empty() {
        None
    } else {
        Some(stem.to_string())
    }
}
