// ABOUTME: The whoami subcommand: print the caller's AWS identity.
// ABOUTME: Useful for checking which profile and account are active.

use super::print_identity;
use cirrus::cfn::{AwsClient, AwsOptions};
use cirrus::error::Result;
use std::io;

pub async fn run(aws: &AwsOptions) -> Result<()> {
    let client = AwsClient::connect(aws).await;
    print_identity(&mut io::stdout(), &client, aws.region.as_deref()).await?;
    Ok(())
}
