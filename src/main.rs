// ABOUTME: Entry point for the cirrus CLI application.
// ABOUTME: Parses arguments and dispatches to appropriate command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    if let Err(e) = run(cli).await {
        if e.is_aborted_by_user() {
            println!("Aborted by user.");
        } else {
            eprintln!("Error: {e}");
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> cirrus::error::Result<()> {
    let aws = cirrus::cfn::AwsOptions {
        profile: cli.profile,
        region: cli.region,
    };

    match cli.command {
        Commands::Deploy {
            yes,
            manifest,
            stack,
            tenant,
            diff,
        } => {
            commands::deploy::run(&aws, commands::deploy::Options {
                yes,
                manifest,
                stack,
                tenant,
                diff,
            })
            .await
        }
        Commands::Update {
            parameters,
            parameter_files,
            yes,
            stack_name,
            diff,
            template,
        } => {
            commands::update::run(&aws, commands::update::Options {
                parameters,
                parameter_files,
                yes,
                stack_name,
                diff,
                template,
            })
            .await
        }
        Commands::List { manifest } => commands::list::run(manifest),
        Commands::Whoami => commands::whoami::run(&aws).await,
    }
}
