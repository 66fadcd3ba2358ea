// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "cirrus")]
#[command(about = "Manifest-driven CloudFormation stack deployment")]
#[command(version)]
pub struct Cli {
    /// AWS credential profile
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// AWS region (overridden per deployment by the manifest)
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy stacks from a manifest
    Deploy {
        /// Do not prompt for confirmation of unprotected stacks
        #[arg(short, long)]
        yes: bool,

        /// Manifest path (discovered by walking up from the working
        /// directory when omitted)
        #[arg(short = 'f', long)]
        manifest: Option<PathBuf>,

        /// Stack label to deploy
        #[arg(short, long)]
        stack: Option<String>,

        /// Tenant label to deploy for
        #[arg(short, long)]
        tenant: Option<String>,

        /// Show a template diff when updating an existing stack
        #[arg(short, long)]
        diff: bool,
    },

    /// Create or update a single stack from a template file
    Update {
        /// Explicit parameter, Key=Value (repeatable)
        #[arg(short = 'P', long = "parameter")]
        parameters: Vec<String>,

        /// Path to a parameter file (repeatable)
        #[arg(short = 'p', long = "parameter-file")]
        parameter_files: Vec<PathBuf>,

        /// Do not prompt for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Override the inferred stack name
        #[arg(short = 'n', long = "stack-name")]
        stack_name: Option<String>,

        /// Show a template diff when updating an existing stack
        #[arg(short, long)]
        diff: bool,

        /// Template file
        template: PathBuf,
    },

    /// List deployable tenant and stack combinations
    List {
        /// Manifest path
        #[arg(short = 'f', long)]
        manifest: Option<PathBuf>,
    },

    /// Print the caller's AWS identity
    Whoami,
}
