// ABOUTME: The list subcommand: print every deployable tenant and stack
// ABOUTME: combination from the manifest as a table.

use super::find_manifest;
use cirrus::error::Result;
use cirrus::manifest::Manifest;
use cirrus::output::field;
use std::io;
use std::path::{Path, PathBuf};

pub fn run(manifest: Option<PathBuf>) -> Result<()> {
    let manifest_path = match manifest {
        Some(path) => path,
        None => find_manifest()?,
    };

    let mut stdout = io::stdout();
    field(&mut stdout, "Manifest", &manifest_path.display().to_string())?;

    let manifest = Manifest::load(&manifest_path)?;
    let base = manifest_path.parent().unwrap_or(Path::new("."));

    let mut deployments = manifest.all_deployments(base)?;
    deployments.sort_by(|a, b| a.stack_name.cmp(&b.stack_name));

    let width = deployments
        .iter()
        .map(|d| d.stack_name.len())
        .chain(["Stack".len()])
        .max()
        .unwrap_or(0);

    println!();
    println!("{:<width$} Tenant", "Stack");
    println!("{:<width$} ---", "---");
    for deployment in &deployments {
        println!("{:<width$} {}", deployment.stack_name, deployment.tenant_label);
    }

    Ok(())
}
