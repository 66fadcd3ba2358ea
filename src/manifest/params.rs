// ABOUTME: Parameter file parsing.
// ABOUTME: Files hold an array of ParameterKey/ParameterValue objects.

use super::error::ManifestError;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct ParameterEntry {
    parameter_key: String,
    parameter_value: String,
}

/// Read a parameter file: a YAML or JSON array of
/// `{ParameterKey, ParameterValue}` objects. Entry order is preserved so
/// later resolution steps can apply last-writer-wins.
pub fn read_parameter_file(path: &Path) -> Result<Vec<(String, String)>, ManifestError> {
    let data = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_parameters(&data).map_err(|reason| ManifestError::ParameterFile {
        path: path.to_path_buf(),
        reason,
    })
}

fn parse_parameters(data: &str) -> Result<Vec<(String, String)>, String> {
    let entries: Vec<ParameterEntry> = serde_yaml::from_str(data).map_err(|e| e.to_string())?;

    Ok(entries
        .into_iter()
        .map(|entry| (entry.parameter_key, entry.parameter_value))
        .collect())
}
