// ABOUTME: Manifest document types and resolution engine.
// ABOUTME: Turns a layered YAML manifest into resolved deployment descriptors.

mod deployment;
mod error;
mod merge;
mod params;
mod resolve;
mod schema;
mod template;

pub use deployment::Deployment;
pub use error::ManifestError;
pub use merge::merge_layers;
pub use params::read_parameter_file;
pub use template::{TemplateError, Variables};

use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;

/// The only manifest schema version this tool accepts. Earlier layouts
/// (Name/Label split, schemaless parsing) are superseded.
pub const SUPPORTED_VERSION: &str = "1.1";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Manifest {
    pub version: String,

    #[serde(default)]
    pub global: Global,

    #[serde(default)]
    pub tenants: Vec<Tenant>,

    #[serde(default)]
    pub stacks: Vec<Stack>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Global {
    #[serde(default)]
    pub constants: BTreeMap<String, String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub default: StackConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Tenant {
    pub label: String,

    #[serde(default)]
    pub constants: BTreeMap<String, String>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default)]
    pub default: StackConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Stack {
    pub label: String,

    #[serde(default)]
    pub default: StackConfig,

    #[serde(default)]
    pub targets: Vec<Target>,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// Associates one stack with one tenant. A `(tenant, stack)` pair without a
/// target is not deployable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Target {
    pub tenant: String,

    #[serde(default, rename = "Override")]
    pub overrides: StackConfig,
}

/// One configuration layer. All string fields may contain template
/// placeholders; empty strings count as unset during merging.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StackConfig {
    #[serde(default)]
    pub account_id: Option<String>,

    #[serde(default)]
    pub region: Option<String>,

    /// Path of a template file relative to the manifest.
    #[serde(default)]
    pub template: Option<String>,

    #[serde(default)]
    pub parameters: Vec<Parameter>,

    #[serde(default)]
    pub stack_name: Option<String>,

    /// Protected deployments ignore the --yes flag.
    #[serde(default)]
    pub protected: TriState,
}

/// A parameter source: a file of key/value pairs, or a single literal.
/// Files provide defaults; later literal entries override earlier keys.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Parameter {
    File {
        #[serde(rename = "File")]
        file: String,
    },
    Literal {
        #[serde(rename = "Key")]
        key: String,
        #[serde(rename = "Value")]
        value: String,
    },
}

/// Explicit tri-state for the Protected field, so "layer did not set this"
/// stays distinct from "layer set it to false".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriState {
    #[default]
    Unset,
    True,
    False,
}

impl TriState {
    pub fn is_set(self) -> bool {
        self != TriState::Unset
    }

    pub fn as_bool(self) -> bool {
        self == TriState::True
    }

    /// Merge rule: an explicitly set later layer wins.
    pub fn or(self, earlier: TriState) -> TriState {
        if self.is_set() { self } else { earlier }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        if value { TriState::True } else { TriState::False }
    }
}

impl<'de> Deserialize<'de> for TriState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<bool>::deserialize(deserializer)?;
        Ok(match value {
            None => TriState::Unset,
            Some(b) => TriState::from(b),
        })
    }
}

impl Manifest {
    /// Parse and validate a manifest document. Schema violations are
    /// collected in full before semantic processing.
    pub fn parse(data: &str) -> Result<Self, ManifestError> {
        let doc: serde_yaml::Value = serde_yaml::from_str(data)?;

        let violations = schema::validate(&doc);
        if !violations.is_empty() {
            return Err(ManifestError::Validation(violations));
        }

        let manifest: Manifest = serde_yaml::from_value(doc)?;

        if manifest.version != SUPPORTED_VERSION {
            return Err(ManifestError::UnsupportedVersion(manifest.version));
        }

        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let data = std::fs::read_to_string(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tristate_deserializes_from_bool() {
        #[derive(Deserialize)]
        struct Holder {
            #[serde(default)]
            protected: TriState,
        }

        let set: Holder = serde_yaml::from_str("protected: false").unwrap();
        assert_eq!(set.protected, TriState::False);

        let unset: Holder = serde_yaml::from_str("{}").unwrap();
        assert_eq!(unset.protected, TriState::Unset);
    }

    #[test]
    fn tristate_merge_prefers_later_explicit_layer() {
        assert_eq!(TriState::Unset.or(TriState::True), TriState::True);
        assert_eq!(TriState::False.or(TriState::True), TriState::False);
        assert_eq!(TriState::Unset.or(TriState::Unset), TriState::Unset);
    }

    #[test]
    fn parameter_forms_deserialize() {
        let file: Parameter = serde_yaml::from_str("File: params/test.json").unwrap();
        assert_eq!(
            file,
            Parameter::File {
                file: "params/test.json".to_string()
            }
        );

        let literal: Parameter = serde_yaml::from_str("Key: Environment\nValue: test").unwrap();
        assert_eq!(
            literal,
            Parameter::Literal {
                key: "Environment".to_string(),
                value: "test".to_string()
            }
        );
    }

    #[test]
    fn version_mismatch_is_rejected() {
        let err = Manifest::parse("Version: \"1.0\"\n").unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedVersion(v) if v == "1.0"));
    }
}
