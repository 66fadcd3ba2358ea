// ABOUTME: Resolution of (tenant, stack) pairs into deployment descriptors.
// ABOUTME: Applies the layered merge and the staged template substitution.

use super::deployment::Deployment;
use super::error::ManifestError;
use super::merge::merge_layers;
use super::params::read_parameter_file;
use super::template::Variables;
use super::{Manifest, Parameter, Stack, Target, Tenant};
use std::collections::BTreeMap;
use std::path::Path;

impl Manifest {
    /// Resolve a single (tenant, stack) pair. A pair without a matching
    /// target is `NotFound`, not a crash.
    pub fn find_deployment(
        &self,
        tenant_label: &str,
        stack_label: &str,
        base: &Path,
    ) -> Result<Deployment, ManifestError> {
        let not_found = || ManifestError::NotFound {
            tenant: tenant_label.to_string(),
            stack: stack_label.to_string(),
        };

        let tenant = self
            .tenants
            .iter()
            .find(|t| t.label == tenant_label)
            .ok_or_else(not_found)?;

        let stack = self
            .stacks
            .iter()
            .find(|s| s.label == stack_label)
            .ok_or_else(not_found)?;

        let target = stack
            .targets
            .iter()
            .find(|t| t.tenant == tenant.label)
            .ok_or_else(not_found)?;

        self.resolve(tenant, stack, target, base)
    }

    /// Resolve every tenant x stack combination that has a matching target,
    /// optionally filtered by tenant and/or stack label.
    pub fn deployments_matching(
        &self,
        tenant_filter: Option<&str>,
        stack_filter: Option<&str>,
        base: &Path,
    ) -> Result<Vec<Deployment>, ManifestError> {
        let mut out = Vec::new();

        for tenant in &self.tenants {
            if tenant_filter.is_some_and(|f| f != tenant.label) {
                continue;
            }

            for stack in &self.stacks {
                if stack_filter.is_some_and(|f| f != stack.label) {
                    continue;
                }

                for target in &stack.targets {
                    if target.tenant != tenant.label {
                        continue;
                    }

                    out.push(self.resolve(tenant, stack, target, base)?);
                }
            }
        }

        Ok(out)
    }

    /// Resolve all deployable combinations (used by `list`).
    pub fn all_deployments(&self, base: &Path) -> Result<Vec<Deployment>, ManifestError> {
        self.deployments_matching(None, None, base)
    }

    fn resolve(
        &self,
        tenant: &Tenant,
        stack: &Stack,
        target: &Target,
        base: &Path,
    ) -> Result<Deployment, ManifestError> {
        let config = merge_layers([
            &self.global.default,
            &tenant.default,
            &stack.default,
            &target.overrides,
        ]);

        // Stage 1: the labels are always visible.
        let mut vars = Variables::default();
        vars.set("TenantLabel", &tenant.label);
        vars.set("StackLabel", &stack.label);

        // Stage 2: constants, global first so the tenant wins on conflict.
        // Constant values may only reference stage-1 variables.
        let mut constants = BTreeMap::new();
        for (key, value) in self.global.constants.iter().chain(&tenant.constants) {
            constants.insert(key.clone(), vars.render(value)?);
        }
        for (key, value) in &constants {
            vars.set(key.clone(), value.clone());
        }

        // Stage 3: tags, merged global -> tenant -> stack, values templated
        // with the variables visible so far.
        let mut tags = BTreeMap::new();
        for (key, value) in self
            .global
            .tags
            .iter()
            .chain(&tenant.tags)
            .chain(&stack.tags)
        {
            tags.insert(key.clone(), vars.render(value)?);
        }

        // Stage 4: scalars in a fixed order, each newly resolved value
        // becoming visible to the next. A StackName may reference
        // {{.Region}}; the reverse is a forward reference and fails.
        let account_id = vars.render(config.account_id.as_deref().unwrap_or_default())?;
        vars.set("AccountId", &account_id);

        let region = vars.render(config.region.as_deref().unwrap_or_default())?;
        vars.set("Region", &region);

        let stack_name = vars.render(config.stack_name.as_deref().unwrap_or_default())?;
        vars.set("StackName", &stack_name);

        let template = vars.render(config.template.as_deref().unwrap_or_default())?;
        vars.set("Template", &template);

        let template_path = base.join(&template);
        let template_body =
            std::fs::read_to_string(&template_path).map_err(|source| ManifestError::Io {
                path: template_path.clone(),
                source,
            })?;

        // Stage 5: parameters in list order; files provide defaults and
        // later entries overwrite earlier keys.
        let mut parameters = BTreeMap::new();
        for parameter in &config.parameters {
            match parameter {
                Parameter::File { file } => {
                    let path = base.join(vars.render(file)?);
                    for (key, value) in read_parameter_file(&path)? {
                        parameters.insert(key, value);
                    }
                }
                Parameter::Literal { key, value } => {
                    parameters.insert(key.clone(), vars.render(value)?);
                }
            }
        }

        Ok(Deployment {
            account_id,
            region,
            template_body,
            parameters,
            stack_name,
            protected: config.protected.as_bool(),
            tenant_label: tenant.label.clone(),
            stack_label: stack.label.clone(),
            tags,
            constants,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn manifest_with_stack_config(config: &str) -> String {
        format!(
            r#"
Version: "1.1"
Tenants:
  - Label: test
Stacks:
  - Label: mystack
    Default:
{config}
    Targets:
      - Tenant: test
"#
        )
    }

    fn write_template(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("template.yml");
        std::fs::write(&path, "Resources: {}\n").unwrap();
        path
    }

    #[test]
    fn stack_name_may_reference_region() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());

        let manifest = Manifest::parse(&manifest_with_stack_config(
            "      Region: eu-west-1\n      StackName: \"{{.Region}}-mystack\"\n      Template: template.yml",
        ))
        .unwrap();

        let deployment = manifest
            .find_deployment("test", "mystack", dir.path())
            .unwrap();
        assert_eq!(deployment.stack_name, "eu-west-1-mystack");
    }

    #[test]
    fn region_referencing_stack_name_is_a_forward_reference() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());

        let manifest = Manifest::parse(&manifest_with_stack_config(
            "      Region: \"{{.StackName}}\"\n      StackName: mystack\n      Template: template.yml",
        ))
        .unwrap();

        let err = manifest
            .find_deployment("test", "mystack", dir.path())
            .unwrap_err();
        match err {
            ManifestError::Template(e) => assert_eq!(e.raw, "{{.StackName}}"),
            other => panic!("expected template error, got {other:?}"),
        }
    }

    #[test]
    fn literal_parameter_overrides_earlier_file_entry() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());

        let mut params = std::fs::File::create(dir.path().join("params.json")).unwrap();
        write!(params, r#"[{{"ParameterKey": "Foo", "ParameterValue": "Bar"}}]"#).unwrap();

        let manifest = Manifest::parse(&manifest_with_stack_config(
            "      StackName: mystack\n      Template: template.yml\n      Parameters:\n        - File: params.json\n        - Key: Foo\n          Value: Baz",
        ))
        .unwrap();

        let deployment = manifest
            .find_deployment("test", "mystack", dir.path())
            .unwrap();
        assert_eq!(deployment.parameters["Foo"], "Baz");
    }

    #[test]
    fn missing_target_is_not_found() {
        let dir = tempfile::tempdir().unwrap();

        let manifest = Manifest::parse(
            r#"
Version: "1.1"
Tenants:
  - Label: test
  - Label: live
Stacks:
  - Label: mystack
    Targets:
      - Tenant: test
"#,
        )
        .unwrap();

        let err = manifest
            .find_deployment("live", "mystack", dir.path())
            .unwrap_err();
        assert!(matches!(
            err,
            ManifestError::NotFound { tenant, stack } if tenant == "live" && stack == "mystack"
        ));
    }

    #[test]
    fn tenant_constant_overrides_global_and_feeds_tags() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());

        let manifest = Manifest::parse(
            r#"
Version: "1.1"
Global:
  Constants:
    Some: global
  Tags:
    Bar: "{{.Some}}"
Tenants:
  - Label: test
    Constants:
      Some: tenant
Stacks:
  - Label: mystack
    Default:
      StackName: mystack
      Template: template.yml
    Targets:
      - Tenant: test
"#,
        )
        .unwrap();

        let deployment = manifest
            .find_deployment("test", "mystack", dir.path())
            .unwrap();
        assert_eq!(deployment.constants["Some"], "tenant");
        assert_eq!(deployment.tags["Bar"], "tenant");
    }
}
