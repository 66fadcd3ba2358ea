// ABOUTME: Structural validation of the manifest document.
// ABOUTME: Collects every violation before any semantic processing happens.

use serde_yaml::{Mapping, Value};

/// Validate the raw document against the manifest schema. Returns all
/// violations, each with the path of the offending node.
pub fn validate(doc: &Value) -> Vec<String> {
    let mut violations = Vec::new();

    let Some(root) = doc.as_mapping() else {
        violations.push("manifest root must be a mapping".to_string());
        return violations;
    };

    check_keys(root, "", &["Version", "Global", "Tenants", "Stacks"], &mut violations);

    match get(root, "Version") {
        None => violations.push("Version is required".to_string()),
        Some(v) if !v.is_string() => violations.push("Version must be a string".to_string()),
        _ => {}
    }

    if let Some(global) = get(root, "Global") {
        check_global(global, &mut violations);
    }

    if let Some(tenants) = get(root, "Tenants") {
        check_each(tenants, "Tenants", &mut violations, check_tenant);
    }

    if let Some(stacks) = get(root, "Stacks") {
        check_each(stacks, "Stacks", &mut violations, check_stack);
    }

    violations
}

fn check_global(value: &Value, violations: &mut Vec<String>) {
    let Some(map) = require_mapping(value, "Global", violations) else {
        return;
    };

    check_keys(map, "Global", &["Constants", "Tags", "Default"], violations);

    if let Some(constants) = get(map, "Constants") {
        check_string_map(constants, "Global.Constants", violations);
    }
    if let Some(tags) = get(map, "Tags") {
        check_string_map(tags, "Global.Tags", violations);
    }
    if let Some(default) = get(map, "Default") {
        check_stack_config(default, "Global.Default", violations);
    }
}

fn check_tenant(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = require_mapping(value, path, violations) else {
        return;
    };

    check_keys(map, path, &["Label", "Constants", "Tags", "Default"], violations);
    require_string(map, path, "Label", violations);

    if let Some(constants) = get(map, "Constants") {
        check_string_map(constants, &format!("{path}.Constants"), violations);
    }
    if let Some(tags) = get(map, "Tags") {
        check_string_map(tags, &format!("{path}.Tags"), violations);
    }
    if let Some(default) = get(map, "Default") {
        check_stack_config(default, &format!("{path}.Default"), violations);
    }
}

fn check_stack(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = require_mapping(value, path, violations) else {
        return;
    };

    check_keys(map, path, &["Label", "Default", "Targets", "Tags"], violations);
    require_string(map, path, "Label", violations);

    if let Some(default) = get(map, "Default") {
        check_stack_config(default, &format!("{path}.Default"), violations);
    }
    if let Some(tags) = get(map, "Tags") {
        check_string_map(tags, &format!("{path}.Tags"), violations);
    }
    if let Some(targets) = get(map, "Targets") {
        check_each(targets, &format!("{path}.Targets"), violations, check_target);
    }
}

fn check_target(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = require_mapping(value, path, violations) else {
        return;
    };

    check_keys(map, path, &["Tenant", "Override"], violations);
    require_string(map, path, "Tenant", violations);

    if let Some(overrides) = get(map, "Override") {
        check_stack_config(overrides, &format!("{path}.Override"), violations);
    }
}

fn check_stack_config(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = require_mapping(value, path, violations) else {
        return;
    };

    check_keys(
        map,
        path,
        &["AccountId", "Region", "Template", "Parameters", "StackName", "Protected"],
        violations,
    );

    for field in ["AccountId", "Region", "Template", "StackName"] {
        if let Some(v) = get(map, field) {
            if !v.is_string() {
                violations.push(format!("{path}.{field} must be a string"));
            }
        }
    }

    if let Some(protected) = get(map, "Protected") {
        if !protected.is_bool() {
            violations.push(format!("{path}.Protected must be a boolean"));
        }
    }

    if let Some(parameters) = get(map, "Parameters") {
        check_each(
            parameters,
            &format!("{path}.Parameters"),
            violations,
            check_parameter,
        );
    }
}

fn check_parameter(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = require_mapping(value, path, violations) else {
        return;
    };

    let has_file = get(map, "File").is_some();
    let has_key = get(map, "Key").is_some();
    let has_value = get(map, "Value").is_some();

    if has_file {
        check_keys(map, path, &["File"], violations);
        if !get(map, "File").is_some_and(Value::is_string) {
            violations.push(format!("{path}.File must be a string"));
        }
    } else if has_key || has_value {
        check_keys(map, path, &["Key", "Value"], violations);
        if !has_key || !has_value {
            violations.push(format!("{path} must set both Key and Value"));
        }
        for field in ["Key", "Value"] {
            if let Some(v) = get(map, field) {
                if !v.is_string() {
                    violations.push(format!("{path}.{field} must be a string"));
                }
            }
        }
    } else {
        violations.push(format!("{path} must be either {{File}} or {{Key, Value}}"));
    }
}

fn check_each(
    value: &Value,
    path: &str,
    violations: &mut Vec<String>,
    check: fn(&Value, &str, &mut Vec<String>),
) {
    let Some(items) = value.as_sequence() else {
        violations.push(format!("{path} must be an array"));
        return;
    };

    for (i, item) in items.iter().enumerate() {
        check(item, &format!("{path}[{i}]"), violations);
    }
}

fn check_string_map(value: &Value, path: &str, violations: &mut Vec<String>) {
    let Some(map) = value.as_mapping() else {
        violations.push(format!("{path} must be a mapping of strings"));
        return;
    };

    for (key, entry) in map {
        if !entry.is_string() {
            violations.push(format!("{path}.{} must be a string", key_name(key)));
        }
    }
}

fn check_keys(map: &Mapping, path: &str, allowed: &[&str], violations: &mut Vec<String>) {
    for (key, _) in map {
        let name = key_name(key);
        if !allowed.contains(&name.as_str()) {
            if path.is_empty() {
                violations.push(format!("unknown property {name}"));
            } else {
                violations.push(format!("{path}: unknown property {name}"));
            }
        }
    }
}

fn require_string(map: &Mapping, path: &str, field: &str, violations: &mut Vec<String>) {
    match get(map, field) {
        None => violations.push(format!("{path}.{field} is required")),
        Some(v) if !v.is_string() => violations.push(format!("{path}.{field} must be a string")),
        _ => {}
    }
}

fn require_mapping<'a>(value: &'a Value, path: &str, violations: &mut Vec<String>) -> Option<&'a Mapping> {
    let map = value.as_mapping();
    if map.is_none() {
        violations.push(format!("{path} must be a mapping"));
    }
    map
}

fn get<'a>(map: &'a Mapping, key: &str) -> Option<&'a Value> {
    map.iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn key_name(key: &Value) -> String {
    key.as_str()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{key:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validate_str(data: &str) -> Vec<String> {
        let doc: Value = serde_yaml::from_str(data).unwrap();
        validate(&doc)
    }

    #[test]
    fn accepts_minimal_manifest() {
        assert!(validate_str("Version: \"1.1\"\n").is_empty());
    }

    #[test]
    fn accepts_full_manifest() {
        let violations = validate_str(
            r#"
Version: "1.1"
Global:
  Constants:
    Env: test
  Tags:
    Team: platform
Tenants:
  - Label: test
    Default:
      AccountId: "222222222222"
      Region: eu-west-1
Stacks:
  - Label: mystack
    Default:
      Template: templates/mystack.yml
      StackName: "{{.TenantLabel}}-mystack"
      Parameters:
        - File: parameters/test.json
        - Key: Environment
          Value: test
    Targets:
      - Tenant: test
        Override:
          Protected: true
"#,
        );
        assert!(violations.is_empty(), "unexpected violations: {violations:?}");
    }

    #[test]
    fn collects_every_violation_not_just_the_first() {
        let violations = validate_str(
            r#"
Bogus: 1
Tenants:
  - Default: {}
Stacks:
  - Label: mystack
    Default:
      Protected: "yes"
"#,
        );

        assert!(violations.iter().any(|v| v.contains("unknown property Bogus")));
        assert!(violations.iter().any(|v| v.contains("Version is required")));
        assert!(violations.iter().any(|v| v.contains("Tenants[0].Label is required")));
        assert!(violations.iter().any(|v| v.contains("Protected must be a boolean")));
        assert!(violations.len() >= 4);
    }

    #[test]
    fn rejects_parameter_with_mixed_forms() {
        let violations = validate_str(
            r#"
Version: "1.1"
Stacks:
  - Label: s
    Default:
      Parameters:
        - File: a.json
          Key: b
"#,
        );
        assert!(!violations.is_empty());
    }

    #[test]
    fn rejects_parameter_with_neither_form() {
        let violations = validate_str(
            r#"
Version: "1.1"
Stacks:
  - Label: s
    Default:
      Parameters:
        - {}
"#,
        );
        assert!(violations.iter().any(|v| v.contains("either")));
    }
}
