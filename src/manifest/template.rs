// ABOUTME: Staged template evaluator for manifest string fields.
// ABOUTME: Variables become visible stage by stage, so forward references fail.

use std::collections::BTreeMap;
use thiserror::Error;

/// A template failed to resolve. Carries the offending raw string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot resolve template {raw:?}: {reason}")]
pub struct TemplateError {
    pub raw: String,
    pub reason: String,
}

impl TemplateError {
    fn new(raw: &str, reason: impl Into<String>) -> Self {
        Self {
            raw: raw.to_string(),
            reason: reason.into(),
        }
    }
}

/// The variable set visible to a template. Resolution inserts variables in
/// stage order, so a placeholder can only see values resolved before it.
#[derive(Debug, Clone, Default)]
pub struct Variables {
    vars: BTreeMap<String, String>,
}

impl Variables {
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Substitute every `{{.Name}}` placeholder in `raw`. An undefined
    /// variable or malformed placeholder is a fatal `TemplateError`.
    pub fn render(&self, raw: &str) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(raw.len());
        let mut rest = raw;

        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];

            let Some(end) = after.find("}}") else {
                return Err(TemplateError::new(raw, "unterminated placeholder"));
            };

            let inner = after[..end].trim();
            let Some(name) = inner.strip_prefix('.') else {
                return Err(TemplateError::new(
                    raw,
                    format!("placeholder {inner:?} must start with '.'"),
                ));
            };

            if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                return Err(TemplateError::new(
                    raw,
                    format!("invalid variable name {name:?}"),
                ));
            }

            let Some(value) = self.get(name) else {
                return Err(TemplateError::new(
                    raw,
                    format!("undefined variable {name:?}"),
                ));
            };

            out.push_str(value);
            rest = &after[end + 2..];
        }

        out.push_str(rest);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Variables {
        let mut v = Variables::default();
        for (name, value) in pairs {
            v.set(*name, *value);
        }
        v
    }

    #[test]
    fn renders_plain_string_unchanged() {
        let v = Variables::default();
        assert_eq!(v.render("no placeholders").unwrap(), "no placeholders");
    }

    #[test]
    fn substitutes_defined_variables() {
        let v = vars(&[("TenantLabel", "test"), ("Region", "eu-west-1")]);
        assert_eq!(
            v.render("{{.TenantLabel}}-mystack-{{.Region}}").unwrap(),
            "test-mystack-eu-west-1"
        );
    }

    #[test]
    fn tolerates_spaces_inside_placeholder() {
        let v = vars(&[("Env", "live")]);
        assert_eq!(v.render("{{ .Env }}").unwrap(), "live");
    }

    #[test]
    fn undefined_variable_is_fatal_and_carries_raw_string() {
        let v = vars(&[("Region", "eu-west-1")]);
        let err = v.render("{{.StackName}}").unwrap_err();
        assert_eq!(err.raw, "{{.StackName}}");
        assert!(err.reason.contains("StackName"));
    }

    #[test]
    fn unterminated_placeholder_is_fatal() {
        let v = Variables::default();
        let err = v.render("{{.Region").unwrap_err();
        assert_eq!(err.raw, "{{.Region");
    }

    #[test]
    fn placeholder_without_dot_is_fatal() {
        let v = vars(&[("Region", "eu-west-1")]);
        assert!(v.render("{{Region}}").is_err());
    }
}
