// ABOUTME: Pure layered merge of stack configuration.
// ABOUTME: Most specific non-empty value wins; parameter lists concatenate.

use super::StackConfig;

/// Fold an ordered sequence of layers (least to most specific) into one
/// configuration. For scalars the last non-empty layer wins, parameters
/// concatenate in layer order, and the tri-state takes the last layer that
/// set it explicitly. The fold is associative: merging a prefix first and
/// then the rest gives the same result as one pass.
pub fn merge_layers<'a, I>(layers: I) -> StackConfig
where
    I: IntoIterator<Item = &'a StackConfig>,
{
    layers
        .into_iter()
        .fold(StackConfig::default(), |base, layer| merge(base, layer))
}

fn merge(base: StackConfig, layer: &StackConfig) -> StackConfig {
    let mut parameters = base.parameters;
    parameters.extend(layer.parameters.iter().cloned());

    StackConfig {
        account_id: pick(base.account_id, &layer.account_id),
        region: pick(base.region, &layer.region),
        template: pick(base.template, &layer.template),
        parameters,
        stack_name: pick(base.stack_name, &layer.stack_name),
        protected: layer.protected.or(base.protected),
    }
}

/// A layer value counts as set only when present and non-empty.
fn pick(base: Option<String>, layer: &Option<String>) -> Option<String> {
    match layer {
        Some(value) if !value.is_empty() => Some(value.clone()),
        _ => base,
    }
}
