// ABOUTME: The resolved deployment descriptor.
// ABOUTME: Fully templated-out values needed to create or update one stack.

use std::collections::BTreeMap;

/// Everything needed to drive one stack to convergence. Produced by
/// manifest resolution, consumed once by the orchestrator, never mutated
/// afterwards (apart from the CLI layer raising `protected`).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Deployment {
    pub account_id: String,
    pub region: String,
    pub template_body: String,
    /// Resolved parameters; for duplicate keys the last writer won.
    pub parameters: BTreeMap<String, String>,
    pub stack_name: String,
    /// Protected deployments require interactive confirmation before the
    /// change set executes, regardless of --yes.
    pub protected: bool,
    pub tenant_label: String,
    pub stack_label: String,
    pub tags: BTreeMap<String, String>,
    pub constants: BTreeMap<String, String>,
}
