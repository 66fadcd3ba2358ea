// ABOUTME: Unified diff between the deployed template and the local one.
// ABOUTME: Zero context lines, carriage returns stripped before comparing.

use similar::TextDiff;

/// Render a unified diff, or `None` when the templates are identical.
/// Windows line endings in the local file are normalized first so they
/// never show up as spurious changes.
pub fn template_diff(stack_name: &str, deployed: &str, local: &str) -> Option<String> {
    let local = local.replace('\r', "");
    let deployed = deployed.replace('\r', "");

    if deployed == local {
        return None;
    }

    let diff = TextDiff::from_lines(&deployed, &local);
    let text = diff
        .unified_diff()
        .context_radius(0)
        .header(&format!("stack {stack_name}"), "local template")
        .to_string();

    Some(text)
}
