//! Human-readable report formatting.

use crate::resolver::RequiredEntities;

pub fn format_report(workflow_name: &str, entities: &RequiredEntities) -> String {
    let mut out = String::new();

    out.push_str("\n╔══════════════════════════════════════════╗\n");
    out.push_str("║  PhaseGrid Required Entities             ║\n");
    out.push_str("╠══════════════════════════════════════════╣\n");
    out.push_str(&format!("║  Workflow:  {:<29}║\n", workflow_name));
    out.push_str(&format!("║  Artifacts: {:<29}║\n", entities.artifact_service_ids.len()));
    out.push_str(&format!("║  Manifests: {:<29}║\n", entities.manifest_service_ids.len()));
    out.push_str("╚══════════════════════════════════════════╝\n\n");

    if entities.artifact_service_ids.is_empty() && entities.manifest_service_ids.is_empty() {
        out.push_str("No artifact or manifest needs to be selected.\n");
    }

    if !entities.artifact_service_ids.is_empty() {
        out.push_str("ARTIFACT REQUIRED:\n\n");
        for (i, id) in entities.artifact_service_ids.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, id));
        }
        out.push('\n');
    }

    if !entities.manifest_service_ids.is_empty() {
        out.push_str("MANIFEST REQUIRED:\n\n");
        for id in &entities.manifest_service_ids {
            out.push_str(&format!("  • {id}\n"));
        }
        out.push('\n');
    }

    for warning in &entities.warnings {
        out.push_str(&format!("⚠️  {warning}\n"));
    }

    out
}
