pub mod generate;
pub mod resolve;
pub mod validate;

use std::path::Path;

use anyhow::Context;

use phasegrid_model::OrchestrationWorkflow;

/// Reads a workflow document.
pub fn load_workflow(path: &Path) -> anyhow::Result<OrchestrationWorkflow> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading workflow {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing workflow {}", path.display()))
}
