//! `phasegrid validate`: run the policy validator on a workflow document.

use std::path::Path;

use anyhow::Context;
use tracing::warn;

use phasegrid_generator::{PhaseGenerator, provisioner_rollback};
use phasegrid_model::{CompilerConfig, InMemoryCatalog, StepTypeRegistry};
use phasegrid_policy::PolicyValidator;

use super::load_workflow;

pub fn validate(
    config: &CompilerConfig,
    workflow_path: &Path,
    catalog_path: Option<&Path>,
) -> anyhow::Result<()> {
    let mut workflow = load_workflow(workflow_path)?;
    let catalog = match catalog_path {
        Some(path) => InMemoryCatalog::from_file(path)
            .with_context(|| format!("reading catalog {}", path.display()))?,
        None => InMemoryCatalog::new(),
    };

    let flags = config.feature_set();
    let registry = StepTypeRegistry::builtin();
    let validator = PolicyValidator::new(&catalog, &flags, &registry)
        .for_app(&config.account.app_id, &config.account.id);

    if catalog_path.is_some() {
        validator.validate(&workflow)?;
    } else {
        warn!("no catalog given, skipping service and infrastructure checks");
        validator.validate_structure(&workflow)?;
    }
    println!("✓ {} passed policy checks", workflow_path.display());

    PhaseGenerator::default().update_rollback_provisioners(&mut workflow);
    if let Some(group) = provisioner_rollback(&workflow, config.provisioner_rollback_order()) {
        println!("  provisioner rollback: {} ({} steps)", group.name, group.steps.len());
        for node in &group.steps {
            println!("     - {}", node.name);
        }
    }
    Ok(())
}
