//! `phasegrid resolve`: report the services whose artifact or manifest must
//! be picked before a workflow can run.

use std::path::Path;

use anyhow::{Context, bail};

use phasegrid_model::{CompilerConfig, InMemoryCatalog, StepTypeRegistry};
use phasegrid_resolver::{Bindings, RequiredEntityResolver, format_report};

use super::load_workflow;

pub fn resolve(
    config: &CompilerConfig,
    workflow_path: &Path,
    catalog_path: &Path,
    vars: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let workflow = load_workflow(workflow_path)?;
    let catalog = InMemoryCatalog::from_file(catalog_path)
        .with_context(|| format!("reading catalog {}", catalog_path.display()))?;
    let bindings = parse_bindings(vars)?;

    let flags = config.feature_set();
    let registry = StepTypeRegistry::builtin();
    let resolver = RequiredEntityResolver::new(&catalog, &flags, &registry)?
        .for_app(&config.account.app_id, &config.account.id);
    let entities = resolver.resolve(&workflow, &bindings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&entities)?);
    } else {
        let name = workflow_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("workflow");
        print!("{}", format_report(name, &entities));
    }
    Ok(())
}

fn parse_bindings(vars: &[String]) -> anyhow::Result<Bindings> {
    let mut pairs = Vec::with_capacity(vars.len());
    for var in vars {
        let Some(pair) = Bindings::parse_pair(var) else {
            bail!("invalid variable binding '{var}', expected NAME=VALUE");
        };
        pairs.push(pair);
    }
    Ok(pairs.into_iter().collect())
}
