//! Generation rules keyed by (deployment type, strategy).
//!
//! Each supported pair maps to one forward and one rollback function. The
//! table is built once by [`RuleTable::builtin`] and never mutated after.

use std::collections::HashMap;

use phasegrid_model::{DeploymentType, GraphError, GraphResult, OrchestrationStrategy, PhaseStep};

use crate::request::PhaseRequest;

mod ami;
mod aws;
mod azure;
mod custom;
mod ecs;
mod helm;
mod kubernetes;
mod pcf;
mod spotinst;
mod ssh;

/// A rule emits the ordered step groups of one phase.
pub type Rule = fn(&PhaseRequest) -> GraphResult<Vec<PhaseStep>>;

#[derive(Debug, Clone, Copy)]
pub struct RulePair {
    pub forward: Rule,
    pub rollback: Rule,
}

impl RulePair {
    pub const fn new(forward: Rule, rollback: Rule) -> Self {
        Self { forward, rollback }
    }
}

use OrchestrationStrategy::{Basic, BlueGreen, Canary, MultiService, Rolling};

/// Strategies that deploy phase by phase without a traffic swap.
pub(crate) const NON_BLUE_GREEN: &[OrchestrationStrategy] = &[Basic, Canary, MultiService, Rolling];
pub(crate) const BLUE_GREEN: &[OrchestrationStrategy] = &[BlueGreen];

#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: HashMap<(DeploymentType, OrchestrationStrategy), RulePair>,
}

impl RuleTable {
    /// Table with every built-in rule registered.
    pub fn builtin() -> Self {
        let mut table = Self::default();
        kubernetes::register(&mut table);
        helm::register(&mut table);
        ecs::register(&mut table);
        ami::register(&mut table);
        spotinst::register(&mut table);
        pcf::register(&mut table);
        azure::register(&mut table);
        aws::register(&mut table);
        ssh::register(&mut table);
        custom::register(&mut table);
        table
    }

    pub(crate) fn register(
        &mut self,
        deployment_type: DeploymentType,
        strategies: &[OrchestrationStrategy],
        pair: RulePair,
    ) {
        for strategy in strategies {
            self.rules.insert((deployment_type, *strategy), pair);
        }
    }

    pub fn get(
        &self,
        deployment_type: DeploymentType,
        strategy: OrchestrationStrategy,
    ) -> Option<&RulePair> {
        self.rules.get(&(deployment_type, strategy))
    }

    /// Rules for the pair, or the unsupported-combination error for it.
    pub fn lookup(
        &self,
        deployment_type: DeploymentType,
        strategy: OrchestrationStrategy,
    ) -> GraphResult<&RulePair> {
        self.get(deployment_type, strategy)
            .ok_or_else(|| unsupported(deployment_type, strategy))
    }

    pub fn supports(&self, deployment_type: DeploymentType, strategy: OrchestrationStrategy) -> bool {
        self.rules.contains_key(&(deployment_type, strategy))
    }

    /// Every registered pair, sorted.
    pub fn pairs(&self) -> Vec<(DeploymentType, OrchestrationStrategy)> {
        let mut pairs: Vec<_> = self.rules.keys().copied().collect();
        pairs.sort();
        pairs
    }
}

fn unsupported(deployment_type: DeploymentType, strategy: OrchestrationStrategy) -> GraphError {
    GraphError::Unsupported(match deployment_type {
        DeploymentType::Helm => {
            format!("Workflow type {strategy} is not supported for deployment type Helm")
        }
        DeploymentType::AzureVmss => format!(
            "Unsupported Azure VMSS deployment type, orchestrationWorkflowType: {strategy}"
        ),
        DeploymentType::AzureWebapp => format!(
            "Unsupported workflow type [{strategy}] for Azure Web App deployment. Canary & Blue/Green deployment are supported"
        ),
        _ => format!("Deployment type {deployment_type} does not support {strategy} workflows"),
    })
}
