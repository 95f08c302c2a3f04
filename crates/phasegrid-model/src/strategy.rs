//! Failure and skip strategies attached to workflows and phase steps.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::kinds::{ExecutionScope, FailureType, RepairAction};

/// How the engine reacts when a step fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailureStrategy {
    #[serde(default)]
    pub execution_scope: ExecutionScope,
    #[serde(default)]
    pub failure_types: BTreeSet<FailureType>,
    pub repair_action_code: RepairAction,
    /// Step names the strategy is restricted to. Empty means every step.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub specific_steps: Vec<String>,
    #[serde(default)]
    pub retry_count: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub retry_intervals: Vec<u32>,
}

impl FailureStrategy {
    pub fn new(repair_action_code: RepairAction, failure_types: &[FailureType]) -> Self {
        Self {
            execution_scope: ExecutionScope::Workflow,
            failure_types: failure_types.iter().copied().collect(),
            repair_action_code,
            specific_steps: Vec::new(),
            retry_count: 0,
            retry_intervals: Vec::new(),
        }
    }

    pub fn with_specific_steps(mut self, steps: &[&str]) -> Self {
        self.specific_steps = steps.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn contains_timeout(&self) -> bool {
        self.failure_types.contains(&FailureType::TimeoutError)
    }

    /// True when the strategy reacts to timeouts and nothing else.
    pub fn is_timeout_only(&self) -> bool {
        self.failure_types.len() == 1 && self.contains_timeout()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SkipScope {
    AllSteps,
    SpecificSteps,
}

/// Conditionally skips steps of a phase step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSkipStrategy {
    pub scope: SkipScope,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_ids: Vec<String>,
    pub assertion_expression: String,
}

/// Drops step names that no longer exist. A strategy restricted to specific
/// steps that loses all of them is removed.
pub fn cleanup_failure_strategies(strategies: &mut Vec<FailureStrategy>, step_names: &[&str]) {
    strategies.retain_mut(|strategy| {
        if strategy.specific_steps.is_empty() {
            return true;
        }
        strategy
            .specific_steps
            .retain(|name| step_names.contains(&name.as_str()));
        !strategy.specific_steps.is_empty()
    });
}

/// Same as [`cleanup_failure_strategies`] for skip strategies, keyed by id.
pub fn cleanup_skip_strategies(strategies: &mut Vec<StepSkipStrategy>, step_ids: &[&str]) {
    strategies.retain_mut(|strategy| {
        if strategy.scope == SkipScope::AllSteps {
            strategy.step_ids.clear();
            return true;
        }
        strategy
            .step_ids
            .retain(|id| step_ids.contains(&id.as_str()));
        !strategy.step_ids.is_empty()
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_only_detection() {
        let s = FailureStrategy::new(RepairAction::Ignore, &[FailureType::TimeoutError]);
        assert!(s.is_timeout_only());
        let s = FailureStrategy::new(
            RepairAction::Ignore,
            &[FailureType::TimeoutError, FailureType::ApplicationError],
        );
        assert!(s.contains_timeout());
        assert!(!s.is_timeout_only());
    }

    #[test]
    fn cleanup_drops_vanished_steps() {
        let mut strategies = vec![
            FailureStrategy::new(RepairAction::Retry, &[FailureType::Connectivity])
                .with_specific_steps(&["gone"]),
            FailureStrategy::new(RepairAction::Retry, &[FailureType::Connectivity])
                .with_specific_steps(&["gone", "kept"]),
            FailureStrategy::new(RepairAction::Ignore, &[FailureType::ApplicationError]),
        ];
        cleanup_failure_strategies(&mut strategies, &["kept"]);
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].specific_steps, vec!["kept".to_string()]);
        assert!(strategies[1].specific_steps.is_empty());
    }

    #[test]
    fn cleanup_skip_strategies_by_id() {
        let mut strategies = vec![
            StepSkipStrategy {
                scope: SkipScope::SpecificSteps,
                step_ids: vec!["a".into(), "b".into()],
                assertion_expression: "true".into(),
            },
            StepSkipStrategy {
                scope: SkipScope::SpecificSteps,
                step_ids: vec!["c".into()],
                assertion_expression: "true".into(),
            },
            StepSkipStrategy {
                scope: SkipScope::AllSteps,
                step_ids: vec!["x".into()],
                assertion_expression: "false".into(),
            },
        ];
        cleanup_skip_strategies(&mut strategies, &["a"]);
        assert_eq!(strategies.len(), 2);
        assert_eq!(strategies[0].step_ids, vec!["a".to_string()]);
        assert!(strategies[1].step_ids.is_empty());
    }
}
