//! PhaseGrid graph model: the workflow document the compiler reads and
//! rewrites, plus everything shared by the compiler crates.
//!
//! # Components
//!
//! - **`graph`** — Node, PhaseStep, WorkflowPhase, the `Phase` pair and the workflow arena
//! - **`kinds`** — Deployment types, strategies, step-group kinds and small status enums
//! - **`step_type`** — Closed enumeration of node kinds
//! - **`registry`** — Immutable per-kind facts (timeout support, artifact use, provisioner rollback)
//! - **`template`** — Template expressions and user variables
//! - **`strategy`** — Failure and skip strategies
//! - **`catalog`** — Service/infrastructure lookups and feature toggles
//! - **`config`** — phasegrid.toml parsing
//! - **`names`** — Generated phase-step and node names

pub mod catalog;
pub mod config;
pub mod error;
pub mod graph;
pub mod kinds;
pub mod names;
pub mod registry;
pub mod step_type;
pub mod strategy;
pub mod template;

pub use catalog::{
    Catalog, CommandTemplate, FeatureFlag, FeatureFlags, FeatureSet, InMemoryCatalog,
    InfrastructureDefinition, InfrastructureKind, ManifestRecord, Service, ServiceCommand,
};
pub use config::{CompilerConfig, ProvisionerRollbackOrder};
pub use error::{CatalogError, GraphError, GraphResult, ReferenceKind};
pub use graph::{Node, OrchestrationWorkflow, Phase, PhaseStep, Properties, WorkflowPhase, new_id};
pub use kinds::*;
pub use registry::{StepDescriptor, StepTypeRegistry};
pub use step_type::StepType;
pub use strategy::{FailureStrategy, SkipScope, StepSkipStrategy};
pub use template::{NameValuePair, TemplateExpression, TemplateMetadata, Variable, fields};
