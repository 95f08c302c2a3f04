//! PhaseGrid required-entity resolver.
//!
//! Statically analyses a compiled workflow to find which services need a
//! build artifact, and which need a helm chart, picked before the workflow
//! can run.
//!
//! # Components
//!
//! - **`bindings`** — Workflow-variable bindings and resolved entity ids
//! - **`scan`** — Lexical detection of artifact and manifest expressions
//! - **`resolver`** — The resolution pass and its per-pass cache
//! - **`report`** — Text report for the CLI

pub mod bindings;
pub mod error;
pub mod report;
pub mod resolver;
pub mod scan;

pub use bindings::{
    Bindings, resolve_environment_id, resolved_infra_definition_ids, resolved_service_id,
};
pub use error::{ResolveError, ResolveResult};
pub use report::format_report;
pub use resolver::{RequiredEntities, RequiredEntityResolver};
pub use scan::ExpressionScanner;
