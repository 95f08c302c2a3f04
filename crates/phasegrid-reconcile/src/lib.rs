//! PhaseGrid update reconciler.
//!
//! Applies edits to a stored workflow while keeping it consistent: node
//! identities survive edits, rollback mirrors follow their forward phase,
//! host selections are dropped when the target changes, and template
//! bindings propagate across phases.
//!
//! # Components
//!
//! - **`nodes`** — Id preservation, node-selection reset, artifact check
//! - **`propagate`** — Environment/infrastructure template propagation
//! - **`update`** — Phase create, update, clone and delete; pre/post edits

pub mod nodes;
pub mod propagate;
pub mod update;

pub use nodes::{
    MatchMode, artifact_check_required, ensure_artifact_check, preserve_phase_ids,
    preserve_step_ids, refresh_ids, reset_node_selection,
};
pub use propagate::TemplateChange;
pub use update::WorkflowReconciler;
