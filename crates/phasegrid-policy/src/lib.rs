//! PhaseGrid policy validator.
//!
//! Rules a workflow must satisfy before it is stored: naming, failure
//! strategies, wait intervals, and service/infrastructure/strategy fit.
//! Each rule is a free function so the update reconciler can run the ones
//! that apply to a single edit.
//!
//! # Components
//!
//! - **`naming`** — Dot-free phase-step and step names
//! - **`timeout`** — TIMEOUT_ERROR failure-strategy rules
//! - **`interval`** — Non-negative wait intervals
//! - **`compat`** — Service, infrastructure and strategy compatibility
//! - **`validator`** — Whole-workflow validation against a catalog

pub mod compat;
pub mod interval;
pub mod naming;
pub mod timeout;
pub mod validator;

pub use compat::{
    check_helm_strategy, check_service_and_infra, check_service_compatibility, check_service_infra,
    check_strategy_infra,
};
pub use interval::check_wait_intervals;
pub use naming::{check_phase_names, check_phase_step_names, check_workflow_names};
pub use timeout::{check_orchestration_strategies, check_timeout_strategies};
pub use validator::PolicyValidator;
