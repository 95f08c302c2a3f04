//! PhaseGrid phase generator.
//!
//! Maps a deployment type, an orchestration strategy and a handful of
//! creation flags to the ordered step groups of a workflow phase and of its
//! rollback mirror. Rules are plain functions held in a table keyed by the
//! (deployment type, strategy) pair.
//!
//! # Components
//!
//! - **`request`** — Inputs to generation, resolved from the catalog up front
//! - **`rules`** — Rule table and one rule module per deployment family
//! - **`provisioner`** — Rollback groups for infrastructure provisioners
//! - **`generator`** — Toggle checks, rule lookup and phase assembly

mod build;
pub mod generator;
pub mod provisioner;
pub mod request;
pub mod rules;

pub use generator::{PhaseGenerator, provisioner_rollback, rollback_phase};
pub use provisioner::{
    prepend_provision_rollback, rollback_provision_infrastructure, rollback_provisioners,
    rollback_provisioners_reverse,
};
pub use request::{CreationFlags, InfraTraits, PhaseRequest, ServiceCommands, StateDefaults};
pub use rules::{Rule, RulePair, RuleTable};
