//! Core model for the architecture auditor.
//!
//! A run builds a disposable, immutable snapshot of the manifest tree:
//!
//! ```text
//! [ Component ] -> [ DependencyGraph ] -> { audit, synthesis }
//! ```
//!
//! - A `Component` is a workload extracted from one manifest document, carrying
//!   the dependency lists its `architecture.*` annotations declare. The lists
//!   are as-declared and unverified; checking them is the auditor's job, not a
//!   model invariant.
//! - The `DependencyGraph` keys components by namespace-qualified id and holds
//!   the declared call edges as a set, so audit output does not depend on file
//!   read order.
//! - `audit` runs the symmetry and NetworkPolicy-coverage passes over the
//!   whole graph and returns every `Finding`, never stopping at the first.
//!
//! Nothing here touches the filesystem or the cluster; loading lives in the
//! k8s crates so this model stays a pure function of its inputs.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod audit;
pub mod component;
pub mod graph;

#[cfg(test)]
mod tests;

pub use self::{
    audit::{audit, worst_severity, Finding, PolicyRules, Severity},
    component::{Component, Domain, WorkloadKind, DEFAULT_PORT},
    graph::{ComponentId, DependencyGraph, Edge, Target},
};
