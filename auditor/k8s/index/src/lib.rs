//! Snapshot construction and NetworkPolicy synthesis.
//!
//! A `Snapshot` is the raw harvest of one run: components and policy digests
//! read either from a manifest tree on disk or from a live cluster in a
//! single batched pass. The snapshot is turned into a
//! [`DependencyGraph`](archmap_auditor_core::DependencyGraph) that the audit
//! and synthesis passes consume independently; nothing is cached between
//! runs.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod cluster;
pub mod fs;
pub mod synthesize;


pub use self::{
    cluster::load_cluster,
    fs::{load_tree, LoadError},
    synthesize::{synthesize, to_yaml, SynthesisParams},
};

use archmap_auditor_core::{DependencyGraph, Finding, PolicyRules, WorkloadKind};
use archmap_auditor_k8s_api::{extract, rules, DecodeError, Extraction, NetworkPolicy, ObjectMeta};

/// Everything harvested from one manifest source.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub components: Vec<archmap_auditor_core::Component>,
    pub policies: Vec<PolicyRules>,

    /// Warnings raised at the extraction boundary (malformed annotation
    /// values). Merged into the audit report.
    pub advisories: Vec<Finding>,
}

// === impl Snapshot ===

impl Snapshot {
    pub fn ingest_workload(
        &mut self,
        kind: WorkloadKind,
        metadata: &ObjectMeta,
    ) -> Result<(), DecodeError> {
        let Extraction {
            component,
            advisories,
        } = extract(kind, metadata)?;
        tracing::debug!(component = %component.id(), %kind, "indexed workload");
        self.components.push(component);
        self.advisories.extend(advisories);
        Ok(())
    }

    pub fn ingest_policy(&mut self, policy: &NetworkPolicy) {
        self.policies.push(rules(policy));
    }

    /// Consumes the snapshot, building the per-run graph.
    pub fn into_graph(self) -> (DependencyGraph, Vec<PolicyRules>, Vec<Finding>) {
        let graph = DependencyGraph::build(self.components);
        (graph, self.policies, self.advisories)
    }
}
