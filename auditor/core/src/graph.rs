use crate::{audit::Finding, Component};
use std::collections::{BTreeMap, BTreeSet};

/// Namespace-qualified component key.
///
/// `calls`/`invoked_by` annotations carry bare names; qualifying the graph key
/// by namespace keeps same-named components in different domains distinct.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ComponentId {
    pub namespace: String,
    pub name: String,
}

/// The destination of a declared call.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Target {
    /// A component declared somewhere in the same manifest tree.
    Component(ComponentId),

    /// A name with no matching component, e.g. `external-database`. Dangling
    /// targets are legal; they describe dependencies outside the cluster.
    External(String),
}

/// A directed `source calls target` relation. Multiplicity is irrelevant:
/// edges live in a set.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Edge {
    pub source: ComponentId,
    pub target: Target,
}

/// An immutable index of components and their declared call edges.
///
/// Built once per run and owned by that run; both the auditor and the
/// synthesizer read it, neither mutates it. All containers are ordered so that
/// iteration (and thus every downstream report) is independent of the order
/// manifests were read in.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    components: BTreeMap<ComponentId, Component>,
    by_name: BTreeMap<String, BTreeSet<ComponentId>>,
    edges: BTreeSet<Edge>,
    advisories: Vec<Finding>,
}

// === impl ComponentId ===

impl std::fmt::Display for ComponentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

// === impl DependencyGraph ===

impl DependencyGraph {
    /// Indexes the given components and resolves their declared calls into
    /// edges.
    ///
    /// Bare call targets resolve to every component carrying that name; a
    /// target matching no component becomes a dangling [`Target::External`]
    /// edge rather than an error. Cycles are legal and never rejected.
    pub fn build(components: impl IntoIterator<Item = Component>) -> Self {
        let mut graph = Self::default();

        for component in components {
            let id = component.id();
            graph
                .by_name
                .entry(id.name.clone())
                .or_default()
                .insert(id.clone());
            if graph.components.insert(id.clone(), component).is_some() {
                // Last declaration wins, but the collision is surfaced.
                graph.advisories.push(Finding::DuplicateComponent { id });
            }
        }

        let mut edges = BTreeSet::new();
        for (id, component) in &graph.components {
            for call in &component.calls {
                match graph.by_name.get(call) {
                    None => {
                        edges.insert(Edge {
                            source: id.clone(),
                            target: Target::External(call.clone()),
                        });
                    }
                    Some(ids) => {
                        if ids.len() > 1 {
                            graph.advisories.push(Finding::AmbiguousTarget {
                                source: id.clone(),
                                target: call.clone(),
                            });
                        }
                        for target in ids {
                            edges.insert(Edge {
                                source: id.clone(),
                                target: Target::Component(target.clone()),
                            });
                        }
                    }
                }
            }
        }
        graph.edges = edges;
        graph.advisories.sort();

        graph
    }

    pub fn components(&self) -> impl Iterator<Item = (&ComponentId, &Component)> {
        self.components.iter()
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    pub fn get(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// All components carrying the given bare name, across namespaces.
    pub fn resolve(&self, name: &str) -> impl Iterator<Item = &ComponentId> {
        self.by_name.get(name).into_iter().flatten()
    }

    /// Warnings raised while building the index (duplicate ids, ambiguous
    /// call targets). These are merged into the audit report.
    pub fn advisories(&self) -> &[Finding] {
        &self.advisories
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }
}
