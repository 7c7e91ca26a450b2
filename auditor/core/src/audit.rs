use crate::{ComponentId, DependencyGraph, Target};
use std::collections::{BTreeMap, BTreeSet};

/// The audit-relevant digest of a NetworkPolicy already present in the tree.
///
/// `allow_from`/`allow_to` hold the `app` labels named by the policy's
/// ingress/egress peer selectors. `None` means the policy does not restrict
/// that direction at all (its `policyTypes` omit it), which is compliant for
/// every edge.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyRules {
    pub name: String,
    pub namespace: String,

    /// The `app` label the policy's pod selector matches.
    pub selects_app: String,

    pub allow_from: Option<BTreeSet<String>>,
    pub allow_to: Option<BTreeSet<String>>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A single audit result.
///
/// Severity decides the process exit status only; findings are never filtered
/// or truncated on their way to the caller.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Finding {
    /// The same namespace-qualified id was declared more than once.
    DuplicateComponent { id: ComponentId },

    /// A bare call target matched components in more than one namespace.
    AmbiguousTarget { source: ComponentId, target: String },

    /// `callee` does not acknowledge `caller` in its `invoked_by` list.
    MissingInvokedBy {
        caller: ComponentId,
        callee: ComponentId,
    },

    /// `invoker` does not declare the call that `component`'s `invoked_by`
    /// list attributes to it.
    MissingCalls {
        invoker: ComponentId,
        component: ComponentId,
    },

    /// A call names something absent from the manifest tree.
    ExternalCall { source: ComponentId, target: String },

    /// An `invoked_by` entry names something absent from the manifest tree.
    ExternalInvoker {
        component: ComponentId,
        invoker: String,
    },

    /// An annotation value could not be parsed and was ignored.
    MalformedAnnotation {
        component: ComponentId,
        key: String,
        value: String,
        detail: String,
    },

    /// A component participates in declared traffic but no NetworkPolicy
    /// selects it. Kubernetes is default-allow, so this is advisory.
    NoNetworkPolicy { id: ComponentId },

    /// The target's NetworkPolicy restricts ingress and does not allow the
    /// declared caller.
    IngressNotPermitted {
        source: ComponentId,
        target: ComponentId,
        policy: String,
    },

    /// The source's NetworkPolicy restricts egress and does not allow the
    /// declared callee.
    EgressNotPermitted {
        source: ComponentId,
        target: ComponentId,
        policy: String,
    },
}

// === impl Severity ===

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => "info".fmt(f),
            Self::Warning => "warning".fmt(f),
            Self::Error => "error".fmt(f),
        }
    }
}

// === impl Finding ===

impl Finding {
    pub fn severity(&self) -> Severity {
        match self {
            Self::ExternalCall { .. } | Self::ExternalInvoker { .. } => Severity::Info,
            Self::NoNetworkPolicy { .. } => Severity::Info,
            Self::DuplicateComponent { .. }
            | Self::AmbiguousTarget { .. }
            | Self::MissingInvokedBy { .. }
            | Self::MissingCalls { .. }
            | Self::MalformedAnnotation { .. } => Severity::Warning,
            Self::IngressNotPermitted { .. } | Self::EgressNotPermitted { .. } => Severity::Error,
        }
    }
}

impl std::fmt::Display for Finding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateComponent { id } => {
                write!(f, "{} is declared more than once; the last declaration wins", id)
            }
            Self::AmbiguousTarget { source, target } => write!(
                f,
                "{} calls {}, which matches components in more than one namespace",
                source, target
            ),
            Self::MissingInvokedBy { caller, callee } => write!(
                f,
                "{} declares no invoked_by entry for {}",
                callee.name, caller.name
            ),
            Self::MissingCalls { invoker, component } => write!(
                f,
                "{} declares no calls entry for {}",
                invoker.name, component.name
            ),
            Self::ExternalCall { source, target } => write!(
                f,
                "{} calls {}, which is not declared in the manifest tree (external dependency)",
                source, target
            ),
            Self::ExternalInvoker { component, invoker } => write!(
                f,
                "{} declares invoked_by {}, which is not declared in the manifest tree (external dependency)",
                component, invoker
            ),
            Self::MalformedAnnotation {
                component,
                key,
                value,
                detail,
            } => write!(f, "{}: ignoring {}={:?}: {}", component, key, value, detail),
            Self::NoNetworkPolicy { id } => {
                write!(f, "{} has no NetworkPolicy; traffic is unrestricted", id.name)
            }
            Self::IngressNotPermitted { source, target, policy } => write!(
                f,
                "edge {}->{} is not permitted by {}'s NetworkPolicy {}",
                source.name, target.name, target.name, policy
            ),
            Self::EgressNotPermitted { source, target, policy } => write!(
                f,
                "edge {}->{} is not permitted by {}'s NetworkPolicy {}",
                source.name, target.name, source.name, policy
            ),
        }
    }
}

/// Runs the symmetry and policy-coverage passes over the whole graph.
///
/// The entire graph is always walked; findings accumulate rather than
/// short-circuiting, so one run enumerates every inconsistency for review.
/// Output order is stable for a fixed set of inputs.
pub fn audit(graph: &DependencyGraph, policies: &[PolicyRules]) -> Vec<Finding> {
    let mut findings = graph.advisories().to_vec();

    symmetry(graph, &mut findings);
    coverage(graph, policies, &mut findings);

    findings.sort();
    findings.dedup();
    findings
}

/// The highest severity present, if any findings exist.
pub fn worst_severity(findings: &[Finding]) -> Option<Severity> {
    findings.iter().map(Finding::severity).max()
}

/// Checks that every declared edge is acknowledged from both ends.
///
/// Dangling names are excluded: a missing acknowledgement from a component
/// that does not exist is an external dependency, not an inconsistency.
fn symmetry(graph: &DependencyGraph, findings: &mut Vec<Finding>) {
    for edge in graph.edges() {
        match &edge.target {
            Target::External(name) => findings.push(Finding::ExternalCall {
                source: edge.source.clone(),
                target: name.clone(),
            }),
            Target::Component(target) => {
                let callee = graph.get(target).expect("edge targets are indexed");
                if !callee.invoked_by.contains(&edge.source.name) {
                    findings.push(Finding::MissingInvokedBy {
                        caller: edge.source.clone(),
                        callee: target.clone(),
                    });
                }
            }
        }
    }

    for (id, component) in graph.components() {
        for invoker in &component.invoked_by {
            let mut known = false;
            for invoker_id in graph.resolve(invoker) {
                known = true;
                let declared = graph
                    .get(invoker_id)
                    .expect("resolved ids are indexed")
                    .calls
                    .contains(&id.name);
                if !declared {
                    findings.push(Finding::MissingCalls {
                        invoker: invoker_id.clone(),
                        component: id.clone(),
                    });
                }
            }
            if !known {
                findings.push(Finding::ExternalInvoker {
                    component: id.clone(),
                    invoker: invoker.clone(),
                });
            }
        }
    }
}

/// Checks that every known edge is permitted by the NetworkPolicies present.
///
/// A component with no policy at all is unrestricted by Kubernetes
/// default-allow semantics: compliant, but flagged once as an advisory. A
/// policy that restricts a direction and omits a declared peer is an error.
fn coverage(graph: &DependencyGraph, policies: &[PolicyRules], findings: &mut Vec<Finding>) {
    let by_app: BTreeMap<(&str, &str), &PolicyRules> = policies
        .iter()
        .map(|p| ((p.namespace.as_str(), p.selects_app.as_str()), p))
        .collect();
    let policy_for =
        |id: &ComponentId| by_app.get(&(id.namespace.as_str(), id.name.as_str())).copied();

    let mut unrestricted = BTreeSet::new();
    for edge in graph.edges() {
        let target = match &edge.target {
            Target::Component(target) => target,
            Target::External(_) => continue,
        };

        match policy_for(target) {
            None => {
                unrestricted.insert(target.clone());
            }
            Some(policy) => {
                if let Some(allow) = &policy.allow_from {
                    if !allow.contains(&edge.source.name) {
                        findings.push(Finding::IngressNotPermitted {
                            source: edge.source.clone(),
                            target: target.clone(),
                            policy: policy.name.clone(),
                        });
                    }
                }
            }
        }

        match policy_for(&edge.source) {
            None => {
                unrestricted.insert(edge.source.clone());
            }
            Some(policy) => {
                if let Some(allow) = &policy.allow_to {
                    if !allow.contains(&target.name) {
                        findings.push(Finding::EgressNotPermitted {
                            source: edge.source.clone(),
                            target: target.clone(),
                            policy: policy.name.clone(),
                        });
                    }
                }
            }
        }
    }

    findings.extend(unrestricted.into_iter().map(|id| Finding::NoNetworkPolicy { id }));
}
