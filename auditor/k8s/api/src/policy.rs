use crate::NetworkPolicy;
use archmap_auditor_core::PolicyRules;
use k8s_openapi::api::networking::v1::NetworkPolicyPeer;
use std::collections::BTreeSet;

/// Reduces an existing NetworkPolicy to the digest the coverage check uses.
///
/// Only `app`-label pod-selector peers are considered; that is the labeling
/// scheme the synthesizer emits and the manifests follow. A direction absent
/// from the policy's effective `policyTypes` is unrestricted (`None`), never
/// an empty allow-list.
pub fn rules(policy: &NetworkPolicy) -> PolicyRules {
    let name = policy.metadata.name.clone().unwrap_or_default();
    let namespace = policy
        .metadata
        .namespace
        .clone()
        .unwrap_or_else(|| "default".to_string());
    let spec = policy.spec.clone().unwrap_or_default();

    let selects_app = spec
        .pod_selector
        .match_labels
        .as_ref()
        .and_then(|labels| labels.get("app"))
        .cloned()
        .unwrap_or_else(|| name.clone());

    // Defaulting per Kubernetes: Ingress is always in effect; Egress only
    // when egress rules are present or policyTypes says so.
    let policy_types = spec.policy_types.clone().unwrap_or_else(|| {
        let mut types = vec!["Ingress".to_string()];
        if spec.egress.is_some() {
            types.push("Egress".to_string());
        }
        types
    });

    let allow_from = policy_types.iter().any(|t| t == "Ingress").then(|| {
        peer_apps(
            spec.ingress
                .iter()
                .flatten()
                .flat_map(|rule| rule.from.iter().flatten()),
        )
    });
    let allow_to = policy_types.iter().any(|t| t == "Egress").then(|| {
        peer_apps(
            spec.egress
                .iter()
                .flatten()
                .flat_map(|rule| rule.to.iter().flatten()),
        )
    });

    PolicyRules {
        name,
        namespace,
        selects_app,
        allow_from,
        allow_to,
    }
}

fn peer_apps<'p>(peers: impl Iterator<Item = &'p NetworkPolicyPeer>) -> BTreeSet<String> {
    peers
        .filter_map(|peer| peer.pod_selector.as_ref()?.match_labels.as_ref()?.get("app").cloned())
        .collect()
}
