use archmap_auditor_core::{ComponentId, DependencyGraph, Target};
use archmap_auditor_k8s_api::{annotations, NetworkPolicy, ObjectMeta};
use ipnet::IpNet;
use k8s_openapi::{
    api::networking::v1::{
        IPBlock, NetworkPolicyEgressRule, NetworkPolicyIngressRule, NetworkPolicyPeer,
        NetworkPolicyPort, NetworkPolicySpec,
    },
    apimachinery::pkg::{apis::meta::v1::LabelSelector, util::intstr::IntOrString},
};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default)]
pub struct SynthesisParams {
    /// CIDRs to allow egress to for components that declare calls to targets
    /// outside the cluster. When empty, external calls are only recorded in
    /// the policy's annotations.
    pub external_egress_nets: Vec<IpNet>,
}

/// Derives one minimal-allow NetworkPolicy per component with at least one
/// declared edge.
///
/// Ingress admits exactly the declared callers on the component's port;
/// egress admits exactly the declared callees on their ports. External
/// targets cannot be selected by pod selector (NetworkPolicy has no notion of
/// a DNS name), so they are documented in an `architecture.external-calls`
/// annotation and, when CIDRs are configured, allowed via an ipBlock rule.
///
/// All iteration is over ordered containers: the same graph always produces
/// the same policies in the same order.
pub fn synthesize(graph: &DependencyGraph, params: &SynthesisParams) -> Vec<NetworkPolicy> {
    let mut callers: BTreeMap<ComponentId, BTreeSet<String>> = BTreeMap::new();
    let mut callees: BTreeMap<ComponentId, BTreeSet<ComponentId>> = BTreeMap::new();
    let mut externals: BTreeMap<ComponentId, BTreeSet<String>> = BTreeMap::new();
    for edge in graph.edges() {
        match &edge.target {
            Target::Component(target) => {
                callers
                    .entry(target.clone())
                    .or_default()
                    .insert(edge.source.name.clone());
                callees
                    .entry(edge.source.clone())
                    .or_default()
                    .insert(target.clone());
            }
            Target::External(name) => {
                externals
                    .entry(edge.source.clone())
                    .or_default()
                    .insert(name.clone());
            }
        }
    }

    let mut policies = Vec::new();
    for (id, component) in graph.components() {
        let inbound = callers.get(id);
        let outbound = callees.get(id);
        let external = externals.get(id);
        if inbound.is_none() && outbound.is_none() && external.is_none() {
            continue;
        }

        let ingress = inbound.map(|sources| {
            vec![NetworkPolicyIngressRule {
                from: Some(sources.iter().map(|app| app_peer(app)).collect()),
                ports: Some(vec![tcp_port(component.port.get())]),
            }]
        });

        // One egress rule per destination port, so each callee is admitted
        // only on the port it declares.
        let mut egress = Vec::new();
        if let Some(targets) = outbound {
            let mut by_port: BTreeMap<u16, BTreeSet<&str>> = BTreeMap::new();
            for target in targets {
                if let Some(callee) = graph.get(target) {
                    by_port
                        .entry(callee.port.get())
                        .or_default()
                        .insert(target.name.as_str());
                }
            }
            for (port, apps) in by_port {
                egress.push(NetworkPolicyEgressRule {
                    to: Some(apps.into_iter().map(app_peer).collect()),
                    ports: Some(vec![tcp_port(port)]),
                });
            }
        }
        if external.is_some() && !params.external_egress_nets.is_empty() {
            egress.push(NetworkPolicyEgressRule {
                to: Some(
                    params
                        .external_egress_nets
                        .iter()
                        .map(|net| NetworkPolicyPeer {
                            ip_block: Some(IPBlock {
                                cidr: net.to_string(),
                                except: None,
                            }),
                            ..Default::default()
                        })
                        .collect(),
                ),
                ports: None,
            });
        }

        let mut policy_types = Vec::new();
        if ingress.is_some() {
            policy_types.push("Ingress".to_string());
        }
        if !egress.is_empty() {
            policy_types.push("Egress".to_string());
        }

        let metadata_annotations = external.map(|names| {
            let joined = names.iter().cloned().collect::<Vec<_>>().join(",");
            std::iter::once((annotations::EXTERNAL_CALLS.to_string(), joined)).collect()
        });

        policies.push(NetworkPolicy {
            metadata: ObjectMeta {
                name: Some(id.name.clone()),
                namespace: Some(id.namespace.clone()),
                annotations: metadata_annotations,
                ..Default::default()
            },
            spec: Some(NetworkPolicySpec {
                pod_selector: LabelSelector {
                    match_labels: Some(
                        std::iter::once(("app".to_string(), id.name.clone())).collect(),
                    ),
                    match_expressions: None,
                },
                ingress,
                egress: (!egress.is_empty()).then_some(egress),
                policy_types: Some(policy_types),
            }),
        });
    }
    policies
}

/// Encodes policies as a multi-document YAML stream.
///
/// The output is committed to Git and diffed by reviewers, so encoding must
/// be byte-stable: same graph in, same bytes out.
pub fn to_yaml(policies: &[NetworkPolicy]) -> anyhow::Result<String> {
    let mut out = String::new();
    for (i, policy) in policies.iter().enumerate() {
        if i > 0 {
            out.push_str("---\n");
        }
        out.push_str(&serde_yaml::to_string(policy)?);
    }
    Ok(out)
}

fn app_peer(app: &str) -> NetworkPolicyPeer {
    NetworkPolicyPeer {
        pod_selector: Some(LabelSelector {
            match_labels: Some(std::iter::once(("app".to_string(), app.to_string())).collect()),
            match_expressions: None,
        }),
        ..Default::default()
    }
}

fn tcp_port(port: u16) -> NetworkPolicyPort {
    NetworkPolicyPort {
        port: Some(IntOrString::Int(i32::from(port))),
        protocol: Some("TCP".to_string()),
        end_port: None,
    }
}
