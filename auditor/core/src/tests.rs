use crate::{
    audit, worst_severity, Component, ComponentId, DependencyGraph, Finding, PolicyRules, Severity,
    Target, WorkloadKind, DEFAULT_PORT,
};
use std::collections::BTreeSet;

fn mk_component(ns: &str, name: &str, calls: &[&str], invoked_by: &[&str]) -> Component {
    Component {
        name: name.to_string(),
        namespace: ns.to_string(),
        kind: WorkloadKind::Deployment,
        domain: None,
        function: None,
        part_of: None,
        port: DEFAULT_PORT,
        calls: calls.iter().map(|s| s.to_string()).collect(),
        invoked_by: invoked_by.iter().map(|s| s.to_string()).collect(),
    }
}

fn id(ns: &str, name: &str) -> ComponentId {
    ComponentId {
        namespace: ns.to_string(),
        name: name.to_string(),
    }
}

fn mk_policy(ns: &str, app: &str, from: Option<&[&str]>, to: Option<&[&str]>) -> PolicyRules {
    let collect = |names: &[&str]| names.iter().map(|s| s.to_string()).collect::<BTreeSet<_>>();
    PolicyRules {
        name: app.to_string(),
        namespace: ns.to_string(),
        selects_app: app.to_string(),
        allow_from: from.map(collect),
        allow_to: to.map(collect),
    }
}

#[test]
fn graph_resolves_known_and_dangling_targets() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "api", &["data-access", "external-database"], &[]),
        mk_component("business-domain", "data-access", &[], &["api"]),
    ]);

    let edges: Vec<_> = graph.edges().cloned().collect();
    assert_eq!(edges.len(), 2);
    assert!(edges.iter().any(|e| matches!(
        &e.target,
        Target::Component(t) if t.name == "data-access"
    )));
    assert!(edges.iter().any(|e| matches!(
        &e.target,
        Target::External(t) if t == "external-database"
    )));
}

#[test]
fn graph_is_insensitive_to_input_order() {
    let components = vec![
        mk_component("business-domain", "api", &["data-access", "orchestrator"], &[]),
        mk_component("business-domain", "data-access", &[], &["api"]),
        mk_component("support-domain", "orchestrator", &["api"], &[]),
    ];
    let mut reversed = components.clone();
    reversed.reverse();

    let forward = DependencyGraph::build(components);
    let backward = DependencyGraph::build(reversed);

    assert_eq!(
        forward.edges().cloned().collect::<Vec<_>>(),
        backward.edges().cloned().collect::<Vec<_>>()
    );
    assert_eq!(audit(&forward, &[]), audit(&backward, &[]));
}

#[test]
fn graph_tolerates_cycles() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "api", &["notifier"], &["notifier"]),
        mk_component("support-domain", "notifier", &["api"], &["api"]),
    ]);

    assert_eq!(graph.edges().count(), 2);
    assert!(audit(&graph, &[]).iter().all(|f| f.severity() == Severity::Info));
}

#[test]
fn acknowledged_edge_yields_no_symmetry_finding() {
    // api -> data-access is declared on both ends; orchestrator does not
    // acknowledge api, so exactly one warning names that pair.
    let graph = DependencyGraph::build(vec![
        mk_component(
            "business-domain",
            "api",
            &["data-access", "orchestrator", "access-control"],
            &[],
        ),
        mk_component("business-domain", "data-access", &[], &["api"]),
        mk_component("support-domain", "orchestrator", &[], &[]),
        mk_component("support-domain", "access-control", &[], &["api"]),
    ]);

    let findings = audit(&graph, &[]);
    let symmetry: Vec<_> = findings
        .iter()
        .filter(|f| matches!(f, Finding::MissingInvokedBy { .. } | Finding::MissingCalls { .. }))
        .collect();
    assert_eq!(symmetry.len(), 1, "{:?}", findings);
    assert_eq!(
        symmetry[0].to_string(),
        "orchestrator declares no invoked_by entry for api"
    );
    assert_eq!(symmetry[0].severity(), Severity::Warning);
}

#[test]
fn unacknowledged_invoker_yields_reverse_finding() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "api", &[], &[]),
        mk_component("business-domain", "data-access", &[], &["api"]),
    ]);

    let findings = audit(&graph, &[]);
    assert!(
        findings.contains(&Finding::MissingCalls {
            invoker: id("business-domain", "api"),
            component: id("business-domain", "data-access"),
        }),
        "{:?}",
        findings
    );
    assert_eq!(
        findings
            .iter()
            .find(|f| matches!(f, Finding::MissingCalls { .. }))
            .map(ToString::to_string)
            .as_deref(),
        Some("api declares no calls entry for data-access")
    );
}

#[test]
fn dangling_targets_never_produce_symmetry_findings() {
    let graph = DependencyGraph::build(vec![mk_component(
        "business-domain",
        "api",
        &["external-database"],
        &["external-gateway"],
    )]);

    let findings = audit(&graph, &[]);
    assert!(findings.iter().all(|f| f.severity() == Severity::Info), "{:?}", findings);
    assert!(findings.contains(&Finding::ExternalCall {
        source: id("business-domain", "api"),
        target: "external-database".to_string(),
    }));
    assert!(findings.contains(&Finding::ExternalInvoker {
        component: id("business-domain", "api"),
        invoker: "external-gateway".to_string(),
    }));
}

#[test]
fn missing_policy_is_a_single_info_finding() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "ui", &["api"], &[]),
        mk_component("business-domain", "api", &["ui"], &["ui"]),
    ]);
    // Only the ui side carries a policy; api is unrestricted.
    let policies = vec![mk_policy("business-domain", "ui", Some(&["api"]), Some(&["api"]))];

    let findings = audit(&graph, &policies);
    let unrestricted: Vec<_> = findings
        .iter()
        .filter(|f| matches!(f, Finding::NoNetworkPolicy { .. }))
        .collect();
    assert_eq!(unrestricted.len(), 1, "{:?}", findings);
    assert_eq!(
        unrestricted[0].to_string(),
        "api has no NetworkPolicy; traffic is unrestricted"
    );
    assert_eq!(unrestricted[0].severity(), Severity::Info);
    assert_eq!(worst_severity(&findings), Some(Severity::Warning));
}

#[test]
fn policy_omitting_a_declared_caller_is_an_error() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "ui", &["api"], &[]),
        mk_component("business-domain", "api", &[], &["ui"]),
    ]);
    let policies = vec![
        mk_policy("business-domain", "api", Some(&["orchestrator"]), None),
        mk_policy("business-domain", "ui", None, Some(&["api"])),
    ];

    let findings = audit(&graph, &policies);
    let errors: Vec<_> = findings
        .iter()
        .filter(|f| f.severity() == Severity::Error)
        .collect();
    assert_eq!(errors.len(), 1, "{:?}", findings);
    assert_eq!(
        errors[0].to_string(),
        "edge ui->api is not permitted by api's NetworkPolicy api"
    );
    assert_eq!(worst_severity(&findings), Some(Severity::Error));
}

#[test]
fn policy_omitting_a_declared_callee_is_an_egress_error() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "ui", &["api"], &[]),
        mk_component("business-domain", "api", &[], &["ui"]),
    ]);
    let policies = vec![
        mk_policy("business-domain", "api", Some(&["ui"]), None),
        mk_policy("business-domain", "ui", None, Some(&["data-access"])),
    ];

    let findings = audit(&graph, &policies);
    assert!(
        findings.contains(&Finding::EgressNotPermitted {
            source: id("business-domain", "ui"),
            target: id("business-domain", "api"),
            policy: "ui".to_string(),
        }),
        "{:?}",
        findings
    );
}

#[test]
fn unrestricted_direction_is_compliant() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "ui", &["api"], &[]),
        mk_component("business-domain", "api", &[], &["ui"]),
    ]);
    // Neither policy restricts the direction the edge traverses.
    let policies = vec![
        mk_policy("business-domain", "api", None, Some(&[])),
        mk_policy("business-domain", "ui", Some(&[]), None),
    ];

    let findings = audit(&graph, &policies);
    assert_eq!(worst_severity(&findings), None, "{:?}", findings);
}

#[test]
fn duplicate_components_warn_and_last_wins() {
    let mut second = mk_component("business-domain", "api", &["data-access"], &[]);
    second.function = Some("rest-facade".to_string());
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "api", &[], &[]),
        mk_component("business-domain", "data-access", &[], &["api"]),
        second,
    ]);

    assert_eq!(graph.len(), 2);
    assert_eq!(
        graph.get(&id("business-domain", "api")).unwrap().function.as_deref(),
        Some("rest-facade")
    );
    assert!(graph
        .advisories()
        .contains(&Finding::DuplicateComponent { id: id("business-domain", "api") }));
}

#[test]
fn ambiguous_targets_warn_and_resolve_to_all_matches() {
    let graph = DependencyGraph::build(vec![
        mk_component("business-domain", "ui", &["audit-log"], &[]),
        mk_component("support-domain", "audit-log", &[], &["ui"]),
        mk_component("shared-components", "audit-log", &[], &["ui"]),
    ]);

    let known = graph
        .edges()
        .filter(|e| matches!(e.target, Target::Component(_)))
        .count();
    assert_eq!(known, 2);
    assert!(graph.advisories().contains(&Finding::AmbiguousTarget {
        source: id("business-domain", "ui"),
        target: "audit-log".to_string(),
    }));
}
