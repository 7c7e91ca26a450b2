use crate::ReportArgs;
use anyhow::{bail, Result};
use archmap_auditor_core::{DependencyGraph, Target};
use archmap_auditor_k8s_index::load_tree;
use serde_json::json;
use std::{fmt::Write, process::ExitCode};

pub(crate) fn run(args: &ReportArgs) -> Result<ExitCode> {
    let snapshot = load_tree(&args.path)?;
    let (graph, _, _) = snapshot.into_graph();
    if graph.is_empty() {
        bail!("no components found under {}", args.path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&to_json(&graph))?);
    } else {
        print!("{}", to_text(&graph));
    }
    Ok(ExitCode::SUCCESS)
}

fn to_json(graph: &DependencyGraph) -> serde_json::Value {
    let components = graph
        .components()
        .map(|(id, c)| {
            json!({
                "name": id.name,
                "namespace": id.namespace,
                "kind": c.kind.to_string(),
                "domain": c.domain.map(|d| d.to_string()),
                "function": c.function,
                "partOf": c.part_of,
                "port": c.port.get(),
                "calls": c.calls,
                "invokedBy": c.invoked_by,
            })
        })
        .collect::<Vec<_>>();

    let edges = graph
        .edges()
        .map(|edge| match &edge.target {
            Target::Component(target) => json!({
                "source": edge.source.to_string(),
                "target": target.to_string(),
                "external": false,
            }),
            Target::External(name) => json!({
                "source": edge.source.to_string(),
                "target": name,
                "external": true,
            }),
        })
        .collect::<Vec<_>>();

    json!({ "components": components, "edges": edges })
}

fn to_text(graph: &DependencyGraph) -> String {
    let mut out = String::new();
    let _ = writeln!(&mut out, "# Architecture report\n");

    let _ = writeln!(&mut out, "## Components\n");
    for (id, component) in graph.components() {
        let _ = writeln!(&mut out, "- {} ({} in {})", id.name, component.kind, id.namespace);
        if let Some(domain) = component.domain {
            let _ = writeln!(&mut out, "  - domain: {}", domain);
        }
        if let Some(function) = &component.function {
            let _ = writeln!(&mut out, "  - function: {}", function);
        }
        if !component.calls.is_empty() {
            let calls = component.calls.iter().cloned().collect::<Vec<_>>();
            let _ = writeln!(&mut out, "  - calls: {}", calls.join(", "));
        }
        if !component.invoked_by.is_empty() {
            let invokers = component.invoked_by.iter().cloned().collect::<Vec<_>>();
            let _ = writeln!(&mut out, "  - invoked by: {}", invokers.join(", "));
        }
    }

    let _ = writeln!(&mut out, "\n## Call flow\n");
    let mut any = false;
    for edge in graph.edges() {
        any = true;
        match &edge.target {
            Target::Component(target) => {
                let _ = writeln!(&mut out, "- {} -> {}", edge.source, target);
            }
            Target::External(name) => {
                let _ = writeln!(&mut out, "- {} -> {} (external)", edge.source, name);
            }
        }
    }
    if !any {
        let _ = writeln!(&mut out, "(no declared call relations)");
    }
    out
}
