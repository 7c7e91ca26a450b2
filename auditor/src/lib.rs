//! The `archmap` CLI.
//!
//! Thin wiring over the core and index crates: load a snapshot (manifest tree
//! or live cluster), build the per-run dependency graph, then run whichever
//! pass the subcommand asks for. Findings go to stdout; logs go to stderr.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod args;
mod report;

pub use self::args::{Args, AuditArgs, Command, GeneratePoliciesArgs, IpNets, LogFormat, ReportArgs};

use anyhow::{bail, Context, Result};
use archmap_auditor_core::{audit, worst_severity, Finding, Severity};
use archmap_auditor_k8s_index::{load_cluster, load_tree, synthesize, to_yaml, Snapshot, SynthesisParams};
use clap::Parser;
use std::process::ExitCode;

// === impl Args ===

impl Args {
    pub async fn parse_and_run() -> Result<ExitCode> {
        let args = Self::parse();
        init_logging(&args.log_level, args.log_format)?;

        match args.command {
            Command::Audit(args) => run_audit(args).await,
            Command::GeneratePolicies(args) => generate_policies(args),
            Command::Report(args) => report::run(&args),
        }
    }
}

async fn run_audit(args: AuditArgs) -> Result<ExitCode> {
    let snapshot = if args.cluster {
        if args.namespaces.is_empty() {
            bail!("cluster mode needs at least one --namespace");
        }
        let client = kube::Client::try_default()
            .await
            .context("connecting to the cluster")?;
        load_cluster(client, &args.namespaces).await?
    } else {
        load_tree(&args.path)?
    };

    let findings = audit_snapshot(snapshot);
    print!("{}", render_findings(&findings));
    tracing::info!(findings = findings.len(), "audit complete");

    match worst_severity(&findings) {
        Some(Severity::Error) => Ok(ExitCode::FAILURE),
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn generate_policies(args: GeneratePoliciesArgs) -> Result<ExitCode> {
    let snapshot = load_tree(&args.path)?;
    let (graph, _, _) = snapshot.into_graph();
    if graph.is_empty() {
        bail!("no components found under {}", args.path.display());
    }

    let params = SynthesisParams {
        external_egress_nets: args.external_egress_nets.map(|IpNets(nets)| nets).unwrap_or_default(),
    };
    let policies = synthesize(&graph, &params);
    tracing::info!(components = graph.len(), policies = policies.len(), "synthesized policies");

    let yaml = to_yaml(&policies)?;
    match args.output {
        Some(path) => std::fs::write(&path, yaml)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", yaml),
    }
    Ok(ExitCode::SUCCESS)
}

/// Merges the extraction-time advisories with the audit passes into one
/// stable, deduplicated report.
fn audit_snapshot(snapshot: Snapshot) -> Vec<Finding> {
    let (graph, policies, advisories) = snapshot.into_graph();
    let mut findings = advisories;
    findings.extend(audit(&graph, &policies));
    findings.sort();
    findings.dedup();
    findings
}

fn render_findings(findings: &[Finding]) -> String {
    use std::fmt::Write;

    let mut out = String::new();
    for finding in findings {
        // Findings are data, not diagnostics: they go to stdout in full,
        // whatever the log filter says.
        let _ = writeln!(&mut out, "{}: {}", finding.severity(), finding);
    }
    out
}

fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter =
        tracing_subscriber::EnvFilter::try_new(level).context("invalid log level filter")?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Plain => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
    Ok(())
}
