use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use ipnet::IpNet;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(
    name = "archmap",
    about = "Audits and derives network policy from architecture annotations",
    version
)]
pub struct Args {
    #[clap(long, default_value = "archmap=info,warn", env = "ARCHMAP_LOG")]
    pub log_level: String,

    #[clap(long, default_value = "plain", env = "ARCHMAP_LOG_FORMAT")]
    pub log_format: LogFormat,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum LogFormat {
    Plain,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check declared dependencies for symmetry and NetworkPolicy coverage.
    ///
    /// Exits non-zero iff any error-severity finding exists.
    Audit(AuditArgs),

    /// Derive minimal-allow NetworkPolicy manifests from declared
    /// dependencies.
    GeneratePolicies(GeneratePoliciesArgs),

    /// Summarize the declared components and call flows.
    Report(ReportArgs),
}

#[derive(Debug, clap::Args)]
pub struct AuditArgs {
    /// Root of the manifest tree.
    #[clap(long, short = 'p', default_value = ".")]
    pub path: PathBuf,

    /// Read annotations from the live cluster instead of the manifest tree.
    #[clap(long)]
    pub cluster: bool,

    /// Namespace to read in cluster mode; may be repeated.
    #[clap(long = "namespace", short = 'n', requires = "cluster")]
    pub namespaces: Vec<String>,
}

#[derive(Debug, clap::Args)]
pub struct GeneratePoliciesArgs {
    /// Root of the manifest tree.
    #[clap(long, short = 'p', default_value = ".")]
    pub path: PathBuf,

    /// Write the manifests here instead of stdout.
    #[clap(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Network CIDRs to allow egress to for components that call targets
    /// outside the cluster, e.g. "0.0.0.0/0" or "10.0.0.0/8,192.168.0.0/16".
    #[clap(long)]
    pub external_egress_nets: Option<IpNets>,
}

#[derive(Debug, clap::Args)]
pub struct ReportArgs {
    /// Root of the manifest tree.
    #[clap(long, short = 'p', default_value = ".")]
    pub path: PathBuf,

    /// Emit the report as JSON instead of text.
    #[clap(long)]
    pub json: bool,
}

#[derive(Clone, Debug)]
pub struct IpNets(pub Vec<IpNet>);

// === impl IpNets ===

impl std::str::FromStr for IpNets {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        s.split(',')
            .map(|n| n.trim().parse().map_err(Into::into))
            .collect::<Result<Vec<IpNet>>>()
            .map(Self)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parses_comma_separated_nets() {
        let IpNets(nets) = "10.0.0.0/8, 192.168.0.0/16".parse().unwrap();
        assert_eq!(nets.len(), 2);
        assert!("10.0.0.0/8,not-a-net".parse::<IpNets>().is_err());
    }

    #[test]
    fn verifies_cli_definition() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
