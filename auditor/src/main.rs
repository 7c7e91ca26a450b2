#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    archmap_auditor::Args::parse_and_run().await
}
