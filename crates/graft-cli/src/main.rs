//! # graft CLI
//!
//! Resolves the dependency graphs of a build described in `graft.yaml`.
//! Single binary for resolving configurations, listing variants, and
//! checking variant identities.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
