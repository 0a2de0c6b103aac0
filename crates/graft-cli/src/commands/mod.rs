//! CLI command definitions and dispatch.

pub mod check;
pub mod resolve;
pub mod variants;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use graft_common::config::ConflictResolution;
use graft_sdk::description::BuildDescription;
use graft_sdk::session::ResolutionSession;

/// graft: dependency graph resolution for multi-project builds.
#[derive(Parser, Debug)]
#[command(name = "graft", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Path to the build description.
    #[arg(
        short,
        long,
        global = true,
        env = "GRAFT_FILE",
        default_value = graft_common::constants::DEFAULT_DESCRIPTION_FILE
    )]
    pub file: PathBuf,

    /// Fail on any module version or capability conflict.
    #[arg(long, global = true)]
    pub strict: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Resolve configurations into dependency graphs.
    Resolve(resolve::ResolveArgs),
    /// List the selectable variants of a project.
    Variants(variants::VariantsArgs),
    /// Check that no project exposes indistinguishable variants.
    Check(check::CheckArgs),
}

/// Output format of reports.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    /// Human-readable tree.
    #[default]
    Text,
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let session = open_session(&cli.file, cli.strict)?;
    match cli.command {
        Command::Resolve(args) => resolve::execute(&session, args),
        Command::Variants(args) => variants::execute(&session, args),
        Command::Check(args) => check::execute(&session, args),
    }
}

/// Loads the build description at `path` into a session.
fn open_session(path: &std::path::Path, strict: bool) -> anyhow::Result<ResolutionSession> {
    let mut description = BuildDescription::load(path)
        .with_context(|| format!("cannot load build description {}", path.display()))?;
    if strict {
        description.resolution.conflict_resolution = ConflictResolution::Strict;
    }
    Ok(ResolutionSession::from_description(&description)?)
}
