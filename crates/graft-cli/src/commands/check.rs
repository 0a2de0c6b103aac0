//! `graft check`: Verify that every project's consumable variants are
//! distinguishable.

use clap::Args;
use graft_sdk::session::ResolutionSession;

use crate::output;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Only report the number of conflicting projects.
    #[arg(short, long)]
    pub quiet: bool,
}

/// Executes the `check` command.
///
/// # Errors
///
/// Returns an error if any project exposes indistinguishable variants.
pub fn execute(session: &ResolutionSession, args: CheckArgs) -> anyhow::Result<()> {
    let conflicts = session.identity_conflicts();
    if conflicts.is_empty() {
        output::print_line(&format!(
            "{} project(s) checked, no ambiguous variants.",
            session.project_paths().len()
        ));
        return Ok(());
    }
    if !args.quiet {
        for (path, report) in &conflicts {
            output::print_block(&output::render_identity_conflicts(path, report.conflicts()));
        }
    }
    anyhow::bail!("{} project(s) expose ambiguous variants", conflicts.len())
}
