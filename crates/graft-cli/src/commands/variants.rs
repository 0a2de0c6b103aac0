//! `graft variants`: List the selectable variants of a project.

use clap::Args;
use graft_sdk::session::ResolutionSession;

use super::Format;
use crate::output;

/// Arguments for the `variants` command.
#[derive(Args, Debug)]
pub struct VariantsArgs {
    /// Path of the project, e.g. `:lib`.
    pub project: String,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// Executes the `variants` command.
///
/// # Errors
///
/// Returns an error if the project is unknown or its variants are ambiguous.
pub fn execute(session: &ResolutionSession, args: VariantsArgs) -> anyhow::Result<()> {
    let variants = session.variants(&args.project)?;
    let rendered = match args.format {
        Format::Text => output::render_variants(&args.project, &variants),
        Format::Json => serde_json::to_string_pretty(variants.as_ref())?,
        Format::Yaml => serde_yaml::to_string(variants.as_ref())?,
    };
    output::print_line(&rendered);
    Ok(())
}
