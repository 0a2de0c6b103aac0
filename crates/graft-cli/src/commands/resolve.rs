//! `graft resolve`: Resolve configurations into dependency graphs.

use clap::Args;
use graft_sdk::report::{ReportingVisitor, ResolutionReport};
use graft_sdk::session::ResolutionSession;

use super::Format;
use crate::output;

/// Arguments for the `resolve` command.
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Path of the project to resolve, e.g. `:app`.
    #[arg(required_unless_present = "all")]
    pub project: Option<String>,

    /// Configuration to resolve.
    #[arg(short, long, default_value = "runtimeClasspath")]
    pub configuration: String,

    /// Resolve every resolvable configuration of every project, in parallel.
    #[arg(long, conflicts_with = "project")]
    pub all: bool,

    /// Output format.
    #[arg(long, value_enum, default_value_t = Format::Text)]
    pub format: Format,
}

/// Executes the `resolve` command.
///
/// A failed resolution still prints the partial graph built so far.
///
/// # Errors
///
/// Returns an error if any requested resolution fails.
pub fn execute(session: &ResolutionSession, args: ResolveArgs) -> anyhow::Result<()> {
    if args.all {
        return resolve_all(session, args.format);
    }
    let Some(project) = args.project else {
        anyhow::bail!("a project path is required unless --all is given");
    };
    let mut visitor = ReportingVisitor::new(args.configuration.clone());
    let outcome = session.resolve_with(&project, &args.configuration, &mut visitor);
    if let Some(report) = visitor.into_report() {
        output::print_line(&render(&report, args.format)?);
    }
    let _ = outcome?;
    Ok(())
}

fn resolve_all(session: &ResolutionSession, format: Format) -> anyhow::Result<()> {
    let mut requests = Vec::new();
    for path in session.project_paths() {
        let state = session.component_state(path)?;
        for name in state.configuration_names() {
            if state.configuration_flags(&name).is_some_and(|f| f.resolvable) {
                requests.push((path.to_string(), name));
            }
        }
    }
    tracing::info!(count = requests.len(), "resolving all configurations");

    let mut failures = 0_usize;
    for ((path, configuration), result) in requests.iter().zip(session.resolve_all(&requests)) {
        match result {
            Ok(graph) => {
                let report = ResolutionReport::from_graph(&graph, configuration);
                output::print_line(&render(&report, format)?);
            }
            Err(err) => {
                failures += 1;
                output::print_line(&output::failure_line(path, configuration, &err));
            }
        }
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} resolution(s) failed", requests.len());
    }
    Ok(())
}

fn render(report: &ResolutionReport, format: Format) -> anyhow::Result<String> {
    Ok(match format {
        Format::Text => output::render_tree(report),
        Format::Json => serde_json::to_string_pretty(report)?,
        Format::Yaml => serde_yaml::to_string(report)?,
    })
}
