//! Formatted output helpers for CLI commands.
//!
//! Renders resolution reports as dependency trees, and variant listings
//! and identity conflicts as indented blocks.

use std::collections::HashSet;
use std::fmt::Write as _;

use graft_common::error::GraftError;
use graft_model::state::SelectableVariantResult;
use graft_model::verifier::IdentityConflict;
use graft_sdk::report::{ReportEntry, ResolutionReport};

const BRANCH: &str = "+--- ";
const LAST_BRANCH: &str = "\\--- ";
const PIPE: &str = "|    ";
const BLANK: &str = "     ";

/// Writes `text` and a newline to standard output.
#[allow(clippy::print_stdout)]
pub fn print_line(text: &str) {
    println!("{text}");
}

/// Writes already line-terminated `text` to standard output.
#[allow(clippy::print_stdout)]
pub fn print_block(text: &str) {
    print!("{text}");
}

/// Renders a report as a dependency tree.
///
/// Subtrees already printed are abbreviated with `(*)`.
#[must_use]
pub fn render_tree(report: &ResolutionReport) -> String {
    let mut out = format!("{} ({})\n", report.root, report.configuration);
    if let Some(root) = report.nodes.first() {
        let mut seen = HashSet::from([root.id]);
        render_children(report, root, "", &mut seen, &mut out);
    }
    if !report.cycles.is_empty() {
        let _ = writeln!(out, "\ncycles:");
        for cycle in &report.cycles {
            let _ = writeln!(out, "  {}", cycle.join(" <-> "));
        }
    }
    let _ = write!(
        out,
        "\n{} node(s), {} edge(s), {} artifact(s)",
        report.nodes.len(),
        report.edges,
        report.artifacts.len()
    );
    if let Some(failure) = &report.failure {
        let _ = write!(out, "\nFAILED (partial graph): {failure}");
    }
    out
}

fn render_children(
    report: &ResolutionReport,
    node: &ReportEntry,
    prefix: &str,
    seen: &mut HashSet<usize>,
    out: &mut String,
) {
    let count = node.dependencies.len();
    for (index, id) in node.dependencies.iter().enumerate() {
        let Some(child) = report.nodes.iter().find(|n| n.id == *id) else {
            continue;
        };
        let last = index + 1 == count;
        let branch = if last { LAST_BRANCH } else { BRANCH };
        let expanded = seen.insert(child.id);
        let _ = write!(out, "{prefix}{branch}{}", describe(child));
        if !expanded && !child.dependencies.is_empty() {
            out.push_str(" (*)");
        }
        out.push('\n');
        if expanded {
            let nested = format!("{prefix}{}", if last { BLANK } else { PIPE });
            render_children(report, child, &nested, seen, out);
        }
    }
}

fn describe(node: &ReportEntry) -> String {
    match node.reason.as_str() {
        "" | "requested" => format!("{} [{}]", node.component, node.variant),
        reason => format!("{} [{}] ({reason})", node.component, node.variant),
    }
}

/// Renders the selectable variants of a project.
#[must_use]
pub fn render_variants(project: &str, variants: &[SelectableVariantResult]) -> String {
    let mut out = format!("Variants of project {project}:");
    if variants.is_empty() {
        out.push_str("\n  (none)");
    }
    for variant in variants {
        let _ = write!(out, "\n  {}", variant.name);
        let _ = write!(out, "\n      attributes: {}", variant.attributes);
        if !variant.capabilities.is_empty() {
            let names: Vec<String> = variant.capabilities.iter().map(ToString::to_string).collect();
            let _ = write!(out, "\n      capabilities: {}", names.join(", "));
        }
    }
    out
}

/// Renders the identity conflicts of one project.
#[must_use]
pub fn render_identity_conflicts(project: &str, conflicts: &[IdentityConflict]) -> String {
    let mut out = format!("project {project}:\n");
    for conflict in conflicts {
        let _ = writeln!(
            out,
            "  '{}' and '{}' share {}",
            conflict.first, conflict.second, conflict.identity
        );
    }
    out
}

/// One-line summary of a failed resolution.
#[must_use]
pub fn failure_line(project: &str, configuration: &str, error: &GraftError) -> String {
    format!("project {project} ({configuration}): FAILED: {error}")
}
