//! Module version conflict resolution.
//!
//! When several versions of what routes to the same module are requested,
//! the [`ModuleConflictHandler`] picks one. The root component always wins;
//! otherwise candidates violating an endorsed strict constraint are dropped,
//! a forced candidate beats any unforced one, and the configured
//! [`ModuleConflictResolver`] settles the rest.

use std::fmt;

use graft_common::config::ConflictResolution;
use graft_common::error::{GraftError, Result};
use graft_common::selector::VersionSelector;
use graft_common::types::{ComponentId, ModuleId};
use graft_common::version::Version;
use tracing::debug;

use crate::reason::SelectionCause;

/// One version competing for a module's graph position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleCandidate {
    /// The candidate component.
    pub component: ComponentId,
    /// Its version.
    pub version: Version,
    /// Whether an edge or the strategy forces it.
    pub forced: bool,
    /// Whether it is the resolution root.
    pub root: bool,
}

impl ModuleCandidate {
    /// Creates an unforced, non-root candidate.
    #[must_use]
    pub const fn new(component: ComponentId, version: Version) -> Self {
        Self {
            component,
            version,
            forced: false,
            root: false,
        }
    }

    /// Whether the candidate is a local project.
    #[must_use]
    pub const fn is_project(&self) -> bool {
        self.component.is_project()
    }
}

/// Picks the winner among two or more distinct candidates.
pub trait ModuleConflictResolver: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Returns the index of the winning candidate.
    ///
    /// # Errors
    ///
    /// Returns an error if the conflict must fail the resolution.
    fn select(&self, module: &ModuleId, candidates: &[ModuleCandidate]) -> Result<usize>;
}

/// Fails on any disagreement.
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictModuleConflictResolver;

impl ModuleConflictResolver for StrictModuleConflictResolver {
    fn name(&self) -> &'static str {
        "strict"
    }

    fn select(&self, module: &ModuleId, candidates: &[ModuleCandidate]) -> Result<usize> {
        Err(GraftError::VersionConflict {
            module: module.to_string(),
            versions: candidates.iter().map(|c| c.version.to_string()).collect(),
        })
    }
}

/// The highest version wins; equal versions keep the earliest candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LatestModuleConflictResolver;

impl ModuleConflictResolver for LatestModuleConflictResolver {
    fn name(&self) -> &'static str {
        "latest"
    }

    fn select(&self, _module: &ModuleId, candidates: &[ModuleCandidate]) -> Result<usize> {
        Ok(highest(candidates.iter().enumerate()).unwrap_or(0))
    }
}

/// Local projects beat external modules; otherwise delegates.
#[derive(Debug)]
pub struct ProjectDependencyForcingResolver {
    delegate: Box<dyn ModuleConflictResolver>,
}

impl ProjectDependencyForcingResolver {
    /// Wraps `delegate`, which settles conflicts among projects or among modules.
    #[must_use]
    pub fn new(delegate: Box<dyn ModuleConflictResolver>) -> Self {
        Self { delegate }
    }
}

impl ModuleConflictResolver for ProjectDependencyForcingResolver {
    fn name(&self) -> &'static str {
        "preferProjectModules"
    }

    fn select(&self, module: &ModuleId, candidates: &[ModuleCandidate]) -> Result<usize> {
        let projects: Vec<usize> = candidates
            .iter()
            .enumerate()
            .filter(|(_, c)| c.is_project())
            .map(|(i, _)| i)
            .collect();
        match projects.as_slice() {
            [] => self.delegate.select(module, candidates),
            [only] => Ok(*only),
            several => {
                let subset: Vec<ModuleCandidate> =
                    several.iter().map(|&i| candidates[i].clone()).collect();
                let chosen = self.delegate.select(module, &subset)?;
                Ok(several.get(chosen).copied().unwrap_or(several[0]))
            }
        }
    }
}

/// The result of settling a module conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModuleConflictOutcome {
    /// Index of the winner in the candidate list.
    pub winner: usize,
    /// Cause to record on the winner.
    pub cause: SelectionCause,
}

/// Drives module conflict resolution for one resolution.
#[derive(Debug)]
pub struct ModuleConflictHandler {
    resolver: Box<dyn ModuleConflictResolver>,
}

impl ModuleConflictHandler {
    /// Creates the handler for a conflict mode.
    #[must_use]
    pub fn new(mode: ConflictResolution) -> Self {
        let resolver: Box<dyn ModuleConflictResolver> = match mode {
            ConflictResolution::Strict => Box::new(StrictModuleConflictResolver),
            ConflictResolution::Latest => Box::new(LatestModuleConflictResolver),
            ConflictResolution::PreferProjectModules => Box::new(
                ProjectDependencyForcingResolver::new(Box::new(LatestModuleConflictResolver)),
            ),
        };
        Self { resolver }
    }

    /// Creates a handler around a custom resolver.
    #[must_use]
    pub fn with_resolver(resolver: Box<dyn ModuleConflictResolver>) -> Self {
        Self { resolver }
    }

    /// Name of the underlying resolver.
    #[must_use]
    pub fn resolver_name(&self) -> &'static str {
        self.resolver.name()
    }

    /// Picks the winner among distinct `candidates` for `module`.
    ///
    /// `strict_bounds` are the endorsed strict selectors on the module; every
    /// one of them must accept the winner.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::VersionConflict`] if no candidate satisfies the
    /// strict bounds, or if the resolver rejects the conflict.
    pub fn resolve(
        &self,
        module: &ModuleId,
        candidates: &[ModuleCandidate],
        strict_bounds: &[VersionSelector],
    ) -> Result<ModuleConflictOutcome> {
        let conflict = || GraftError::VersionConflict {
            module: module.to_string(),
            versions: candidates.iter().map(|c| c.version.to_string()).collect(),
        };
        if let Some(root) = candidates.iter().position(|c| c.root) {
            return Ok(ModuleConflictOutcome {
                winner: root,
                cause: SelectionCause::Root,
            });
        }

        let eligible: Vec<usize> = (0..candidates.len())
            .filter(|&i| strict_bounds.iter().all(|b| b.accepts(&candidates[i].version)))
            .collect();
        if eligible.is_empty() {
            return Err(conflict());
        }

        let forced = highest(
            eligible
                .iter()
                .map(|&i| (i, &candidates[i]))
                .filter(|(_, c)| c.forced),
        );
        if let Some(winner) = forced {
            debug!(module = %module, version = %candidates[winner].version, "forced version wins");
            return Ok(ModuleConflictOutcome {
                winner,
                cause: SelectionCause::Forced,
            });
        }

        let winner = match eligible.as_slice() {
            [only] => *only,
            several => {
                let subset: Vec<ModuleCandidate> =
                    several.iter().map(|&i| candidates[i].clone()).collect();
                let chosen = self.resolver.select(module, &subset)?;
                several.get(chosen).copied().ok_or_else(conflict)?
            }
        };
        debug!(
            module = %module,
            resolver = self.resolver.name(),
            version = %candidates[winner].version,
            candidates = candidates.len(),
            "resolved module conflict"
        );
        Ok(ModuleConflictOutcome {
            winner,
            cause: SelectionCause::ConflictResolution,
        })
    }
}

fn highest<'a>(candidates: impl Iterator<Item = (usize, &'a ModuleCandidate)>) -> Option<usize> {
    candidates
        .max_by(|(ia, a), (ib, b)| a.version.cmp(&b.version).then(ib.cmp(ia)))
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use graft_common::selector::VersionSelectorScheme;

    use super::*;

    fn module() -> ModuleId {
        ModuleId::new("g", "m")
    }

    fn candidate(version: &str) -> ModuleCandidate {
        ModuleCandidate::new(
            ComponentId::module("g", "m", version),
            Version::parse(version).expect("version"),
        )
    }

    fn project_candidate() -> ModuleCandidate {
        ModuleCandidate::new(
            ComponentId::project(":", ":m"),
            Version::parse("0.1").expect("version"),
        )
    }

    #[test]
    fn latest_picks_highest_version() {
        let handler = ModuleConflictHandler::new(ConflictResolution::Latest);
        let outcome = handler
            .resolve(&module(), &[candidate("1.0"), candidate("2.0"), candidate("1.5")], &[])
            .expect("resolved");
        assert_eq!(outcome.winner, 1);
        assert_eq!(outcome.cause, SelectionCause::ConflictResolution);
    }

    #[test]
    fn latest_orders_releases_above_pre_releases() {
        let handler = ModuleConflictHandler::new(ConflictResolution::Latest);
        let outcome = handler
            .resolve(&module(), &[candidate("2.0"), candidate("2.0-rc1")], &[])
            .expect("resolved");
        assert_eq!(outcome.winner, 0);
    }

    #[test]
    fn strict_fails_naming_every_version() {
        let handler = ModuleConflictHandler::new(ConflictResolution::Strict);
        let err = handler
            .resolve(&module(), &[candidate("1.0"), candidate("2.0")], &[])
            .expect_err("conflict");
        assert!(matches!(err, GraftError::VersionConflict { .. }));
        let msg = err.to_string();
        assert!(msg.contains("1.0") && msg.contains("2.0"), "got: {msg}");
    }

    #[test]
    fn forced_candidate_wins_even_in_strict_mode() {
        let handler = ModuleConflictHandler::new(ConflictResolution::Strict);
        let mut forced = candidate("1.0");
        forced.forced = true;
        let outcome = handler
            .resolve(&module(), &[forced, candidate("2.0")], &[])
            .expect("forced");
        assert_eq!(outcome.winner, 0);
        assert_eq!(outcome.cause, SelectionCause::Forced);
    }

    #[test]
    fn root_is_never_evicted() {
        let handler = ModuleConflictHandler::new(ConflictResolution::Latest);
        let mut root = candidate("1.0");
        root.root = true;
        let outcome = handler
            .resolve(&module(), &[candidate("9.0"), root], &[])
            .expect("root");
        assert_eq!(outcome.winner, 1);
        assert_eq!(outcome.cause, SelectionCause::Root);
    }

    #[test]
    fn project_beats_higher_module_version() {
        let handler = ModuleConflictHandler::new(ConflictResolution::PreferProjectModules);
        let outcome = handler
            .resolve(&module(), &[candidate("5.0"), project_candidate()], &[])
            .expect("resolved");
        assert_eq!(outcome.winner, 1);
        let fallback = handler
            .resolve(&module(), &[candidate("5.0"), candidate("6.0")], &[])
            .expect("resolved");
        assert_eq!(fallback.winner, 1);
    }

    #[test]
    fn strict_bounds_filter_candidates() {
        let handler = ModuleConflictHandler::new(ConflictResolution::Latest);
        let bound = VersionSelectorScheme
            .parse_selector("[1.0,2.0)")
            .expect("range");
        let outcome = handler
            .resolve(
                &module(),
                &[candidate("1.5"), candidate("2.5")],
                std::slice::from_ref(&bound),
            )
            .expect("bounded");
        assert_eq!(outcome.winner, 0);

        let err = handler
            .resolve(&module(), &[candidate("2.5"), candidate("3.0")], &[bound])
            .expect_err("unsatisfiable");
        assert!(err.is_conflict());
    }
}
