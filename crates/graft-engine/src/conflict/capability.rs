//! Capability conflict resolution.
//!
//! When nodes of different components declare the same capability, one of
//! them has to go. The [`CapabilityConflictHandler`] runs an ordered list of
//! resolvers; each either settles the conflict or defers to the next one.
//! Under the strict strategy the list is empty and every conflict fails.
//! Otherwise a claim held by the resolution root always wins.

use std::fmt;

use graft_common::capability::Capability;
use graft_common::error::{GraftError, Result};
use graft_common::types::ComponentId;
use tracing::debug;

/// One node claiming a capability, in the order the claims were registered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityCandidate {
    /// Graph node holding the claim.
    pub node: usize,
    /// Owning component.
    pub component: ComponentId,
    /// The claimed capability, with the version declared by that node.
    pub capability: Capability,
    /// Whether the claim belongs to the root of the resolution.
    pub root: bool,
}

/// Outcome of one resolver step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityResolution {
    /// The candidate at this index wins.
    Resolved(usize),
    /// Let the next resolver decide.
    Defer,
}

/// One step of the capability resolver chain.
pub trait CapabilityConflictResolver: Send + Sync + fmt::Debug {
    /// Name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Tries to pick a winner among `candidates`.
    fn resolve(&self, capability: &str, candidates: &[CapabilityCandidate]) -> CapabilityResolution;
}

/// Picks the candidate with the strictly highest capability version.
///
/// Defers when versions are missing or the highest one is shared.
#[derive(Debug, Clone, Copy, Default)]
pub struct UpgradeCapabilityResolver;

impl CapabilityConflictResolver for UpgradeCapabilityResolver {
    fn name(&self) -> &'static str {
        "upgrade"
    }

    fn resolve(&self, _capability: &str, candidates: &[CapabilityCandidate]) -> CapabilityResolution {
        let Some(versions) = candidates
            .iter()
            .map(|c| c.capability.parsed_version())
            .collect::<Option<Vec<_>>>()
        else {
            return CapabilityResolution::Defer;
        };
        let Some(best) = versions.iter().max() else {
            return CapabilityResolution::Defer;
        };
        let mut at_best = versions
            .iter()
            .enumerate()
            .filter(|(_, v)| v.compare_semantically(best).is_eq());
        match (at_best.next(), at_best.next()) {
            (Some((index, _)), None) => CapabilityResolution::Resolved(index),
            _ => CapabilityResolution::Defer,
        }
    }
}

/// Picks the most recently registered candidate.
#[derive(Debug, Clone, Copy, Default)]
pub struct LastCandidateCapabilityResolver;

impl CapabilityConflictResolver for LastCandidateCapabilityResolver {
    fn name(&self) -> &'static str {
        "last candidate"
    }

    fn resolve(&self, _capability: &str, candidates: &[CapabilityCandidate]) -> CapabilityResolution {
        candidates
            .len()
            .checked_sub(1)
            .map_or(CapabilityResolution::Defer, CapabilityResolution::Resolved)
    }
}

/// Runs capability resolvers in order until one settles the conflict.
#[derive(Debug, Default)]
pub struct CapabilityConflictHandler {
    resolvers: Vec<Box<dyn CapabilityConflictResolver>>,
}

impl CapabilityConflictHandler {
    /// A handler with no resolvers: every conflict fails.
    #[must_use]
    pub fn strict() -> Self {
        Self::default()
    }

    /// The default chain: upgrade, then last candidate.
    #[must_use]
    pub fn lenient() -> Self {
        Self {
            resolvers: vec![
                Box::new(UpgradeCapabilityResolver),
                Box::new(LastCandidateCapabilityResolver),
            ],
        }
    }

    /// Creates the handler matching a strictness flag.
    #[must_use]
    pub fn for_strictness(strict: bool) -> Self {
        if strict { Self::strict() } else { Self::lenient() }
    }

    /// Registers a resolver that runs before the ones already present.
    pub fn register_resolver(&mut self, resolver: Box<dyn CapabilityConflictResolver>) {
        self.resolvers.insert(0, resolver);
    }

    /// Names of the registered resolvers, in the order they run.
    #[must_use]
    pub fn resolver_names(&self) -> Vec<&'static str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Returns the index of the candidate that keeps the capability.
    ///
    /// The root's claim wins without consulting the resolvers, unless there
    /// are none.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::CapabilityConflict`] when no resolver decides.
    pub fn resolve(&self, capability: &str, candidates: &[CapabilityCandidate]) -> Result<usize> {
        let root = candidates.iter().position(|c| c.root);
        if let Some(root) = root.filter(|_| !self.resolvers.is_empty()) {
            debug!(capability, winner = %candidates[root].component, "root keeps capability");
            return Ok(root);
        }
        for resolver in &self.resolvers {
            if let CapabilityResolution::Resolved(index) = resolver.resolve(capability, candidates) {
                if index < candidates.len() {
                    debug!(
                        capability,
                        resolver = resolver.name(),
                        winner = %candidates[index].component,
                        "resolved capability conflict"
                    );
                    return Ok(index);
                }
            }
        }
        Err(GraftError::CapabilityConflict {
            capability: capability.to_string(),
            holders: candidates.iter().map(|c| c.component.display_name()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claim(node: usize, module: &str, version: Option<&str>) -> CapabilityCandidate {
        CapabilityCandidate {
            node,
            component: ComponentId::module("g", module, "1.0"),
            capability: Capability::new("g", "cap", version.map(str::to_string)),
            root: false,
        }
    }

    #[test]
    fn upgrade_prefers_highest_capability_version() {
        let handler = CapabilityConflictHandler::lenient();
        let winner = handler
            .resolve("g:cap", &[claim(1, "a", Some("2.0")), claim(2, "b", Some("1.0"))])
            .expect("resolved");
        assert_eq!(winner, 0);
    }

    #[test]
    fn equal_versions_fall_back_to_last_candidate() {
        let handler = CapabilityConflictHandler::lenient();
        let winner = handler
            .resolve("g:cap", &[claim(1, "a", Some("1.0")), claim(2, "b", Some("1.0"))])
            .expect("resolved");
        assert_eq!(winner, 1);
        assert_eq!(
            UpgradeCapabilityResolver.resolve("g:cap", &[claim(1, "a", None), claim(2, "b", None)]),
            CapabilityResolution::Defer
        );
    }

    #[test]
    fn strict_handler_fails_listing_holders() {
        let handler = CapabilityConflictHandler::for_strictness(true);
        let err = handler
            .resolve("g:cap", &[claim(1, "a", Some("1.0")), claim(2, "b", Some("1.0"))])
            .expect_err("conflict");
        let msg = err.to_string();
        assert!(msg.contains("g:a:1.0") && msg.contains("g:b:1.0"), "got: {msg}");
    }

    #[test]
    fn root_claim_wins_unless_strict() {
        let root = CapabilityCandidate {
            node: 0,
            component: ComponentId::project(":", ":app"),
            capability: Capability::new("g", "cap", Some("1.0".to_string())),
            root: true,
        };
        let claims = [root, claim(1, "b", Some("9.0"))];

        let mut lenient = CapabilityConflictHandler::lenient();
        lenient.register_resolver(Box::new(PreferModule(":b:")));
        assert_eq!(lenient.resolve("g:cap", &claims).expect("resolved"), 0);

        let err = CapabilityConflictHandler::strict()
            .resolve("g:cap", &claims)
            .expect_err("conflict");
        assert!(matches!(err, GraftError::CapabilityConflict { ref holders, .. } if holders.len() == 2));
    }

    #[derive(Debug)]
    struct PreferModule(&'static str);

    impl CapabilityConflictResolver for PreferModule {
        fn name(&self) -> &'static str {
            "prefer module"
        }

        fn resolve(&self, _: &str, candidates: &[CapabilityCandidate]) -> CapabilityResolution {
            candidates
                .iter()
                .position(|c| c.component.to_string().contains(self.0))
                .map_or(CapabilityResolution::Defer, CapabilityResolution::Resolved)
        }
    }

    #[test]
    fn registered_resolvers_run_first() {
        let mut handler = CapabilityConflictHandler::lenient();
        handler.register_resolver(Box::new(PreferModule(":a:")));
        assert_eq!(handler.resolver_names()[0], "prefer module");
        let winner = handler
            .resolve("g:cap", &[claim(1, "a", Some("1.0")), claim(2, "b", Some("3.0"))])
            .expect("resolved");
        assert_eq!(winner, 0);
    }
}
