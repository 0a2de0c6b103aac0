//! Conflict handlers consulted while the graph is built.
//!
//! - [`module`]: several versions of one module compete for a graph position.
//! - [`capability`]: several components provide the same capability.

pub mod capability;
pub mod module;

pub use capability::{
    CapabilityCandidate, CapabilityConflictHandler, CapabilityConflictResolver,
    CapabilityResolution, LastCandidateCapabilityResolver, UpgradeCapabilityResolver,
};
pub use module::{
    LatestModuleConflictResolver, ModuleCandidate, ModuleConflictHandler, ModuleConflictOutcome,
    ModuleConflictResolver, ProjectDependencyForcingResolver, StrictModuleConflictResolver,
};
