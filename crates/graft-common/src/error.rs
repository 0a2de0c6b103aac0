//! Unified error types for the graft workspace.
//!
//! Every failure the resolution engine can raise is a variant of
//! [`GraftError`]. Resolution failures are synchronous and never retried
//! inside the engine.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum GraftError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A textual notation (coordinate, version selector) could not be parsed.
    #[error("cannot parse {kind} from {input:?}")]
    Parse {
        /// What was being parsed.
        kind: &'static str,
        /// Offending input.
        input: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A named configuration does not exist, or cannot serve as a resolution root.
    #[error("configuration '{name}' not found in {component}")]
    ConfigurationNotFound {
        /// Requested configuration name.
        name: String,
        /// Display name of the component that was searched.
        component: String,
    },

    /// A dependency selected a configuration that may not be consumed.
    #[error(
        "selected configuration '{name}' on '{component}' but it can't be used as a project dependency because it isn't intended for consumption by other components (requested by {requester})"
    )]
    ConfigurationNotConsumable {
        /// Name of the non-consumable configuration.
        name: String,
        /// Display name of the component owning the configuration.
        component: String,
        /// Display name of the component that declared the dependency.
        requester: String,
    },

    /// Two or more versions of one module were requested under the strict strategy.
    #[error("conflict found for module '{module}': versions {}", versions.join(", "))]
    VersionConflict {
        /// Module identity (`group:name`).
        module: String,
        /// Competing requested versions, in request order.
        versions: Vec<String>,
    },

    /// Two or more components provide the same capability under the strict strategy.
    #[error("capability '{capability}' is provided by multiple components: {}", holders.join(", "))]
    CapabilityConflict {
        /// Capability identity (`group:name`).
        capability: String,
        /// Display names of the competing components.
        holders: Vec<String>,
    },

    /// No available version satisfies a selector.
    #[error("could not find any version matching {selector} for {module}")]
    NoMatchingVersion {
        /// The requested selector, as written.
        selector: String,
        /// Module identity (`group:name`).
        module: String,
    },

    /// A dynamic selector was used while dynamic versions are rejected.
    #[error("dynamic version {selector} requested for {module} but dynamic versions are disabled")]
    DynamicVersion {
        /// The requested selector, as written.
        selector: String,
        /// Module identity (`group:name`).
        module: String,
    },

    /// Two consumable variants of one component share the same identity.
    #[error(
        "consumable variants {first:?} and {second:?} of {component} share the same identity: {identity}"
    )]
    AmbiguousVariantIdentity {
        /// Display name of the offending component.
        component: String,
        /// First variant with the shared identity.
        first: String,
        /// Second variant with the shared identity.
        second: String,
        /// Description of the shared identity.
        identity: String,
    },

    /// Attribute matching was requested on a component that does not support it.
    #[error("no variants available for attribute matching on {component}")]
    NoVariantsForAttributeMatching {
        /// Display name of the component.
        component: String,
    },

    /// No variant of a component is compatible with the requested attributes.
    #[error("no variant of {component} matches the consumer attributes {requested}")]
    NoMatchingVariant {
        /// Display name of the component.
        component: String,
        /// Requested attributes rendered as `{k=v, ...}`.
        requested: String,
    },

    /// Several variants of a component are equally good matches.
    #[error("cannot choose between variants {} of {component} for {requested}", candidates.join(", "))]
    AmbiguousVariantSelection {
        /// Display name of the component.
        component: String,
        /// Requested attributes rendered as `{k=v, ...}`.
        requested: String,
        /// Names of the equally matching variants.
        candidates: Vec<String>,
    },

    /// No resolver in the chain could locate a component.
    #[error("cannot resolve {selector}: component not found")]
    ComponentNotFound {
        /// The requested selector, as written.
        selector: String,
    },
}

impl GraftError {
    /// Returns whether this failure stems from a conflict between candidates.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::VersionConflict { .. } | Self::CapabilityConflict { .. }
        )
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, GraftError>;
