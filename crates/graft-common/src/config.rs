//! Resolution configuration model.
//!
//! This is the declarative form of a resolution strategy, as written in a
//! build description. The engine validates it and turns it into an
//! immutable strategy before a resolution starts.

use serde::{Deserialize, Serialize};

use crate::attributes::Attributes;

/// How competing versions of one module are settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConflictResolution {
    /// Any disagreement fails the resolution.
    Strict,
    /// The highest version wins.
    #[default]
    Latest,
    /// A project component wins over external modules, otherwise latest.
    PreferProjectModules,
}

impl std::fmt::Display for ConflictResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Strict => write!(f, "strict"),
            Self::Latest => write!(f, "latest"),
            Self::PreferProjectModules => write!(f, "preferProjectModules"),
        }
    }
}

/// A dependency substitution declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubstitutionConfig {
    /// Module notation to replace, `group:name` or `group:name:version`.
    pub module: String,
    /// Replacement: a project path (`:lib`) or `group:name:version`.
    pub with: String,
    /// Optional human-readable reason recorded on the selected node.
    #[serde(default)]
    pub because: Option<String>,
}

/// Declares that one module is replaced by another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementConfig {
    /// Replaced module, `group:name`.
    pub module: String,
    /// Replacing module, `group:name`.
    pub replaced_by: String,
    /// Optional human-readable reason.
    #[serde(default)]
    pub because: Option<String>,
}

/// Root configuration for one resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResolutionConfig {
    /// Module conflict resolution mode.
    pub conflict_resolution: ConflictResolution,
    /// Attributes added to every request, below the root variant's own.
    pub consumer_attributes: Attributes,
    /// Dependency substitution rules, applied in declaration order.
    pub substitutions: Vec<SubstitutionConfig>,
    /// Module replacement rules.
    pub replacements: Vec<ReplacementConfig>,
    /// Forced module versions, `group:name:version`.
    pub forced_modules: Vec<String>,
    /// Rejects dynamic selectors (prefixes, ranges, `latest.*`).
    pub fail_on_dynamic_versions: bool,
}
