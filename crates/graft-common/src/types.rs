//! Identifier types used as map keys throughout the workspace.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GraftError, Result};
use crate::selector::VersionConstraint;

/// A `group:name` module identity, independent of any version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleId {
    group: String,
    name: String,
}

impl ModuleId {
    /// Creates a module identity.
    #[must_use]
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Returns the group.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the module name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pairs this module with a version.
    #[must_use]
    pub fn with_version(&self, version: impl Into<String>) -> ModuleVersionId {
        ModuleVersionId {
            module: self.clone(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)
    }
}

impl FromStr for ModuleId {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, name] if !group.is_empty() && !name.is_empty() => Ok(Self::new(*group, *name)),
            _ => Err(GraftError::Parse {
                kind: "module identifier",
                input: s.to_string(),
            }),
        }
    }
}

/// A `group:name:version` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ModuleVersionId {
    module: ModuleId,
    version: String,
}

impl ModuleVersionId {
    /// Creates a module version identity.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ModuleId::new(group, name).with_version(version)
    }

    /// Returns the module identity.
    #[must_use]
    pub const fn module(&self) -> &ModuleId {
        &self.module
    }

    /// Returns the version string.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }
}

impl fmt::Display for ModuleVersionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.version)
    }
}

impl FromStr for ModuleVersionId {
    type Err = GraftError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split(':').collect::<Vec<_>>().as_slice() {
            [group, name, version]
                if !group.is_empty() && !name.is_empty() && !version.is_empty() =>
            {
                Ok(Self::new(*group, *name, *version))
            }
            _ => Err(GraftError::Parse {
                kind: "module version identifier",
                input: s.to_string(),
            }),
        }
    }
}

/// Uniquely names a resolvable unit: a project of some build, or an
/// external module version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentId {
    /// A project inside a (possibly included) build.
    Project {
        /// Name of the owning build.
        build: String,
        /// Project path, e.g. `:lib`.
        path: String,
    },
    /// An external module version.
    Module(ModuleVersionId),
}

impl ComponentId {
    /// Creates a project identifier in the given build.
    #[must_use]
    pub fn project(build: impl Into<String>, path: impl Into<String>) -> Self {
        Self::Project {
            build: build.into(),
            path: path.into(),
        }
    }

    /// Creates an external module component identifier.
    #[must_use]
    pub fn module(
        group: impl Into<String>,
        name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self::Module(ModuleVersionId::new(group, name, version))
    }

    /// Returns whether this identifies a local project.
    #[must_use]
    pub const fn is_project(&self) -> bool {
        matches!(self, Self::Project { .. })
    }

    /// Human-readable name used in diagnostics.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project { build, path } if build == crate::constants::ROOT_BUILD_NAME => {
                write!(f, "project {path}")
            }
            Self::Project { build, path } => write!(f, "project :{build}{path}"),
            Self::Module(id) => write!(f, "{id}"),
        }
    }
}

/// What a dependency edge asks for before resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ComponentSelector {
    /// A project of the current build, by path.
    Project {
        /// Project path, e.g. `:lib`.
        path: String,
    },
    /// An external module with a version constraint.
    Module {
        /// Requested module.
        module: ModuleId,
        /// Requested version constraint.
        constraint: VersionConstraint,
    },
}

impl ComponentSelector {
    /// Selects a project of the current build.
    #[must_use]
    pub fn project(path: impl Into<String>) -> Self {
        Self::Project { path: path.into() }
    }

    /// Selects a module with the given constraint.
    #[must_use]
    pub const fn module(module: ModuleId, constraint: VersionConstraint) -> Self {
        Self::Module { module, constraint }
    }
}

impl fmt::Display for ComponentSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Project { path } => write!(f, "project {path}"),
            Self::Module { module, constraint } => write!(f, "{module}:{constraint}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn module_version_id_parses_and_displays() {
        let id: ModuleVersionId = "org.example:core:1.2".parse().expect("parse");
        assert_eq!(id.module().group(), "org.example");
        assert_eq!(id.module().name(), "core");
        assert_eq!(id.version(), "1.2");
        assert_eq!(id.to_string(), "org.example:core:1.2");
    }

    #[test]
    fn module_id_rejects_missing_name() {
        assert!("org.example".parse::<ModuleId>().is_err());
        assert!("org.example:".parse::<ModuleId>().is_err());
    }

    #[test]
    fn project_display_name_depends_on_build() {
        assert_eq!(ComponentId::project(":", ":lib").display_name(), "project :lib");
        assert_eq!(
            ComponentId::project("included", ":lib").display_name(),
            "project :included:lib"
        );
    }

    #[test]
    fn component_ids_are_usable_as_keys() {
        let mut set = std::collections::HashSet::new();
        assert!(set.insert(ComponentId::module("g", "m", "1.0")));
        assert!(!set.insert(ComponentId::module("g", "m", "1.0")));
        assert!(set.insert(ComponentId::module("g", "m", "2.0")));
    }
}
