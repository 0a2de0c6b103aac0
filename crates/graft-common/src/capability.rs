//! Capabilities: the `group:name:version` identities a variant provides.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::ModuleVersionId;
use crate::version::Version;

/// A capability declared by a variant.
///
/// Two capabilities conflict when their [`key`](Self::key) is equal,
/// regardless of version.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Capability {
    group: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    appendix: Option<String>,
}

impl Capability {
    /// Creates a capability.
    #[must_use]
    pub fn new(
        group: impl Into<String>,
        name: impl Into<String>,
        version: Option<String>,
    ) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
            version,
            appendix: None,
        }
    }

    /// The implicit capability of a module version.
    #[must_use]
    pub fn implicit(id: &ModuleVersionId) -> Self {
        Self::new(
            id.module().group(),
            id.module().name(),
            Some(id.version().to_string()),
        )
    }

    /// Derives a capability that shadows this one with an appendix,
    /// e.g. `g:lib` shadowed with `-test-fixtures` becomes `g:lib-test-fixtures`.
    #[must_use]
    pub fn shadowed(&self, appendix: &str) -> Self {
        Self {
            group: self.group.clone(),
            name: format!("{}{appendix}", self.name),
            version: self.version.clone(),
            appendix: Some(appendix.to_string()),
        }
    }

    /// Returns the group.
    #[must_use]
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the name, including any shadowing appendix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the declared version text.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Returns the declared version, when it parses.
    #[must_use]
    pub fn parsed_version(&self) -> Option<Version> {
        self.version.as_deref().and_then(|v| Version::parse(v).ok())
    }

    /// Returns the shadowing appendix, if any.
    #[must_use]
    pub fn appendix(&self) -> Option<&str> {
        self.appendix.as_deref()
    }

    /// Version-independent identity used to detect conflicts.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.group, self.name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.name)?;
        if let Some(v) = &self.version {
            write!(f, ":{v}")?;
        }
        Ok(())
    }
}
