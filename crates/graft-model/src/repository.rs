//! External module metadata, as supplied by a repository collaborator.
//!
//! The engine never fetches anything itself. It asks a [`ModuleRepository`]
//! for the versions of a module and for the metadata of one version;
//! implementations may block the calling thread.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use graft_common::constants::RELEASE_STATUS;
use graft_common::error::Result;
use graft_common::types::{ModuleId, ModuleVersionId};
use graft_common::version::Version;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::variant::VariantMetadata;

fn default_status() -> String {
    RELEASE_STATUS.to_string()
}

/// Metadata of one published module version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalModuleMetadata {
    /// Module coordinates.
    pub id: ModuleVersionId,
    /// Publication status, e.g. `release` or `integration`.
    #[serde(default = "default_status")]
    pub status: String,
    /// Published variants.
    #[serde(default)]
    pub variants: Vec<VariantMetadata>,
}

impl ExternalModuleMetadata {
    /// Creates metadata with no variants and the `release` status.
    #[must_use]
    pub fn new(id: ModuleVersionId) -> Self {
        Self {
            id,
            status: default_status(),
            variants: Vec::new(),
        }
    }

    /// Adds a published variant.
    #[must_use]
    pub fn with_variant(mut self, variant: VariantMetadata) -> Self {
        self.variants.push(variant);
        self
    }

    /// Sets the publication status.
    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = status.into();
        self
    }
}

/// Source of external module metadata.
pub trait ModuleRepository: Send + Sync + fmt::Debug {
    /// Lists every known version of `module`, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails or a version cannot be parsed.
    fn list_versions(&self, module: &ModuleId) -> Result<Vec<Version>>;

    /// Returns the metadata of one module version, or `None` if unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the metadata cannot be read.
    fn metadata(&self, id: &ModuleVersionId) -> Result<Option<Arc<ExternalModuleMetadata>>>;
}

/// A repository holding published metadata in memory.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    modules: RwLock<BTreeMap<ModuleId, BTreeMap<String, Arc<ExternalModuleMetadata>>>>,
}

impl InMemoryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes (or republishes) one module version.
    pub fn publish(&self, metadata: ExternalModuleMetadata) {
        let module = metadata.id.module().clone();
        let version = metadata.id.version().to_string();
        let _ = self
            .modules
            .write()
            .entry(module)
            .or_default()
            .insert(version, Arc::new(metadata));
    }

    /// Number of published module versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.read().values().map(BTreeMap::len).sum()
    }

    /// Whether nothing is published.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModuleRepository for InMemoryRepository {
    fn list_versions(&self, module: &ModuleId) -> Result<Vec<Version>> {
        self.modules
            .read()
            .get(module)
            .map_or_else(Vec::new, |versions| versions.keys().cloned().collect::<Vec<_>>())
            .iter()
            .map(|v| Version::parse(v))
            .collect()
    }

    fn metadata(&self, id: &ModuleVersionId) -> Result<Option<Arc<ExternalModuleMetadata>>> {
        Ok(self
            .modules
            .read()
            .get(id.module())
            .and_then(|versions| versions.get(id.version()))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_and_lookup() {
        let repo = InMemoryRepository::new();
        repo.publish(ExternalModuleMetadata::new(ModuleVersionId::new("g", "m", "1.0")));
        repo.publish(
            ExternalModuleMetadata::new(ModuleVersionId::new("g", "m", "2.0"))
                .with_variant(VariantMetadata::new("runtime").with_attribute("usage", "runtime")),
        );
        assert_eq!(repo.len(), 2);

        let mut versions = repo
            .list_versions(&ModuleId::new("g", "m"))
            .expect("versions");
        versions.sort();
        let names: Vec<&str> = versions.iter().map(Version::as_str).collect();
        assert_eq!(names, vec!["1.0", "2.0"]);

        let meta = repo
            .metadata(&ModuleVersionId::new("g", "m", "2.0"))
            .expect("lookup")
            .expect("published");
        assert_eq!(meta.status, "release");
        assert_eq!(meta.variants.len(), 1);
        assert!(
            repo.metadata(&ModuleVersionId::new("g", "m", "3.0"))
                .expect("lookup")
                .is_none()
        );
    }

    #[test]
    fn unknown_module_has_no_versions() {
        let repo = InMemoryRepository::new();
        assert!(repo.is_empty());
        assert!(
            repo.list_versions(&ModuleId::new("g", "missing"))
                .expect("versions")
                .is_empty()
        );
    }

    #[test]
    fn metadata_deserializes_with_defaults() {
        let json = r#"{"id":{"module":{"group":"g","name":"m"},"version":"1.0"}}"#;
        let meta: ExternalModuleMetadata = serde_json::from_str(json).expect("deserialize");
        assert_eq!(meta.status, "release");
        assert!(meta.variants.is_empty());
    }
}
