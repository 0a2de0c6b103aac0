//! Declarative build descriptions.
//!
//! A build description lists the projects of one build with their
//! configurations, the external modules a repository offers, and the
//! resolution settings. It is written in YAML or JSON:
//!
//! ```yaml
//! group: com.example
//! projects:
//!   - path: ":app"
//!     configurations:
//!       - name: runtimeClasspath
//!         resolvable: true
//!         attributes: { usage: runtime }
//!         dependencies: [":lib", "org.slf4j:slf4j-api:2.0.9"]
//! modules:
//!   - id: "org.slf4j:slf4j-api:2.0.9"
//!     variants:
//!       - name: runtime
//!         attributes: { usage: runtime }
//! resolution:
//!   conflictResolution: latest
//! ```

use std::path::Path;

use graft_common::attributes::Attributes;
use graft_common::capability::Capability;
use graft_common::config::ResolutionConfig;
use graft_common::constants::{RELEASE_STATUS, ROOT_BUILD_NAME, ROOT_PROJECT_PATH};
use graft_common::error::{GraftError, Result};
use graft_common::selector::VersionConstraint;
use graft_common::types::{ComponentSelector, ModuleId, ModuleVersionId};
use graft_model::artifact::ArtifactMetadata;
use graft_model::configuration::ConfigurationDefinition;
use graft_model::dependency::{DependencyMetadata, ExcludeRule};
use graft_model::repository::ExternalModuleMetadata;
use graft_model::variant::VariantMetadata;
use serde::{Deserialize, Serialize};

const DEFAULT_GROUP: &str = "local";
const DEFAULT_VERSION: &str = "unspecified";

/// A whole build: projects, reachable modules, and resolution settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildDescription {
    /// Name of the build.
    pub build: String,
    /// Group of projects that declare none.
    pub group: String,
    /// Version of projects that declare none.
    pub version: String,
    /// Projects of the build.
    pub projects: Vec<ProjectDescription>,
    /// Modules available from the repository.
    pub modules: Vec<ModuleDescription>,
    /// Resolution settings.
    pub resolution: ResolutionConfig,
}

impl Default for BuildDescription {
    fn default() -> Self {
        Self {
            build: ROOT_BUILD_NAME.to_string(),
            group: DEFAULT_GROUP.to_string(),
            version: DEFAULT_VERSION.to_string(),
            projects: Vec::new(),
            modules: Vec::new(),
            resolution: ResolutionConfig::default(),
        }
    }
}

impl BuildDescription {
    /// Loads a description, choosing the format from the file extension.
    ///
    /// `.json` files are read as JSON, anything else as YAML.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::Io`] if the file cannot be read, and a parse
    /// error if its content is not a valid description.
    pub fn load(path: &Path) -> Result<Self> {
        tracing::info!(path = %path.display(), "loading build description");
        let content = std::fs::read_to_string(path).map_err(|e| GraftError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parses a YAML description.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::Config`] if the YAML is invalid.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| GraftError::Config {
            message: e.to_string(),
        })
    }

    /// Parses a JSON description.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::Serialization`] if the JSON is invalid.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Looks up a project by path.
    #[must_use]
    pub fn project(&self, path: &str) -> Option<&ProjectDescription> {
        self.projects.iter().find(|p| p.path == path)
    }

    /// Module coordinates a project publishes under.
    #[must_use]
    pub fn coordinates_of(&self, project: &ProjectDescription) -> ModuleVersionId {
        let name = project.name.clone().unwrap_or_else(|| {
            match project.path.rsplit(':').next().filter(|s| !s.is_empty()) {
                Some(last) => last.to_string(),
                None if project.path == ROOT_PROJECT_PATH => "root".to_string(),
                None => project.path.clone(),
            }
        });
        ModuleVersionId::new(
            project.group.clone().unwrap_or_else(|| self.group.clone()),
            name,
            project.version.clone().unwrap_or_else(|| self.version.clone()),
        )
    }
}

/// One project of the build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDescription {
    /// Project path, e.g. `:lib`.
    pub path: String,
    /// Module name; defaults to the last path segment.
    #[serde(default)]
    pub name: Option<String>,
    /// Module group; defaults to the build's.
    #[serde(default)]
    pub group: Option<String>,
    /// Module version; defaults to the build's.
    #[serde(default)]
    pub version: Option<String>,
    /// Declared configurations.
    #[serde(default)]
    pub configurations: Vec<ConfigurationDescription>,
}

impl ProjectDescription {
    /// Converts the declared configurations.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any malformed notation.
    pub fn configuration_definitions(&self) -> Result<Vec<ConfigurationDefinition>> {
        self.configurations
            .iter()
            .map(ConfigurationDescription::to_definition)
            .collect()
    }
}

/// One configuration of a project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigurationDescription {
    /// Configuration name.
    pub name: String,
    /// Whether other components may select it.
    pub consumable: bool,
    /// Whether it may seed a resolution.
    pub resolvable: bool,
    /// Variant attributes.
    pub attributes: Attributes,
    /// Capabilities, `group:name[:version]`.
    pub capabilities: Vec<String>,
    /// Published artifacts.
    pub artifacts: Vec<ArtifactMetadata>,
    /// Declared dependencies.
    pub dependencies: Vec<DependencyDescription>,
    /// Configurations whose dependencies this one inherits.
    pub extends_from: Vec<String>,
}

impl ConfigurationDescription {
    /// Converts to the model form.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any malformed notation.
    pub fn to_definition(&self) -> Result<ConfigurationDefinition> {
        Ok(ConfigurationDefinition {
            name: self.name.clone(),
            attributes: self.attributes.clone(),
            capabilities: parse_capabilities(&self.capabilities)?,
            artifacts: self.artifacts.clone(),
            dependencies: parse_dependencies(&self.dependencies)?,
            extends_from: self.extends_from.clone(),
            can_be_consumed: self.consumable,
            can_be_resolved: self.resolvable,
        })
    }
}

/// One published module version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDescription {
    /// Coordinates, `group:name:version`.
    pub id: String,
    /// Publication status; `release` when absent.
    #[serde(default)]
    pub status: Option<String>,
    /// Published variants.
    #[serde(default)]
    pub variants: Vec<VariantDescription>,
}

impl ModuleDescription {
    /// Converts to repository metadata.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any malformed notation.
    pub fn to_metadata(&self) -> Result<ExternalModuleMetadata> {
        let mut metadata = ExternalModuleMetadata::new(self.id.parse()?)
            .with_status(self.status.as_deref().unwrap_or(RELEASE_STATUS));
        for variant in &self.variants {
            metadata = metadata.with_variant(variant.to_metadata()?);
        }
        Ok(metadata)
    }
}

/// One published variant of a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VariantDescription {
    /// Variant name.
    pub name: String,
    /// Variant attributes.
    pub attributes: Attributes,
    /// Capabilities, `group:name[:version]`.
    pub capabilities: Vec<String>,
    /// Published artifacts.
    pub artifacts: Vec<ArtifactMetadata>,
    /// Declared dependencies.
    pub dependencies: Vec<DependencyDescription>,
}

impl VariantDescription {
    /// Converts to variant metadata.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any malformed notation.
    pub fn to_metadata(&self) -> Result<VariantMetadata> {
        let mut variant = VariantMetadata::new(&self.name)
            .with_attributes(self.attributes.clone())
            .with_dependencies(parse_dependencies(&self.dependencies)?);
        for capability in parse_capabilities(&self.capabilities)? {
            variant = variant.with_capability(capability);
        }
        for artifact in &self.artifacts {
            variant = variant.with_artifact(artifact.clone());
        }
        Ok(variant)
    }
}

/// A dependency, either as a short notation or spelled out.
///
/// Short notations are `:path` for projects and `group:name:version` for
/// modules, where the version may carry a `!!` strict suffix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependencyDescription {
    /// `:path` or `group:name:version`.
    Notation(String),
    /// Full form.
    Detailed(DetailedDependency),
}

/// The full form of a dependency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DetailedDependency {
    /// Module notation, `group:name` or `group:name:version`.
    pub module: Option<String>,
    /// Project path; exclusive with `module`.
    pub project: Option<String>,
    /// Version constraint, when `module` carries none.
    pub version: Option<String>,
    /// Requested attributes.
    pub attributes: Attributes,
    /// Required capabilities, `group:name[:version]`.
    pub capabilities: Vec<String>,
    /// Explicit target configuration.
    pub configuration: Option<String>,
    /// Exclusions: `group`, `group:name`, `*:name`.
    pub excludes: Vec<String>,
    /// Whether the requested version wins module conflicts.
    pub force: bool,
    /// Whether strict constraints of the target bind the graph.
    pub endorse_strict_versions: bool,
}

impl DependencyDescription {
    /// Converts to dependency metadata.
    ///
    /// # Errors
    ///
    /// Returns a parse error for any malformed notation.
    pub fn to_metadata(&self) -> Result<DependencyMetadata> {
        match self {
            Self::Notation(notation) => Ok(DependencyMetadata::new(parse_selector(notation, None)?)),
            Self::Detailed(detailed) => detailed.to_metadata(),
        }
    }
}

impl DetailedDependency {
    fn to_metadata(&self) -> Result<DependencyMetadata> {
        let selector = match (&self.module, &self.project) {
            (Some(module), None) => parse_selector(module, self.version.as_deref())?,
            (None, Some(path)) => parse_project_path(path)?,
            _ => {
                return Err(GraftError::Config {
                    message: "a dependency declares exactly one of 'module' or 'project'"
                        .to_string(),
                });
            }
        };
        let mut metadata = DependencyMetadata::new(selector).with_attributes(self.attributes.clone());
        for capability in parse_capabilities(&self.capabilities)? {
            metadata = metadata.requiring(capability);
        }
        if let Some(configuration) = &self.configuration {
            metadata = metadata.targeting(configuration.clone());
        }
        for exclude in &self.excludes {
            metadata = metadata.excluding(parse_exclude(exclude)?);
        }
        if self.force {
            metadata = metadata.forced();
        }
        if self.endorse_strict_versions {
            metadata = metadata.endorsing_strict_versions();
        }
        Ok(metadata)
    }
}

fn parse_dependencies(dependencies: &[DependencyDescription]) -> Result<Vec<DependencyMetadata>> {
    dependencies
        .iter()
        .map(DependencyDescription::to_metadata)
        .collect()
}

fn parse_selector(notation: &str, version: Option<&str>) -> Result<ComponentSelector> {
    if notation.starts_with(':') {
        return parse_project_path(notation);
    }
    let parts: Vec<&str> = notation.splitn(3, ':').collect();
    let (module, constraint) = match (parts.as_slice(), version) {
        ([group, name, constraint], None) => (ModuleId::new(*group, *name), *constraint),
        ([group, name], Some(constraint)) => (ModuleId::new(*group, *name), constraint),
        _ => {
            return Err(GraftError::Parse {
                kind: "dependency notation",
                input: notation.to_string(),
            });
        }
    };
    if module.group().is_empty() || module.name().is_empty() {
        return Err(GraftError::Parse {
            kind: "dependency notation",
            input: notation.to_string(),
        });
    }
    Ok(ComponentSelector::module(
        module,
        constraint.parse::<VersionConstraint>()?,
    ))
}

/// Accepts `:` and `:a:b` style paths; rejects empty segments.
fn parse_project_path(path: &str) -> Result<ComponentSelector> {
    let valid = path == ":"
        || path
            .strip_prefix(':')
            .is_some_and(|rest| rest.split(':').all(|segment| !segment.trim().is_empty()));
    if !valid {
        return Err(GraftError::Parse {
            kind: "project path",
            input: path.to_string(),
        });
    }
    Ok(ComponentSelector::project(path))
}

fn parse_capabilities(notations: &[String]) -> Result<Vec<Capability>> {
    notations.iter().map(|n| parse_capability(n)).collect()
}

fn parse_capability(notation: &str) -> Result<Capability> {
    match notation.split(':').collect::<Vec<_>>().as_slice() {
        [group, name] if !group.is_empty() && !name.is_empty() => {
            Ok(Capability::new(*group, *name, None))
        }
        [group, name, version] if !group.is_empty() && !name.is_empty() => {
            Ok(Capability::new(*group, *name, Some((*version).to_string())))
        }
        _ => Err(GraftError::Parse {
            kind: "capability notation",
            input: notation.to_string(),
        }),
    }
}

fn parse_exclude(notation: &str) -> Result<ExcludeRule> {
    let part = |s: &str| (s != "*" && !s.is_empty()).then(|| s.to_string());
    match notation.split(':').collect::<Vec<_>>().as_slice() {
        [group] if !group.is_empty() => Ok(ExcludeRule {
            group: part(group),
            module: None,
        }),
        [group, module] => Ok(ExcludeRule {
            group: part(group),
            module: part(module),
        }),
        _ => Err(GraftError::Parse {
            kind: "exclude notation",
            input: notation.to_string(),
        }),
    }
}
