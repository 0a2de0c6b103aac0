//! The immutable strategy governing one resolution.

use std::collections::HashMap;

use graft_common::attributes::Attributes;
use graft_common::config::{ConflictResolution, ResolutionConfig};
use graft_common::error::{GraftError, Result};
use graft_common::selector::{VersionConstraint, VersionSelectorScheme};
use graft_common::types::{ComponentSelector, ModuleId, ModuleVersionId};

use crate::reason::{SelectionCause, SelectionDescriptor};

/// Rewrites requests for one module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencySubstitution {
    /// Module whose requests are rewritten.
    pub module: ModuleId,
    /// Only requests for this exact version are rewritten, when set.
    pub version: Option<String>,
    /// What the request is rewritten to.
    pub replacement: ComponentSelector,
    /// Optional explanation recorded on the selection reason.
    pub because: Option<String>,
}

impl DependencySubstitution {
    fn applies_to(&self, selector: &ComponentSelector) -> bool {
        match selector {
            ComponentSelector::Module { module, constraint } => {
                module == &self.module
                    && self
                        .version
                        .as_deref()
                        .is_none_or(|v| constraint.to_string() == v)
            }
            ComponentSelector::Project { .. } => false,
        }
    }
}

/// Declarations that a module was replaced by another one.
///
/// Conflicts between a replaced module and its replacement are settled as
/// if both had the identity of the replacement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleReplacements {
    replaced_by: HashMap<ModuleId, (ModuleId, Option<String>)>,
}

impl ModuleReplacements {
    /// Declares that `module` is replaced by `replacement`.
    pub fn declare(&mut self, module: ModuleId, replacement: ModuleId, because: Option<String>) {
        let _ = self.replaced_by.insert(module, (replacement, because));
    }

    /// Returns the direct replacement of `module`.
    #[must_use]
    pub fn replacement_for(&self, module: &ModuleId) -> Option<&ModuleId> {
        self.replaced_by.get(module).map(|(m, _)| m)
    }

    /// Returns the explanation attached to the replacement of `module`.
    #[must_use]
    pub fn because(&self, module: &ModuleId) -> Option<&str> {
        self.replaced_by.get(module).and_then(|(_, b)| b.as_deref())
    }

    /// Follows replacements from `module` to the final identity.
    ///
    /// Replacement cycles stop at the first repeated module.
    #[must_use]
    pub fn route(&self, module: &ModuleId) -> ModuleId {
        let mut current = module;
        let mut seen = vec![module];
        while let Some(next) = self.replacement_for(current) {
            if seen.contains(&next) {
                break;
            }
            seen.push(next);
            current = next;
        }
        current.clone()
    }

    /// Whether no replacement is declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.replaced_by.is_empty()
    }
}

/// Everything a resolution needs to know about how conflicts and requests
/// are handled. Immutable once a resolution starts.
#[derive(Debug, Clone, Default)]
pub struct ResolutionStrategy {
    conflict_resolution: ConflictResolution,
    scheme: VersionSelectorScheme,
    consumer_attributes: Attributes,
    substitutions: Vec<DependencySubstitution>,
    replacements: ModuleReplacements,
    forced: HashMap<ModuleId, String>,
    fail_on_dynamic_versions: bool,
}

impl ResolutionStrategy {
    /// A strategy with the given conflict mode and no rules.
    #[must_use]
    pub fn new(conflict_resolution: ConflictResolution) -> Self {
        Self {
            conflict_resolution,
            ..Self::default()
        }
    }

    /// Builds a strategy from its declarative form.
    ///
    /// # Errors
    ///
    /// Returns an error if a module notation or version cannot be parsed.
    pub fn from_config(config: &ResolutionConfig) -> Result<Self> {
        let mut strategy = Self::new(config.conflict_resolution)
            .with_consumer_attributes(config.consumer_attributes.clone());
        strategy.fail_on_dynamic_versions = config.fail_on_dynamic_versions;
        for substitution in &config.substitutions {
            let (module, version) = parse_module_notation(&substitution.module)?;
            let replacement = parse_replacement(strategy.scheme, &substitution.with)?;
            strategy.substitutions.push(DependencySubstitution {
                module,
                version,
                replacement,
                because: substitution.because.clone(),
            });
        }
        for replacement in &config.replacements {
            strategy.replacements.declare(
                replacement.module.parse()?,
                replacement.replaced_by.parse()?,
                replacement.because.clone(),
            );
        }
        for forced in &config.forced_modules {
            let id: ModuleVersionId = forced.parse()?;
            strategy = strategy.forcing(&id);
        }
        Ok(strategy)
    }

    /// Sets the default consumer attributes.
    #[must_use]
    pub fn with_consumer_attributes(mut self, attributes: Attributes) -> Self {
        self.consumer_attributes = attributes;
        self
    }

    /// Adds a substitution rule.
    #[must_use]
    pub fn substituting(mut self, substitution: DependencySubstitution) -> Self {
        self.substitutions.push(substitution);
        self
    }

    /// Declares a module replacement.
    #[must_use]
    pub fn replacing(mut self, module: ModuleId, replacement: ModuleId) -> Self {
        self.replacements.declare(module, replacement, None);
        self
    }

    /// Forces a module version.
    #[must_use]
    pub fn forcing(mut self, id: &ModuleVersionId) -> Self {
        let _ = self
            .forced
            .insert(id.module().clone(), id.version().to_string());
        self
    }

    /// Rejects dynamic selectors.
    #[must_use]
    pub const fn failing_on_dynamic_versions(mut self) -> Self {
        self.fail_on_dynamic_versions = true;
        self
    }

    /// The module conflict mode.
    #[must_use]
    pub const fn conflict_resolution(&self) -> ConflictResolution {
        self.conflict_resolution
    }

    /// Whether conflicts of any kind fail the resolution.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        self.conflict_resolution == ConflictResolution::Strict
    }

    /// The version selector scheme.
    #[must_use]
    pub const fn scheme(&self) -> VersionSelectorScheme {
        self.scheme
    }

    /// Attributes every request starts from.
    #[must_use]
    pub const fn consumer_attributes(&self) -> &Attributes {
        &self.consumer_attributes
    }

    /// Module replacement declarations.
    #[must_use]
    pub const fn replacements(&self) -> &ModuleReplacements {
        &self.replacements
    }

    /// Whether dynamic selectors are rejected.
    #[must_use]
    pub const fn fails_on_dynamic_versions(&self) -> bool {
        self.fail_on_dynamic_versions
    }

    /// The version forced for `module` by the strategy, if any.
    #[must_use]
    pub fn forced_version(&self, module: &ModuleId) -> Option<&str> {
        self.forced.get(module).map(String::as_str)
    }

    /// Applies the first matching substitution rule to `selector`.
    ///
    /// Returns the rewritten selector and the descriptor to record.
    #[must_use]
    pub fn substitute(
        &self,
        selector: &ComponentSelector,
    ) -> Option<(ComponentSelector, SelectionDescriptor)> {
        self.substitutions
            .iter()
            .find(|s| s.applies_to(selector))
            .map(|s| {
                let descriptor = match &s.because {
                    Some(because) => {
                        SelectionDescriptor::described(SelectionCause::SelectedByRule, because)
                    }
                    None => SelectionDescriptor::of(SelectionCause::SelectedByRule),
                };
                (s.replacement.clone(), descriptor)
            })
    }
}

fn parse_module_notation(notation: &str) -> Result<(ModuleId, Option<String>)> {
    match notation.matches(':').count() {
        1 => Ok((notation.parse()?, None)),
        2 => {
            let id: ModuleVersionId = notation.parse()?;
            Ok((id.module().clone(), Some(id.version().to_string())))
        }
        _ => Err(GraftError::Parse {
            kind: "module notation",
            input: notation.to_string(),
        }),
    }
}

fn parse_replacement(scheme: VersionSelectorScheme, notation: &str) -> Result<ComponentSelector> {
    if notation.starts_with(':') {
        return Ok(ComponentSelector::project(notation));
    }
    let parts: Vec<&str> = notation.splitn(3, ':').collect();
    match parts.as_slice() {
        [group, name, version] => Ok(ComponentSelector::module(
            ModuleId::new(*group, *name),
            VersionConstraint::prefer(scheme.parse_selector(version)?),
        )),
        _ => Err(GraftError::Parse {
            kind: "substitution target",
            input: notation.to_string(),
        }),
    }
}
