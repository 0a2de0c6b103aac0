//! Variants a component offers to graph variant selection.
//!
//! Two selection paths are kept apart: attribute matching over the
//! attribute-bearing variants, and direct lookup by configuration name for
//! legacy configurations that carry no attributes.

use std::sync::Arc;

use graft_common::error::{GraftError, Result};

use crate::state::VariantGraphResolveState;

/// A snapshot of the consumable variants of one component.
///
/// A resolution captures the candidates of each component at first access
/// and keeps using that snapshot even if the component is reevaluated
/// meanwhile.
#[derive(Debug)]
pub struct GraphSelectionCandidates {
    component: String,
    generation: u64,
    variants: Vec<Arc<VariantGraphResolveState>>,
    with_attributes: Vec<Arc<VariantGraphResolveState>>,
}

impl GraphSelectionCandidates {
    /// Builds the candidate set from consumable variant states.
    #[must_use]
    pub fn new(
        component: impl Into<String>,
        generation: u64,
        variants: Vec<Arc<VariantGraphResolveState>>,
    ) -> Self {
        let with_attributes = variants
            .iter()
            .filter(|v| v.metadata().has_attributes())
            .cloned()
            .collect();
        Self {
            component: component.into(),
            generation,
            variants,
            with_attributes,
        }
    }

    /// Display name of the owning component.
    #[must_use]
    pub fn component(&self) -> &str {
        &self.component
    }

    /// Generation of the component state this snapshot was taken from.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether at least one variant carries attributes.
    #[must_use]
    pub fn supports_attribute_matching(&self) -> bool {
        !self.with_attributes.is_empty()
    }

    /// Variants that participate in attribute matching.
    ///
    /// # Errors
    ///
    /// Returns [`GraftError::NoVariantsForAttributeMatching`] when
    /// [`supports_attribute_matching`](Self::supports_attribute_matching) is
    /// false. Callers are expected to check first.
    pub fn variants_for_attribute_matching(&self) -> Result<&[Arc<VariantGraphResolveState>]> {
        if self.with_attributes.is_empty() {
            return Err(GraftError::NoVariantsForAttributeMatching {
                component: self.component.clone(),
            });
        }
        Ok(&self.with_attributes)
    }

    /// Looks up a consumable variant by its configuration name.
    #[must_use]
    pub fn variant_by_configuration_name(&self, name: &str) -> Option<Arc<VariantGraphResolveState>> {
        self.variants
            .iter()
            .find(|v| v.metadata().configuration_name() == Some(name))
            .cloned()
    }

    /// All consumable variants, in declaration order.
    #[must_use]
    pub fn all_variants(&self) -> &[Arc<VariantGraphResolveState>] {
        &self.variants
    }
}
