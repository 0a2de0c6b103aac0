//! Monotonic instance identifiers for component and variant states.

use std::sync::atomic::{AtomicU64, Ordering};

/// Hands out build-tree-unique ids.
#[derive(Debug)]
pub struct IdGenerator {
    next_component: AtomicU64,
    next_variant: AtomicU64,
}

impl IdGenerator {
    /// Creates a generator starting at 1 for both sequences.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_component: AtomicU64::new(1),
            next_variant: AtomicU64::new(1),
        }
    }

    /// Next component state id.
    pub fn next_component_id(&self) -> u64 {
        self.next_component.fetch_add(1, Ordering::Relaxed)
    }

    /// Next variant state id.
    pub fn next_variant_id(&self) -> u64 {
        self.next_variant.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}
