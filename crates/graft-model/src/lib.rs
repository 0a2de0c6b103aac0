//! # graft-model
//!
//! Metadata describing components and their variants, and the long-lived
//! state the resolution engine memoizes per component.
//!
//! Handles:
//! - **Metadata**: variants, dependencies, artifacts, and live configuration state.
//! - **Factories**: eager (realized) and lazy (configuration-backed) variant sources.
//! - **State**: thread-safe component graph state with `reevaluate` and `copy`.
//! - **Registry**: the build-tree cache of component states.
//! - **Repository**: the external module metadata capability consumed by the engine.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod artifact;
pub mod candidates;
pub mod configuration;
pub mod dependency;
pub mod factory;
pub mod ids;
pub mod lazy;
pub mod registry;
pub mod repository;
pub mod state;
pub mod variant;
pub mod verifier;
