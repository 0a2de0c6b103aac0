//! # graft-common
//!
//! Shared identifiers, version handling, attributes, capabilities, error
//! definitions, and configuration models used across the graft workspace.
//!
//! This crate is the leaf of the dependency graph: it depends on no other
//! internal crate and provides the primitives the model and engine crates
//! build upon.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod attributes;
pub mod capability;
pub mod config;
pub mod constants;
pub mod error;
pub mod selector;
pub mod types;
pub mod version;
