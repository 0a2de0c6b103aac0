//! # graft-engine
//!
//! The dependency graph resolution engine.
//!
//! Handles:
//! - **Strategy**: the immutable per-resolution strategy (conflict mode,
//!   substitutions, module replacements, forced versions).
//! - **Conflict**: module version and capability conflict handlers.
//! - **Resolver**: the chain of component resolvers locating projects and
//!   external modules.
//! - **Graph**: the graph builder, the resolved graph, and graph visitors.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod conflict;
pub mod context;
pub mod graph;
pub mod reason;
pub mod resolver;
pub mod strategy;
