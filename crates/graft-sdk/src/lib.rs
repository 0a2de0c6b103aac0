//! # graft-sdk
//!
//! Public SDK for using graft as a Rust library.
//!
//! Provides three main entry points:
//! - [`BuildDescription`](description::BuildDescription): Declarative model of a build, its projects, and the modules it can reach, loaded from YAML or JSON.
//! - [`ResolutionSession`](session::ResolutionSession): Resolves project configurations into dependency graphs, one at a time or in parallel.
//! - [`ResolutionReport`](report::ResolutionReport): Serializable summary of a resolved graph.
//!
//! # Example
//!
//! ```rust,no_run
//! use graft_sdk::description::BuildDescription;
//! use graft_sdk::session::ResolutionSession;
//!
//! let description = BuildDescription::load(std::path::Path::new("graft.yaml"))?;
//! let session = ResolutionSession::from_description(&description)?;
//! let graph = session.resolve(":app", "runtimeClasspath")?;
//! # Ok::<(), graft_common::error::GraftError>(())
//! ```

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod description;
pub mod report;
pub mod session;
