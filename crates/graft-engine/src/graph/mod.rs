//! Dependency graph construction and consumption.

pub mod builder;
pub mod result;
mod state;
pub mod visitor;

pub use builder::DependencyGraphBuilder;
pub use result::{ResolvedEdge, ResolvedGraph, ResolvedNode};
pub use visitor::{
    BuildOperationVisitor, CompositeDependencyGraphVisitor, DependencyGraphVisitor,
    ResolutionEvent, ResolvedArtifact, ResolvedArtifactsGraphVisitor, SerializingGraphVisitor,
};
