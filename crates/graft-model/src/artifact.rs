//! Artifacts published by variants and the transformation applied to them
//! when a component is copied under another identity.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

fn default_extension() -> String {
    "jar".to_string()
}

/// A file published by a variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactMetadata {
    /// Base name of the artifact.
    pub name: String,
    /// File extension.
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Optional classifier, e.g. `sources`.
    #[serde(default)]
    pub classifier: Option<String>,
    /// Location of the file, when already known.
    #[serde(default)]
    pub path: Option<String>,
}

impl ArtifactMetadata {
    /// Creates an artifact with the default `jar` extension.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extension: default_extension(),
            classifier: None,
            path: None,
        }
    }

    /// Sets the location of the file.
    #[must_use]
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Returns `name[-classifier].extension`.
    #[must_use]
    pub fn file_name(&self) -> String {
        match &self.classifier {
            Some(c) => format!("{}-{c}.{}", self.name, self.extension),
            None => format!("{}.{}", self.name, self.extension),
        }
    }
}

impl fmt::Display for ArtifactMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.file_name())
    }
}

type TransformFn = dyn Fn(&ArtifactMetadata) -> ArtifactMetadata + Send + Sync;

/// Memoizing artifact transformation.
///
/// An artifact may appear in several variants of a component; each distinct
/// artifact is transformed once per transformer.
pub struct ArtifactTransformer {
    transform: Arc<TransformFn>,
    memo: Mutex<HashMap<ArtifactMetadata, ArtifactMetadata>>,
}

impl ArtifactTransformer {
    /// Wraps a transformation function.
    pub fn new(
        transform: impl Fn(&ArtifactMetadata) -> ArtifactMetadata + Send + Sync + 'static,
    ) -> Self {
        Self {
            transform: Arc::new(transform),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Returns a transformer applying `self` first, then `next`.
    #[must_use]
    pub fn then(
        &self,
        next: impl Fn(&ArtifactMetadata) -> ArtifactMetadata + Send + Sync + 'static,
    ) -> Self {
        let first = Arc::clone(&self.transform);
        Self::new(move |artifact| next(&first(artifact)))
    }

    /// Transforms one artifact, reusing a previous result for the same input.
    pub fn apply(&self, artifact: &ArtifactMetadata) -> ArtifactMetadata {
        if let Some(done) = self.memo.lock().get(artifact) {
            return done.clone();
        }
        let transformed = (self.transform)(artifact);
        self.memo
            .lock()
            .entry(artifact.clone())
            .or_insert(transformed)
            .clone()
    }

    /// Number of distinct artifacts transformed so far.
    pub fn transformed_count(&self) -> usize {
        self.memo.lock().len()
    }
}

impl fmt::Debug for ArtifactTransformer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactTransformer")
            .field("transformed", &self.transformed_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn file_name_includes_classifier() {
        let mut artifact = ArtifactMetadata::new("lib");
        assert_eq!(artifact.file_name(), "lib.jar");
        artifact.classifier = Some("sources".into());
        assert_eq!(artifact.file_name(), "lib-sources.jar");
    }

    #[test]
    fn transformer_memoizes_per_artifact() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let transformer = ArtifactTransformer::new(move |a| {
            let _ = counter.fetch_add(1, Ordering::SeqCst);
            a.clone().at(format!("/out/{}", a.file_name()))
        });

        let artifact = ArtifactMetadata::new("lib");
        let first = transformer.apply(&artifact);
        let second = transformer.apply(&artifact);
        assert_eq!(first, second);
        assert_eq!(first.path.as_deref(), Some("/out/lib.jar"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(transformer.transformed_count(), 1);
    }

    #[test]
    fn chained_transformers_compose_in_order() {
        let base = ArtifactTransformer::new(|a| a.clone().at("/a"));
        let chained = base.then(|a| {
            let mut out = a.clone();
            out.path = a.path.as_ref().map(|p| format!("{p}/b"));
            out
        });
        let result = chained.apply(&ArtifactMetadata::new("x"));
        assert_eq!(result.path.as_deref(), Some("/a/b"));
    }
}
