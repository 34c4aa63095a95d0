// Copyright 2025 HWBench Contributors
// SPDX-License-Identifier: Apache-2.0

//! Model artifact cache.
//!
//! Inference benchmarks need an exported model file per requested model. The
//! hub is opaque to the benchmark: it is asked for a model and either returns
//! a path to a usable artifact or an error.

use std::path::PathBuf;

use thiserror::Error;
use tracing::debug;

/// Errors that can occur while fetching a model artifact.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelHubError {
    /// The model is not present in the cache and cannot be produced.
    #[error("Model {model} is not cached at {path}")]
    NotCached {
        /// Requested model identifier.
        model: String,
        /// Path that was checked.
        path: PathBuf,
    },

    /// The identifier cannot name a cache entry.
    #[error("Invalid model identifier: {0:?}")]
    InvalidIdentifier(String),
}

/// Get-or-fetch access to exported models.
pub trait ModelHub: Send + Sync {
    /// Return the path of the artifact for `model` exported with `batch_size`.
    fn fetch(&self, model: &str, batch_size: u32) -> Result<PathBuf, ModelHubError>;
}

/// Directory of pre-exported ONNX models named `<model>.onnx`.
#[derive(Debug, Clone)]
pub struct OnnxModelCache {
    root: PathBuf,
}

impl OnnxModelCache {
    /// Cache rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ModelHub for OnnxModelCache {
    fn fetch(&self, model: &str, batch_size: u32) -> Result<PathBuf, ModelHubError> {
        if model.is_empty() || model.contains(['/', '\\']) || model.starts_with('.') {
            return Err(ModelHubError::InvalidIdentifier(model.to_string()));
        }

        let path = self.root.join(format!("{}.onnx", model));
        if path.is_file() {
            debug!(model, batch_size, path = %path.display(), "Model cache hit");
            Ok(path)
        } else {
            Err(ModelHubError::NotCached {
                model: model.to_string(),
                path,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_model_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("resnet50.onnx"), b"onnx").unwrap();

        let cache = OnnxModelCache::new(dir.path());
        assert_eq!(
            cache.fetch("resnet50", 32).unwrap(),
            dir.path().join("resnet50.onnx")
        );
    }

    #[test]
    fn test_missing_model_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let cache = OnnxModelCache::new(dir.path());

        let err = cache.fetch("vgg11", 32).unwrap_err();
        assert!(matches!(err, ModelHubError::NotCached { ref model, .. } if model == "vgg11"));
    }

    #[test]
    fn test_path_like_identifiers_are_rejected() {
        let cache = OnnxModelCache::new("/tmp");
        assert_eq!(
            cache.fetch("../etc/passwd", 1),
            Err(ModelHubError::InvalidIdentifier("../etc/passwd".to_string()))
        );
    }
}
