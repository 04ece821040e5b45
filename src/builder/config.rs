//! Build configuration
//!
//! A `BuildConfig` is an immutable value handed to the builder at construction.
//! It can be written inline or read from YAML:
//!
//! ```yaml
//! policy:
//!   kind: knn
//!   k: 10
//! measure: cosine
//! tile_size: 512
//! workers: 8
//! ```

use super::{BuildError, BuildResult};
use crate::graph::SimilarityMeasure;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Default number of embedding rows scored per tile
pub const DEFAULT_TILE_SIZE: usize = 256;

/// Which pairs survive construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PolicyConfig {
    /// Keep every pair whose similarity is strictly above `tau`
    Threshold { tau: f32 },
    /// Keep each document's `k` most similar documents
    Knn { k: usize },
}

impl fmt::Display for PolicyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyConfig::Threshold { tau } => write!(f, "threshold(tau={})", tau),
            PolicyConfig::Knn { k } => write!(f, "knn(k={})", k),
        }
    }
}

/// Graph construction settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    pub policy: PolicyConfig,
    pub measure: SimilarityMeasure,
    /// Embedding rows per tile; bounds peak score memory to `tile_size * n` floats per worker
    pub tile_size: usize,
    /// Worker threads; `None` uses the global rayon pool
    pub workers: Option<usize>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::Threshold { tau: 0.9 },
            measure: SimilarityMeasure::Cosine,
            tile_size: DEFAULT_TILE_SIZE,
            workers: None,
        }
    }
}

impl BuildConfig {
    /// Dense-thresholded construction with cosine weights
    pub fn threshold(tau: f32) -> Self {
        Self {
            policy: PolicyConfig::Threshold { tau },
            ..Default::default()
        }
    }

    /// Sparse kNN construction with cosine weights
    pub fn knn(k: usize) -> Self {
        Self {
            policy: PolicyConfig::Knn { k },
            ..Default::default()
        }
    }

    pub fn with_measure(mut self, measure: SimilarityMeasure) -> Self {
        self.measure = measure;
        self
    }

    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Check every parameter before any work starts
    pub fn validate(&self) -> BuildResult<()> {
        match self.policy {
            PolicyConfig::Threshold { tau } => {
                if !self.measure.accepts_threshold(tau) {
                    return Err(BuildError::InvalidThreshold {
                        tau,
                        measure: self.measure,
                    });
                }
            }
            PolicyConfig::Knn { k } => {
                if k == 0 {
                    return Err(BuildError::InvalidParameter("k must be positive".to_string()));
                }
            }
        }
        if self.tile_size == 0 {
            return Err(BuildError::InvalidParameter("tile_size must be positive".to_string()));
        }
        if self.workers == Some(0) {
            return Err(BuildError::InvalidParameter("workers must be positive".to_string()));
        }
        Ok(())
    }

    /// Parse and validate a YAML document
    pub fn from_yaml_str(yaml: &str) -> BuildResult<Self> {
        let config: BuildConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> BuildResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = BuildConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(config.measure, SimilarityMeasure::Cosine);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            BuildConfig::threshold(1.5).validate(),
            Err(BuildError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            BuildConfig::threshold(f32::NAN).validate(),
            Err(BuildError::InvalidThreshold { .. })
        ));
        assert!(BuildConfig::threshold(9.5)
            .with_measure(SimilarityMeasure::DotProduct)
            .validate()
            .is_ok());
        assert!(matches!(
            BuildConfig::knn(0).validate(),
            Err(BuildError::InvalidParameter(_))
        ));
        assert!(BuildConfig::knn(3).with_tile_size(0).validate().is_err());
        assert!(BuildConfig::knn(3).with_workers(0).validate().is_err());
    }

    #[test]
    fn test_from_yaml() {
        let config = BuildConfig::from_yaml_str(
            "policy:\n  kind: knn\n  k: 10\nmeasure: dot_product\nworkers: 4\n",
        )
        .unwrap();
        assert_eq!(config.policy, PolicyConfig::Knn { k: 10 });
        assert_eq!(config.measure, SimilarityMeasure::DotProduct);
        assert_eq!(config.workers, Some(4));
        assert_eq!(config.tile_size, DEFAULT_TILE_SIZE);
    }

    #[test]
    fn test_from_yaml_rejects_invalid() {
        assert!(BuildConfig::from_yaml_str("policy:\n  kind: threshold\n  tau: 2.0\n").is_err());
        assert!(matches!(
            BuildConfig::from_yaml_str("policy: [unclosed"),
            Err(BuildError::Config(_))
        ));
    }

    #[test]
    fn test_policy_display() {
        assert_eq!(PolicyConfig::Knn { k: 10 }.to_string(), "knn(k=10)");
        assert_eq!(PolicyConfig::Threshold { tau: 0.5 }.to_string(), "threshold(tau=0.5)");
    }
}
