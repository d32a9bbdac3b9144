//! Error type shared by the collection and flush phases.

use std::path::PathBuf;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T, E = CollectorError> = std::result::Result<T, E>;

/// Failures that abort a collector run.
#[derive(Debug, Error)]
pub enum CollectorError {
  /// A `.json` input could not be parsed. The run stops; the file is not demoted to content.
  #[error("failed to parse JSON in {}", path.display())]
  ManifestParse {
    /// Path of the offending record.
    path: PathBuf,
    /// Underlying parser error.
    #[source]
    source: serde_json::Error,
  },

  /// A generated rewrite pattern did not compile, usually because of a bad `revSuffix`.
  #[error("invalid rewrite pattern `{pattern}`")]
  InvalidPattern {
    /// Pattern text handed to the regex engine.
    pattern: String,
    /// Compilation error.
    #[source]
    source: regex::Error,
  },

  /// A computed directory replacement failed for a manifest value.
  #[error("directory replacement for `{source_dir}` failed")]
  DirReplacement {
    /// Source directory of the failing replacement.
    source_dir: String,
    /// Error returned by the replacement function.
    #[source]
    source: anyhow::Error,
  },

  /// The merged manifest could not be serialised.
  #[error("failed to serialise collected manifest")]
  Serialize(#[source] serde_json::Error),
}
