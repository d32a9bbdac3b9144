//! Collector options and the JSON configuration file that feeds them.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use crate::models::{DirReplacement, ExtensionMap};

const DEFAULT_CONFIG_FILE: &str = "rev-collector.config.json";

/// Fingerprint token accepted after each file name segment when matching reved references.
pub const DEFAULT_REV_SUFFIX: &str = "-?[0-9a-f]{8,10}-?";

/// Query parameter carrying cache-busting tokens.
pub const DEFAULT_REMARK: &str = "v";

/// Runtime options for a collector run.
#[derive(Debug, Clone)]
pub struct CollectorOptions {
  /// Regex fragment matching a fingerprint token appended to a file name segment.
  pub rev_suffix: String,
  /// Extension substitutions used for classification, aliasing and fuzzy matching.
  pub ext_map: ExtensionMap,
  /// Directory redirects; when non-empty only references under these directories are rewritten.
  pub dir_replacements: Vec<DirReplacement>,
  /// Output path for the merged manifest, if it should be emitted.
  pub collected_manifest: Option<PathBuf>,
  /// Also rewrite references that already point at a fingerprinted name.
  pub replace_reved: bool,
  /// Query parameter name stripped from rewritten references.
  pub remark: String,
}

impl Default for CollectorOptions {
  fn default() -> Self {
    Self {
      rev_suffix: DEFAULT_REV_SUFFIX.into(),
      ext_map: ExtensionMap::default(),
      dir_replacements: Vec::new(),
      collected_manifest: None,
      replace_reved: false,
      remark: DEFAULT_REMARK.into(),
    }
  }
}

impl CollectorOptions {
  /// Add a directory redirect.
  pub fn with_dir_replacement(mut self, replacement: DirReplacement) -> Self {
    self.dir_replacements.push(replacement);
    self
  }

  /// Enable or disable matching of already fingerprinted references.
  pub fn with_replace_reved(mut self, enabled: bool) -> Self {
    self.replace_reved = enabled;
    self
  }

  /// Emit the merged manifest at `path`.
  pub fn with_collected_manifest(mut self, path: impl Into<PathBuf>) -> Self {
    self.collected_manifest = Some(path.into());
    self
  }
}

/// On-disk configuration mirroring [`CollectorOptions`] with camelCase keys.
///
/// `extMap` and `dirReplacements` must be objects of strings; anything else is skipped with a
/// warning so a sloppy config never aborts a build.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CollectorConfig {
  /// Override for [`DEFAULT_REV_SUFFIX`].
  pub rev_suffix: Option<String>,
  /// Entries merged over the default extension table.
  #[serde(deserialize_with = "lenient_string_table")]
  pub ext_map: Vec<(String, String)>,
  /// Source directory to literal target prefix.
  #[serde(deserialize_with = "lenient_string_table")]
  pub dir_replacements: Vec<(String, String)>,
  /// Output path for the merged manifest.
  pub collected_manifest: Option<PathBuf>,
  /// Enable fuzzy matching of fingerprinted references.
  pub replace_reved: bool,
  /// Override for [`DEFAULT_REMARK`].
  pub remark: Option<String>,
}

impl CollectorConfig {
  /// Load `rev-collector.config.json` from `dir`, falling back to defaults.
  pub fn discover(dir: &Path) -> Self {
    let candidate = dir.join(DEFAULT_CONFIG_FILE);
    Self::from_path(&candidate).unwrap_or_default()
  }

  /// Read configuration from a specific JSON file.
  pub fn from_path(path: &Path) -> Option<Self> {
    let content = fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
      Ok(config) => Some(config),
      Err(err) => {
        warn!(path = %path.display(), error = %err, "ignoring malformed collector config");
        None
      }
    }
  }

  /// Convert into runtime options.
  pub fn into_options(self) -> CollectorOptions {
    let defaults = CollectorOptions::default();
    CollectorOptions {
      rev_suffix: self.rev_suffix.unwrap_or(defaults.rev_suffix),
      ext_map: ExtensionMap::with_overrides(self.ext_map),
      dir_replacements: self
        .dir_replacements
        .into_iter()
        .map(|(source_dir, target)| DirReplacement::literal(source_dir, target))
        .collect(),
      collected_manifest: self.collected_manifest,
      replace_reved: self.replace_reved,
      remark: self.remark.unwrap_or(defaults.remark),
    }
  }
}

fn lenient_string_table<'de, D>(deserializer: D) -> Result<Vec<(String, String)>, D::Error>
where
  D: Deserializer<'de>,
{
  let value = Value::deserialize(deserializer)?;
  Ok(string_table(&value))
}

fn string_table(value: &Value) -> Vec<(String, String)> {
  let Value::Object(object) = value else {
    if !value.is_null() {
      warn!(value = %value, "ignoring non-object table in collector config");
    }
    return Vec::new();
  };

  object
    .iter()
    .filter_map(|(key, entry)| match entry.as_str() {
      Some(target) => Some((key.clone(), target.to_string())),
      None => {
        warn!(key = %key, "ignoring non-string entry in collector config");
        None
      }
    })
    .collect()
}
