//! Shared data structures for manifests, file records and rewrite configuration.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};

/// Single original → fingerprinted mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
  /// Path as referenced by authored sources.
  pub original: String,
  /// Path of the fingerprinted artifact.
  pub fingerprinted: String,
}

/// Insertion-ordered mapping from original asset paths to fingerprinted paths.
///
/// Overwriting an existing key keeps the entry at its original position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
  entries: Vec<ManifestEntry>,
  index: HashMap<String, usize>,
}

impl Manifest {
  /// Create an empty manifest.
  pub fn new() -> Self {
    Self::default()
  }

  /// Insert or overwrite an entry, returning the previous fingerprinted value.
  pub fn insert(
    &mut self,
    original: impl Into<String>,
    fingerprinted: impl Into<String>,
  ) -> Option<String> {
    let original = original.into();
    let fingerprinted = fingerprinted.into();
    if let Some(&position) = self.index.get(&original) {
      let entry = &mut self.entries[position];
      return Some(std::mem::replace(&mut entry.fingerprinted, fingerprinted));
    }
    self.index.insert(original.clone(), self.entries.len());
    self.entries.push(ManifestEntry {
      original,
      fingerprinted,
    });
    None
  }

  /// Fingerprinted path recorded for `original`.
  pub fn get(&self, original: &str) -> Option<&str> {
    self
      .index
      .get(original)
      .map(|&position| self.entries[position].fingerprinted.as_str())
  }

  /// Whether an entry exists for `original`.
  pub fn contains_key(&self, original: &str) -> bool {
    self.index.contains_key(original)
  }

  /// Entries in insertion order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self
      .entries
      .iter()
      .map(|entry| (entry.original.as_str(), entry.fingerprinted.as_str()))
  }

  /// Number of entries.
  pub fn len(&self) -> usize {
    self.entries.len()
  }

  /// Whether the manifest has no entries.
  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    let mut manifest = Manifest::new();
    for (original, fingerprinted) in iter {
      manifest.insert(original, fingerprinted);
    }
    manifest
  }
}

impl Serialize for Manifest {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(self.entries.len()))?;
    for entry in &self.entries {
      map.serialize_entry(&entry.original, &entry.fingerprinted)?;
    }
    map.end()
  }
}

/// Ordered table of extension substitutions (`.scss` → `.css`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionMap {
  pairs: Vec<(String, String)>,
}

impl Default for ExtensionMap {
  fn default() -> Self {
    Self::from_pairs([(".scss", ".css"), (".less", ".css"), (".jsx", ".js")])
  }
}

impl ExtensionMap {
  /// Table containing exactly the provided pairs.
  pub fn from_pairs<I, F, T>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (F, T)>,
    F: Into<String>,
    T: Into<String>,
  {
    let mut map = Self { pairs: Vec::new() };
    for (from, to) in pairs {
      map.set(from, to);
    }
    map
  }

  /// Add or override a substitution. Overrides keep their position in the table.
  pub fn set(&mut self, from: impl Into<String>, to: impl Into<String>) {
    let from = from.into();
    let to = to.into();
    match self.pairs.iter_mut().find(|(existing, _)| *existing == from) {
      Some((_, target)) => *target = to,
      None => self.pairs.push((from, to)),
    }
  }

  /// Default table extended with caller entries.
  pub fn with_overrides<I, F, T>(overrides: I) -> Self
  where
    I: IntoIterator<Item = (F, T)>,
    F: Into<String>,
    T: Into<String>,
  {
    let mut map = Self::default();
    for (from, to) in overrides {
      map.set(from, to);
    }
    map
  }

  /// Target extension for `from`, if configured.
  pub fn get(&self, from: &str) -> Option<&str> {
    self
      .pairs
      .iter()
      .find(|(existing, _)| existing == from)
      .map(|(_, to)| to.as_str())
  }

  /// Substitutions in table order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.pairs.iter().map(|(from, to)| (from.as_str(), to.as_str()))
  }
}

/// Function computing a replacement from a fingerprinted value.
pub type ReplaceFn = Arc<dyn Fn(&str) -> anyhow::Result<String> + Send + Sync>;

/// Where references under a source directory are redirected to.
#[derive(Clone)]
pub enum DirTarget {
  /// Literal directory prefix placed before the fingerprinted value.
  Literal(String),
  /// Function producing the full replacement from the fingerprinted value.
  Computed(ReplaceFn),
}

impl DirTarget {
  /// Wrap a closure as a computed target.
  pub fn computed<F>(replace: F) -> Self
  where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
  {
    Self::Computed(Arc::new(replace))
  }
}

impl fmt::Debug for DirTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Literal(prefix) => f.debug_tuple("Literal").field(prefix).finish(),
      Self::Computed(_) => f.write_str("Computed(..)"),
    }
  }
}

/// Redirects matches found under `source_dir`.
#[derive(Debug, Clone)]
pub struct DirReplacement {
  /// Directory prefix matched in the rewritten content.
  pub source_dir: String,
  /// Replacement applied to matches under the directory.
  pub target: DirTarget,
}

impl DirReplacement {
  /// Redirect `source_dir` to a literal prefix.
  pub fn literal(source_dir: impl Into<String>, target: impl Into<String>) -> Self {
    Self {
      source_dir: source_dir.into(),
      target: DirTarget::Literal(target.into()),
    }
  }

  /// Redirect `source_dir` through a function of the fingerprinted value.
  pub fn computed<F>(source_dir: impl Into<String>, replace: F) -> Self
  where
    F: Fn(&str) -> anyhow::Result<String> + Send + Sync + 'static,
  {
    Self {
      source_dir: source_dir.into(),
      target: DirTarget::computed(replace),
    }
  }
}

/// File flowing through the collector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
  /// Path of the record, relative to whatever root the host chose.
  pub path: PathBuf,
  /// Raw contents; `None` marks a record without content.
  pub contents: Option<Vec<u8>>,
}

impl FileRecord {
  /// Record carrying the given contents.
  pub fn new(path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
    Self {
      path: path.into(),
      contents: Some(contents.into()),
    }
  }

  /// Record without contents (directories, placeholders).
  pub fn empty(path: impl Into<PathBuf>) -> Self {
    Self {
      path: path.into(),
      contents: None,
    }
  }

  /// Record path.
  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Contents as UTF-8 text, if present and valid.
  pub fn text(&self) -> Option<&str> {
    self
      .contents
      .as_deref()
      .and_then(|bytes| std::str::from_utf8(bytes).ok())
  }

  /// Whether the record carries a `.json` extension.
  pub fn is_json(&self) -> bool {
    self.path.extension().is_some_and(|ext| ext == "json")
  }
}
