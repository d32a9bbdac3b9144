//! Structural check deciding whether a parsed JSON document is a rev manifest.

use serde_json::Value;

use crate::models::{ExtensionMap, Manifest};
use crate::pattern::{basename, map_extension};

/// Outcome of inspecting a JSON document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The document maps original paths to fingerprinted paths.
    Manifest(Manifest),
    /// Ordinary JSON that should be rewritten like any other text.
    Content,
}

impl Classification {
    /// Whether the document qualified as a manifest.
    pub fn is_manifest(&self) -> bool {
        matches!(self, Self::Manifest(_))
    }
}

/// Classify a document against the manifest shape.
///
/// Every value must be a string whose file name, with any `?query` removed, equals the key's
/// file name or the key's file name after extension mapping. One bad entry disqualifies the
/// whole document.
pub fn classify(document: &Value, ext_map: &ExtensionMap) -> Classification {
    let Value::Object(object) = document else {
        return Classification::Content;
    };

    let mut manifest = Manifest::new();
    for (key, value) in object {
        let Some(value) = value.as_str() else {
            return Classification::Content;
        };
        if !is_revision_of(key, value, ext_map) {
            return Classification::Content;
        }
        manifest.insert(key.as_str(), value);
    }

    Classification::Manifest(manifest)
}

fn is_revision_of(key: &str, value: &str, ext_map: &ExtensionMap) -> bool {
    let clean = basename(value).split('?').next().unwrap_or_default();
    let key_name = basename(key);
    clean == key_name || clean == map_extension(key_name, ext_map)
}
