//! Merging manifests and synthesising extension-mapped aliases.

use crate::models::{ExtensionMap, Manifest};
use crate::pattern::map_extension;

/// Accumulates manifests in arrival order; later entries win.
#[derive(Debug, Default)]
pub struct ManifestMerger {
    merged: Manifest,
    sources: usize,
}

impl ManifestMerger {
    /// Start with an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Shallow-merge `manifest` into the accumulated mapping.
    pub fn merge(&mut self, manifest: Manifest) {
        for (original, fingerprinted) in manifest.iter() {
            self.merged.insert(original, fingerprinted);
        }
        self.sources += 1;
    }

    /// Number of manifests merged so far.
    pub fn sources(&self) -> usize {
        self.sources
    }

    /// Hand over the merged mapping.
    pub fn finish(self) -> Manifest {
        self.merged
    }
}

impl Manifest {
    /// Add `mapped key -> mapped value` for every key whose extension maps to something new.
    ///
    /// Existing keys are never overwritten, so an explicit `app.css` entry beats the alias
    /// derived from `app.scss`.
    pub fn with_extension_aliases(mut self, ext_map: &ExtensionMap) -> Self {
        let snapshot: Vec<(String, String)> = self
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();

        for (key, value) in snapshot {
            let mapped_key = map_extension(&key, ext_map);
            if mapped_key != key && !self.contains_key(&mapped_key) {
                let mapped_value = map_extension(&value, ext_map);
                self.insert(mapped_key, mapped_value);
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest(pairs: &[(&str, &str)]) -> Manifest {
        pairs.iter().copied().collect()
    }

    #[test]
    fn later_manifests_win() {
        let mut merger = ManifestMerger::new();
        merger.merge(manifest(&[("a.js", "a-111.js")]));
        merger.merge(manifest(&[("a.js", "a-222.js")]));

        assert_eq!(merger.sources(), 2);
        let merged = merger.finish();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged.get("a.js"), Some("a-222.js"));
    }

    #[test]
    fn adds_extension_aliases() {
        let merged = manifest(&[("app.scss", "app-abc123.css")])
            .with_extension_aliases(&ExtensionMap::default());

        assert_eq!(merged.get("app.scss"), Some("app-abc123.css"));
        assert_eq!(merged.get("app.css"), Some("app-abc123.css"));
    }

    #[test]
    fn aliases_map_the_value_too() {
        let merged = manifest(&[("view.jsx", "view.jsx?v=0123456789")])
            .with_extension_aliases(&ExtensionMap::default());
        assert_eq!(merged.get("view.js"), Some("view.jsx?v=0123456789"));

        let merged = manifest(&[("theme.less", "theme-77.less")])
            .with_extension_aliases(&ExtensionMap::default());
        assert_eq!(merged.get("theme.css"), Some("theme-77.css"));
    }

    #[test]
    fn explicit_entries_beat_aliases() {
        let merged = manifest(&[("app.scss", "app-1.css"), ("app.css", "app-2.css")])
            .with_extension_aliases(&ExtensionMap::default());

        assert_eq!(merged.len(), 2);
        assert_eq!(merged.get("app.css"), Some("app-2.css"));
    }

    #[test]
    fn first_alias_wins_between_sources() {
        let merged = manifest(&[("app.scss", "app-1.css"), ("app.less", "app-2.css")])
            .with_extension_aliases(&ExtensionMap::default());

        assert_eq!(merged.get("app.css"), Some("app-1.css"));
        let keys: Vec<_> = merged.iter().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["app.scss", "app.less", "app.css"]);
    }
}
