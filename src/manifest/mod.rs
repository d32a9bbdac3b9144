//! Manifest detection and merging, split into focused submodules for easier testing.

mod classify;
mod merge;

pub use classify::{Classification, classify};
pub use merge::ManifestMerger;
