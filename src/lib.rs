#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![allow(clippy::module_inception)]

pub mod collector;
pub mod config;
pub mod error;
pub mod host;
pub mod manifest;
pub mod models;
pub mod pattern;
pub mod rules;

pub use collector::{Collection, RevCollector};
pub use config::{CollectorConfig, CollectorOptions};
pub use error::{CollectorError, Result};
pub use manifest::{Classification, ManifestMerger, classify};
pub use models::{DirReplacement, DirTarget, ExtensionMap, FileRecord, Manifest, ManifestEntry};
pub use rules::{Replacement, RewriteRule, Rewriter, RuleBuilder};
