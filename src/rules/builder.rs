//! Derive rewrite rules from a merged manifest.

use regex::Regex;
use tracing::debug;

use crate::config::CollectorOptions;
use crate::error::{CollectorError, Result};
use crate::models::{DirReplacement, DirTarget, Manifest};
use crate::pattern::{basename, close_dir, dirname, escape_pattern, split_extension};
use crate::rules::{Replacement, RewriteRule};

/// Reference context accepted before an asset path when no directory redirects are configured:
/// an attribute assignment (`="`) or a `url(` wrapper, then any path-shaped prefix.
const REFERENCE_CONTEXT: &str = r#"(="|url\(['"]*)[/.\w]*"#;

/// Builds one or more rules per manifest entry according to the collector options.
pub struct RuleBuilder<'a> {
  options: &'a CollectorOptions,
}

impl<'a> RuleBuilder<'a> {
  /// Builder for the given options.
  pub fn new(options: &'a CollectorOptions) -> Self {
    Self { options }
  }

  /// Generate rules for every entry, in manifest order. The result is not sorted.
  pub fn build(&self, manifest: &Manifest) -> Result<Vec<RewriteRule>> {
    let mut rules = Vec::new();
    for (key, value) in manifest.iter() {
      if self.options.dir_replacements.is_empty() {
        self.push_context_rules(key, value, &mut rules)?;
      } else {
        for dir in &self.options.dir_replacements {
          self.push_dir_rules(dir, key, value, &mut rules)?;
        }
      }
    }

    debug!(
      entries = manifest.len(),
      rules = rules.len(),
      replace_reved = self.options.replace_reved,
      "built rewrite rules"
    );
    Ok(rules)
  }

  /// Undecorated patterns for `key`: the literal path, then the fuzzy reved form if enabled.
  fn core_patterns(&self, key: &str) -> Vec<String> {
    let mut patterns = vec![escape_pattern(key)];
    if self.options.replace_reved {
      patterns.push(self.reved_pattern(key));
    }
    patterns
  }

  /// Pattern matching `key` with an optional fingerprint after every dotted stem segment.
  fn reved_pattern(&self, key: &str) -> String {
    let (stem, extension) = split_extension(basename(key));

    let extension_pattern = match self.options.ext_map.get(extension) {
      Some(mapped) if !extension.is_empty() => format!(
        "({}|{})",
        escape_pattern(extension),
        escape_pattern(mapped)
      ),
      _ => escape_pattern(extension),
    };

    let stem_pattern = stem
      .split('.')
      .map(|part| format!("{}({})?", escape_pattern(part), self.options.rev_suffix))
      .collect::<Vec<_>>()
      .join(r"\.");

    format!(
      "{}{}{}",
      escape_pattern(&close_dir(dirname(key))),
      stem_pattern,
      extension_pattern
    )
  }

  fn push_context_rules(&self, key: &str, value: &str, rules: &mut Vec<RewriteRule>) -> Result<()> {
    let query = format!(r"(\?{}=\w{{10}})?", escape_pattern(&self.options.remark));
    for core in self.core_patterns(key) {
      let pattern = format!("{REFERENCE_CONTEXT}{core}{query}");
      rules.push(RewriteRule::new(
        compile(pattern)?,
        core.len(),
        Replacement::AfterContext(value.to_string()),
      ));
    }
    Ok(())
  }

  fn push_dir_rules(
    &self,
    dir: &DirReplacement,
    key: &str,
    value: &str,
    rules: &mut Vec<RewriteRule>,
  ) -> Result<()> {
    let source_dir = close_dir(&dir.source_dir);

    // Keys recorded under the source directory match relative to it.
    let (scoped_key, scoped_value) = match key.strip_prefix(source_dir.as_str()) {
      Some(rest) if !source_dir.is_empty() && !rest.is_empty() => (
        rest,
        value.strip_prefix(source_dir.as_str()).unwrap_or(value),
      ),
      _ => (key, value),
    };

    let replacement = match &dir.target {
      DirTarget::Literal(prefix) => format!("{}{}", close_dir(prefix), scoped_value),
      DirTarget::Computed(replace) => {
        replace(scoped_value).map_err(|source| CollectorError::DirReplacement {
          source_dir: dir.source_dir.clone(),
          source,
        })?
      }
    };

    let sort_keys = self.core_patterns(key).into_iter().map(|core| core.len());
    let dir_pattern = escape_pattern(&source_dir);
    for (core, sort_key) in self.core_patterns(scoped_key).into_iter().zip(sort_keys) {
      rules.push(RewriteRule::new(
        compile(format!("{dir_pattern}{core}"))?,
        sort_key,
        Replacement::Literal(replacement.clone()),
      ));
    }
    Ok(())
  }
}

fn compile(pattern: String) -> Result<Regex> {
  Regex::new(&pattern).map_err(|source| CollectorError::InvalidPattern { pattern, source })
}
