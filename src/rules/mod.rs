//! Rewrite rules derived from the merged manifest and the rewriter applying them.

mod builder;
mod rewrite;

use std::borrow::Cow;

use regex::{Captures, NoExpand, Regex};

pub use builder::RuleBuilder;
pub use rewrite::Rewriter;

/// Text substituted for every match of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
  /// Inserted verbatim; `$` carries no meaning.
  Literal(String),
  /// Re-emit the captured reference context (group 1), then the value.
  AfterContext(String),
}

/// Compiled pattern plus its replacement and ordering key.
#[derive(Debug, Clone)]
pub struct RewriteRule {
  pattern: Regex,
  sort_key: usize,
  replacement: Replacement,
}

impl RewriteRule {
  /// Assemble a rule from an already compiled pattern.
  pub fn new(pattern: Regex, sort_key: usize, replacement: Replacement) -> Self {
    Self {
      pattern,
      sort_key,
      replacement,
    }
  }

  /// Length of the undecorated asset pattern; longer keys are applied first.
  pub fn sort_key(&self) -> usize {
    self.sort_key
  }

  /// Compiled pattern.
  pub fn pattern(&self) -> &Regex {
    &self.pattern
  }

  /// Replacement applied to each match.
  pub fn replacement(&self) -> &Replacement {
    &self.replacement
  }

  /// Replace every match in `text`.
  pub fn apply<'t>(&self, text: &'t str) -> Cow<'t, str> {
    match &self.replacement {
      Replacement::Literal(value) => self.pattern.replace_all(text, NoExpand(value)),
      Replacement::AfterContext(value) => self.pattern.replace_all(text, |caps: &Captures| {
        let context = caps.get(1).map_or("", |m| m.as_str());
        format!("{context}{value}")
      }),
    }
  }
}
