//! Ordered application of rewrite rules to file contents.

use std::borrow::Cow;

use crate::rules::RewriteRule;

/// Applies rules longest-pattern-first so `script.js.map` wins over `script.js`.
#[derive(Debug, Clone, Default)]
pub struct Rewriter {
  rules: Vec<RewriteRule>,
}

impl Rewriter {
  /// Sort `rules` by descending sort key. Equal keys keep their build order.
  pub fn new(mut rules: Vec<RewriteRule>) -> Self {
    rules.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    Self { rules }
  }

  /// Rules in application order.
  pub fn rules(&self) -> &[RewriteRule] {
    &self.rules
  }

  /// Number of rules.
  pub fn len(&self) -> usize {
    self.rules.len()
  }

  /// Whether there is nothing to apply.
  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  /// Feed `content` through every rule in order and return the result.
  pub fn rewrite(&self, content: &str) -> String {
    let mut text = content.to_string();
    for rule in &self.rules {
      let updated = match rule.apply(&text) {
        Cow::Owned(updated) => Some(updated),
        Cow::Borrowed(_) => None,
      };
      if let Some(updated) = updated {
        text = updated;
      }
    }
    text
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::rules::Replacement;
  use regex::Regex;

  fn literal(pattern: &str, sort_key: usize, value: &str) -> RewriteRule {
    RewriteRule::new(
      Regex::new(pattern).unwrap(),
      sort_key,
      Replacement::Literal(value.into()),
    )
  }

  #[test]
  fn orders_rules_by_descending_sort_key() {
    let rewriter = Rewriter::new(vec![
      literal("a", 1, "x"),
      literal("abc", 3, "y"),
      literal("b", 1, "z"),
    ]);
    let keys: Vec<_> = rewriter.rules().iter().map(|rule| rule.pattern().as_str()).collect();
    assert_eq!(keys, vec!["abc", "a", "b"]);
  }

  #[test]
  fn feeds_each_rule_the_previous_output() {
    let rewriter = Rewriter::new(vec![literal("one", 3, "two"), literal("two", 2, "three")]);
    assert_eq!(rewriter.rewrite("one two"), "three three");
  }

  #[test]
  fn empty_rewriter_returns_input() {
    let rewriter = Rewriter::default();
    assert!(rewriter.is_empty());
    assert_eq!(rewriter.rewrite("unchanged"), "unchanged");
  }
}
