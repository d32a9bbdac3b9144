//! Path and pattern helpers shared by manifest classification and rule building.

use crate::models::ExtensionMap;

/// Escape a string so it matches literally inside a regular expression.
pub fn escape_pattern(value: &str) -> String {
  regex::escape(value)
}

/// Apply every extension substitution in table order.
///
/// Each entry only matches at the end of the current name, and later entries see the output
/// of earlier ones, so `a.x` with `.x -> .y` and `.y -> .z` ends up as `a.z`.
pub fn map_extension(name: &str, ext_map: &ExtensionMap) -> String {
  let mut mapped = name.to_string();
  for (from, to) in ext_map.iter() {
    if from.is_empty() {
      continue;
    }
    if let Some(stem) = mapped.strip_suffix(from) {
      mapped = format!("{stem}{to}");
    }
  }
  mapped
}

/// Append a trailing `/` to a non-empty directory that lacks one.
pub fn close_dir(dir: &str) -> String {
  if dir.is_empty() || dir.ends_with('/') {
    dir.to_string()
  } else {
    format!("{dir}/")
  }
}

/// Last path segment, ignoring trailing separators.
pub fn basename(path: &str) -> &str {
  let trimmed = path.trim_end_matches('/');
  match trimmed.rfind('/') {
    Some(index) => &trimmed[index + 1..],
    None => trimmed,
  }
}

/// Directory part of a path without its trailing separator, or `""` when there is none.
pub fn dirname(path: &str) -> &str {
  let trimmed = path.trim_end_matches('/');
  match trimmed.rfind('/') {
    Some(0) => "/",
    Some(index) => &trimmed[..index],
    None => "",
  }
}

/// Split a file name into stem and extension (including the dot).
///
/// A leading dot does not start an extension, so `.htaccess` has none.
pub fn split_extension(file_name: &str) -> (&str, &str) {
  match file_name.rfind('.') {
    Some(index) if index > 0 && !file_name[..index].chars().all(|c| c == '.') => {
      file_name.split_at(index)
    }
    _ => (file_name, ""),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn escapes_regex_metacharacters() {
    let escaped = escape_pattern("css/app.min.css?v=(1)");
    let re = regex::Regex::new(&format!("^{escaped}$")).unwrap();
    assert!(re.is_match("css/app.min.css?v=(1)"));
    assert!(!re.is_match("css/appXminXcss?v=(1)"));
  }

  #[test]
  fn maps_extensions_at_end_only() {
    let map = ExtensionMap::default();
    assert_eq!(map_extension("styles/app.scss", &map), "styles/app.css");
    assert_eq!(map_extension("view.jsx", &map), "view.js");
    assert_eq!(map_extension("app.scss.map", &map), "app.scss.map");
    assert_eq!(map_extension("image.png", &map), "image.png");
  }

  #[test]
  fn chains_extension_mappings() {
    let map = ExtensionMap::from_pairs([(".ts", ".jsx"), (".jsx", ".js")]);
    assert_eq!(map_extension("main.ts", &map), "main.js");
  }

  #[test]
  fn splits_paths_like_a_posix_host() {
    assert_eq!(basename("a/b/c.js"), "c.js");
    assert_eq!(basename("c.js"), "c.js");
    assert_eq!(basename("a/b/"), "b");
    assert_eq!(dirname("a/b/c.js"), "a/b");
    assert_eq!(dirname("c.js"), "");
    assert_eq!(dirname("/c.js"), "/");
    assert_eq!(split_extension("script.js.map"), ("script.js", ".map"));
    assert_eq!(split_extension(".htaccess"), (".htaccess", ""));
    assert_eq!(split_extension("LICENSE"), ("LICENSE", ""));
  }

  #[test]
  fn closes_directories() {
    assert_eq!(close_dir(""), "");
    assert_eq!(close_dir("dist"), "dist/");
    assert_eq!(close_dir("dist/"), "dist/");
  }
}
