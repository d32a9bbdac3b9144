//! Two-phase collector run: stream records in, then flush rewritten files out.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use serde_json::ser::PrettyFormatter;
use tracing::{debug, info};

use crate::config::CollectorOptions;
use crate::error::{CollectorError, Result};
use crate::manifest::{Classification, ManifestMerger, classify};
use crate::models::{FileRecord, Manifest};
use crate::rules::{Rewriter, RuleBuilder};

/// Entry point holding the options for one or more runs.
#[derive(Debug, Clone, Default)]
pub struct RevCollector {
  options: CollectorOptions,
}

impl RevCollector {
  /// Create a collector for the provided options.
  pub fn new(options: CollectorOptions) -> Self {
    Self { options }
  }

  /// Options used by every run.
  pub fn options(&self) -> &CollectorOptions {
    &self.options
  }

  /// Begin a run.
  pub fn start(&self) -> Collection<'_> {
    Collection {
      options: &self.options,
      merger: ManifestMerger::new(),
      mutables: Vec::new(),
    }
  }

  /// Run every record through a fresh collection.
  ///
  /// Pass-through records come first in arrival order, followed by the flush output.
  pub fn process<I>(&self, records: I) -> Result<Vec<FileRecord>>
  where
    I: IntoIterator<Item = FileRecord>,
  {
    let mut collection = self.start();
    let mut emitted = Vec::new();
    for record in records {
      if let Some(passed) = collection.collect(record)? {
        emitted.push(passed);
      }
    }
    emitted.extend(collection.flush()?);
    Ok(emitted)
  }
}

/// Text file waiting for the flush phase.
#[derive(Debug)]
struct MutableFile {
  path: PathBuf,
  text: String,
}

/// Accumulator for the collection phase of a single run.
///
/// Dropping it without calling [`Collection::flush`] emits nothing.
#[derive(Debug)]
pub struct Collection<'a> {
  options: &'a CollectorOptions,
  merger: ManifestMerger,
  mutables: Vec<MutableFile>,
}

impl Collection<'_> {
  /// Route one record.
  ///
  /// Records without contents, empty records and binary records are handed straight back.
  /// `.json` records that look like manifests are absorbed; everything else is buffered for
  /// rewriting. Unparseable `.json` aborts the run.
  pub fn collect(&mut self, record: FileRecord) -> Result<Option<FileRecord>> {
    let is_json = record.is_json();
    let FileRecord { path, contents } = record;

    let bytes = match contents {
      Some(bytes) if !bytes.is_empty() => bytes,
      contents => {
        debug!(path = %path.display(), "passing through record without contents");
        return Ok(Some(FileRecord { path, contents }));
      }
    };

    let text = match String::from_utf8(bytes) {
      Ok(text) => text,
      Err(err) => {
        debug!(path = %path.display(), "passing through binary record");
        return Ok(Some(FileRecord {
          path,
          contents: Some(err.into_bytes()),
        }));
      }
    };

    if is_json {
      let document: Value =
        serde_json::from_str(&text).map_err(|source| CollectorError::ManifestParse {
          path: path.clone(),
          source,
        })?;

      if let Classification::Manifest(manifest) = classify(&document, &self.options.ext_map) {
        debug!(path = %path.display(), entries = manifest.len(), "collected manifest");
        self.merger.merge(manifest);
        return Ok(None);
      }
      debug!(path = %path.display(), "json record is not a manifest");
    }

    self.mutables.push(MutableFile { path, text });
    Ok(None)
  }

  /// Number of manifests absorbed so far.
  pub fn manifest_count(&self) -> usize {
    self.merger.sources()
  }

  /// Number of files buffered for rewriting.
  pub fn pending_files(&self) -> usize {
    self.mutables.len()
  }

  /// Finish the run and return the emitted records.
  ///
  /// The merged manifest (when configured) comes first, serialised before extension aliases
  /// are added. Rewritten files follow in the order they were collected.
  pub fn flush(self) -> Result<Vec<FileRecord>> {
    let Collection {
      options,
      merger,
      mutables,
    } = self;

    let sources = merger.sources();
    let manifest = merger.finish();
    let mut emitted = Vec::with_capacity(mutables.len() + 1);

    if let Some(path) = &options.collected_manifest {
      emitted.push(manifest_record(path, &manifest)?);
    }

    let manifest = manifest.with_extension_aliases(&options.ext_map);
    let rewriter = Rewriter::new(RuleBuilder::new(options).build(&manifest)?);

    let files = mutables.len();
    for file in mutables {
      let rewritten = rewriter.rewrite(&file.text);
      emitted.push(FileRecord::new(file.path, rewritten));
    }

    info!(
      manifests = sources,
      entries = manifest.len(),
      rules = rewriter.len(),
      files,
      "rewrote fingerprinted references"
    );
    Ok(emitted)
  }
}

/// Serialise the manifest as tab-indented JSON.
fn manifest_record(path: &Path, manifest: &Manifest) -> Result<FileRecord> {
  let mut buffer = Vec::new();
  let mut serializer =
    serde_json::Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"\t"));
  manifest
    .serialize(&mut serializer)
    .map_err(CollectorError::Serialize)?;
  Ok(FileRecord::new(path, buffer))
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::DirReplacement;

  fn run(options: CollectorOptions, records: Vec<FileRecord>) -> Result<Vec<FileRecord>> {
    RevCollector::new(options).process(records)
  }

  fn text(record: &FileRecord) -> &str {
    record.text().unwrap()
  }

  #[test]
  fn absorbs_manifests_and_rewrites_other_files() {
    let emitted = run(
      CollectorOptions::default(),
      vec![
        FileRecord::new("rev/js.json", r#"{"js/app.js":"js/app.js?v=0123456789"}"#),
        FileRecord::new("index.html", r#"<script src="js/app.js"></script>"#),
        FileRecord::new("about.html", r#"<script src="/js/app.js?v=oldoldoldo"></script>"#),
      ],
    )
    .unwrap();

    assert_eq!(emitted.len(), 2);
    assert_eq!(emitted[0].path, PathBuf::from("index.html"));
    assert_eq!(text(&emitted[0]), r#"<script src="js/app.js?v=0123456789"></script>"#);
    assert_eq!(emitted[1].path, PathBuf::from("about.html"));
    assert_eq!(text(&emitted[1]), r#"<script src="js/app.js?v=0123456789"></script>"#);
  }

  #[test]
  fn later_manifests_override_earlier_ones() {
    let emitted = run(
      CollectorOptions::default(),
      vec![
        FileRecord::new("a.json", r#"{"a.js":"a.js?v=1111111111"}"#),
        FileRecord::new("b.json", r#"{"a.js":"a.js?v=2222222222"}"#),
        FileRecord::new("page.html", r#"<script src="a.js"></script>"#),
      ],
    )
    .unwrap();

    assert_eq!(text(&emitted[0]), r#"<script src="a.js?v=2222222222"></script>"#);
  }

  #[test]
  fn non_manifest_json_is_rewritten_as_content() {
    let emitted = run(
      CollectorOptions::default(),
      vec![
        FileRecord::new("rev.json", r#"{"app.css":"app.css?v=abcdefabcd"}"#),
        FileRecord::new("config.json", r#"{"style":"url(app.css)","count":1}"#),
      ],
    )
    .unwrap();

    assert_eq!(emitted.len(), 1);
    assert_eq!(emitted[0].path, PathBuf::from("config.json"));
    assert_eq!(
      text(&emitted[0]),
      r#"{"style":"url(app.css?v=abcdefabcd)","count":1}"#
    );
  }

  #[test]
  fn malformed_json_aborts_the_run() {
    let collector = RevCollector::default();
    let mut collection = collector.start();
    collection
      .collect(FileRecord::new("page.html", "<p></p>"))
      .unwrap();
    let err = collection
      .collect(FileRecord::new("broken.json", "{ \"a.js\": "))
      .unwrap_err();

    match err {
      CollectorError::ManifestParse { path, .. } => assert_eq!(path, PathBuf::from("broken.json")),
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn passes_through_empty_and_binary_records() {
    let collector = RevCollector::default();
    let mut collection = collector.start();

    let passed = collection.collect(FileRecord::empty("assets")).unwrap();
    assert_eq!(passed, Some(FileRecord::empty("assets")));

    let passed = collection.collect(FileRecord::new("blank.json", "")).unwrap();
    assert_eq!(passed, Some(FileRecord::new("blank.json", "")));

    let binary = FileRecord::new("logo.png", vec![0x89, 0x50, 0x4e, 0x47, 0xff]);
    let passed = collection.collect(binary.clone()).unwrap();
    assert_eq!(passed, Some(binary));

    assert_eq!(collection.pending_files(), 0);
    assert!(collection.flush().unwrap().is_empty());
  }

  #[test]
  fn emits_collected_manifest_first_without_aliases() {
    let options = CollectorOptions::default().with_collected_manifest("rev-manifest.json");
    let emitted = run(
      options,
      vec![
        FileRecord::new("css.json", r#"{"css/app.scss":"css/app.css?v=aaaaaaaaaa"}"#),
        FileRecord::new("js.json", r#"{"js/app.js":"js/app.js?v=bbbbbbbbbb"}"#),
        FileRecord::new("index.html", r#"<link href="css/app.css">"#),
      ],
    )
    .unwrap();

    assert_eq!(emitted.len(), 2);
    assert_eq!(emitted[0].path, PathBuf::from("rev-manifest.json"));
    assert_eq!(
      text(&emitted[0]),
      "{\n\t\"css/app.scss\": \"css/app.css?v=aaaaaaaaaa\",\n\t\"js/app.js\": \"js/app.js?v=bbbbbbbbbb\"\n}"
    );
    assert_eq!(text(&emitted[1]), r#"<link href="css/app.css?v=aaaaaaaaaa">"#);
  }

  #[test]
  fn empty_manifest_is_emitted_as_empty_object() {
    let options = CollectorOptions::default().with_collected_manifest("all.json");
    let emitted = run(options, Vec::new()).unwrap();
    assert_eq!(emitted.len(), 1);
    assert_eq!(text(&emitted[0]), "{}");
  }

  #[test]
  fn directory_replacements_confine_rewrites() {
    let options = CollectorOptions::default()
      .with_dir_replacement(DirReplacement::literal("js", "//cdn.example.com/js"));
    let emitted = run(
      options,
      vec![
        FileRecord::new("rev.json", r#"{"app.js":"app.js?v=0123456789"}"#),
        FileRecord::new(
          "index.html",
          r#"<script src="js/app.js"></script><script src="app.js"></script>"#,
        ),
      ],
    )
    .unwrap();

    assert_eq!(
      text(&emitted[0]),
      r#"<script src="//cdn.example.com/js/app.js?v=0123456789"></script><script src="app.js"></script>"#
    );
  }

  #[test]
  fn process_emits_pass_through_records_first() {
    let emitted = RevCollector::default()
      .process(vec![
        FileRecord::new("a.html", "<p>a</p>"),
        FileRecord::empty("dir"),
        FileRecord::new("b.html", "<p>b</p>"),
      ])
      .unwrap();

    let paths: Vec<_> = emitted.iter().map(|record| record.path.clone()).collect();
    assert_eq!(
      paths,
      vec![PathBuf::from("dir"), PathBuf::from("a.html"), PathBuf::from("b.html")]
    );
  }
}
