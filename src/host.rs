//! Filesystem host feeding directories through a collector run.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use same_file::is_same_file;
use tracing::{debug, info};

use crate::collector::RevCollector;
use crate::models::FileRecord;

/// File discovered on disk together with its output-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputFile {
  /// Location on disk.
  pub source: PathBuf,
  /// Path relative to the input root; used as the record path and the output location.
  pub relative: PathBuf,
}

/// Counts reported after a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
  /// Records written with new contents (rewritten files and the collected manifest).
  pub written: usize,
  /// Records installed unchanged.
  pub passed_through: usize,
}

/// Expand files and directories into input files.
///
/// Directories are walked recursively in name order, skipping dot-files. A file given
/// directly is placed at its file name.
pub fn collect_inputs(paths: &[PathBuf]) -> Result<Vec<InputFile>> {
  let mut inputs = Vec::new();
  for path in paths {
    let metadata =
      fs::metadata(path).with_context(|| format!("input not found at {}", path.display()))?;
    if metadata.is_dir() {
      walk(path, Path::new(""), &mut inputs)?;
    } else {
      let relative = path
        .file_name()
        .map(PathBuf::from)
        .with_context(|| format!("input {} has no file name", path.display()))?;
      inputs.push(InputFile {
        source: path.clone(),
        relative,
      });
    }
  }
  Ok(inputs)
}

fn walk(dir: &Path, relative_root: &Path, inputs: &mut Vec<InputFile>) -> Result<()> {
  let mut entries = fs::read_dir(dir)
    .with_context(|| format!("failed to read directory {}", dir.display()))?
    .collect::<std::io::Result<Vec<_>>>()
    .with_context(|| format!("failed to list directory {}", dir.display()))?;
  entries.sort_by_key(|entry| entry.file_name());

  for entry in entries {
    let file_name = entry.file_name();
    if file_name.to_string_lossy().starts_with('.') {
      continue;
    }

    let relative = relative_root.join(&file_name);
    let file_type = entry.file_type()?;
    if file_type.is_dir() {
      walk(&entry.path(), &relative, inputs)?;
    } else if file_type.is_file() {
      inputs.push(InputFile {
        source: entry.path(),
        relative,
      });
    }
  }
  Ok(())
}

/// Stream `inputs` through `collector` and write the results below `out_dir`.
///
/// Text outputs are written fresh; pass-through records are hard linked (or copied) from their
/// source so binary assets are never round-tripped through memory twice.
pub fn run(collector: &RevCollector, inputs: &[InputFile], out_dir: &Path) -> Result<RunSummary> {
  let sources: HashMap<&Path, &Path> = inputs
    .iter()
    .map(|input| (input.relative.as_path(), input.source.as_path()))
    .collect();

  let mut summary = RunSummary::default();
  let mut collection = collector.start();

  for input in inputs {
    let contents =
      fs::read(&input.source).with_context(|| format!("failed to read {}", input.source.display()))?;
    let record = FileRecord::new(&input.relative, contents);
    if let Some(passed) = collection.collect(record)? {
      let destination = out_dir.join(&passed.path);
      match sources.get(passed.path.as_path()) {
        Some(source) => install_passthrough(source, &destination)?,
        None => write_record(&destination, &passed)?,
      }
      summary.passed_through += 1;
    }
  }

  debug!(
    manifests = collection.manifest_count(),
    pending = collection.pending_files(),
    "collection phase complete"
  );

  for record in collection.flush()? {
    write_record(&out_dir.join(&record.path), &record)?;
    summary.written += 1;
  }

  info!(
    written = summary.written,
    passed_through = summary.passed_through,
    out_dir = %out_dir.display(),
    "collector run finished"
  );
  Ok(summary)
}

fn write_record(destination: &Path, record: &FileRecord) -> Result<()> {
  let Some(contents) = &record.contents else {
    return Ok(());
  };
  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  fs::write(destination, contents)
    .with_context(|| format!("failed to write {}", destination.display()))
}

fn install_passthrough(source: &Path, destination: &Path) -> Result<()> {
  if let Some(parent) = destination.parent() {
    fs::create_dir_all(parent)
      .with_context(|| format!("failed to create {}", parent.display()))?;
  }
  link_or_copy(source, destination).with_context(|| {
    format!(
      "failed to install {} at {}",
      source.display(),
      destination.display()
    )
  })
}

fn link_or_copy(source: &Path, destination: &Path) -> std::io::Result<()> {
  if destination.exists() {
    if is_same_file(source, destination)? {
      return Ok(());
    }
    fs::remove_file(destination)?;
  }

  match fs::hard_link(source, destination) {
    Ok(_) => Ok(()),
    Err(err) => {
      if err.kind() == ErrorKind::AlreadyExists {
        Ok(())
      } else {
        fs::copy(source, destination).map(|_| ())
      }
    }
  }
}
