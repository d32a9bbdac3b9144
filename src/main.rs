//! rev-collector - rewrite references to fingerprinted assets using rev manifests.

use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use rev_collector::host::{collect_inputs, run};
use rev_collector::{CollectorConfig, DirReplacement, RevCollector};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Merge rev manifests and rewrite asset references in every other input file.
#[derive(Parser, Debug)]
#[command(name = "rev-collector")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Files or directories holding manifests and files to rewrite
  #[arg(required = true)]
  inputs: Vec<PathBuf>,

  /// Directory receiving rewritten files
  #[arg(short, long, default_value = "dist")]
  out_dir: PathBuf,

  /// Path to a JSON config file (defaults to ./rev-collector.config.json when present)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// Write the merged manifest to this path inside the output directory
  #[arg(long)]
  collected_manifest: Option<PathBuf>,

  /// Also replace references that already carry a fingerprint
  #[arg(long)]
  replace_reved: bool,

  /// Regex fragment matching a fingerprint token
  #[arg(long)]
  rev_suffix: Option<String>,

  /// Query parameter holding cache-busting tokens
  #[arg(long)]
  remark: Option<String>,

  /// Redirect references under a directory (repeatable)
  #[arg(long = "dir-replacement", value_name = "SRC=TARGET", value_parser = parse_pair)]
  dir_replacements: Vec<(String, String)>,

  /// Extra extension mapping (repeatable)
  #[arg(long = "ext-map", value_name = "FROM=TO", value_parser = parse_pair)]
  ext_map: Vec<(String, String)>,

  /// Log level (trace, debug, info, warn, error)
  #[arg(long, default_value = "warn")]
  log_level: String,
}

fn parse_pair(value: &str) -> Result<(String, String), String> {
  let (key, target) = value
    .split_once('=')
    .ok_or_else(|| format!("expected KEY=VALUE, got `{value}`"))?;
  Ok((key.to_string(), target.to_string()))
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr),
    )
    .init();

  let config = match &cli.config {
    Some(path) => CollectorConfig::from_path(path)
      .ok_or_else(|| anyhow!("failed to load config from {}", path.display()))?,
    None => {
      let cwd = std::env::current_dir().context("failed to resolve working directory")?;
      CollectorConfig::discover(&cwd)
    }
  };

  let mut options = config.into_options();
  if let Some(path) = cli.collected_manifest {
    options.collected_manifest = Some(path);
  }
  if cli.replace_reved {
    options.replace_reved = true;
  }
  if let Some(rev_suffix) = cli.rev_suffix {
    options.rev_suffix = rev_suffix;
  }
  if let Some(remark) = cli.remark {
    options.remark = remark;
  }
  for (from, to) in cli.ext_map {
    options.ext_map.set(from, to);
  }
  options.dir_replacements.extend(
    cli
      .dir_replacements
      .into_iter()
      .map(|(source_dir, target)| DirReplacement::literal(source_dir, target)),
  );

  let inputs = collect_inputs(&cli.inputs)?;
  let summary = run(&RevCollector::new(options), &inputs, &cli.out_dir)?;
  println!(
    "rewrote {} file(s), passed through {} into {}",
    summary.written,
    summary.passed_through,
    cli.out_dir.display()
  );
  Ok(())
}
