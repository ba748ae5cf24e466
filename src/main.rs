//! # osdev-dataset CLI
//!
//! Builds the dataset file from the site catalog and `<data_dir>/manual`.
//!
//! ## Usage
//!
//! ```bash
//! osdev-dataset [data_dir] [output_path]
//! ```
//!
//! `data_dir` defaults to `data`, `output_path` to `osdev_dataset.jsonl`.
//!
//! ## Examples
//!
//! ```bash
//! # Built-in catalog, manual pairs from ./data/manual
//! osdev-dataset
//!
//! # Custom catalog and limits, JSON progress on stderr
//! osdev-dataset --config ./config/dataset.toml --progress json data out.jsonl
//!
//! # Build, then validate every line of the output
//! osdev-dataset --check
//! ```

use clap::Parser;
use std::path::PathBuf;

use osdev_dataset::{check, config, pipeline, progress::ProgressMode, sources};

/// Build an OS-development prompt/response corpus as JSON Lines.
#[derive(Parser)]
#[command(
    name = "osdev-dataset",
    version,
    about = "Build an OS-development prompt/response dataset (JSON Lines)",
    long_about = "Downloads the pages of a static site catalog, extracts fragments with CSS \
    selectors, pairs them with hand-written prompt/example files from <data_dir>/manual, \
    drops duplicates, and writes one JSON record per line."
)]
struct Cli {
    /// Directory holding the `manual/` prompt/example pairs.
    #[arg(default_value = "data")]
    data_dir: PathBuf,

    /// Output JSON-Lines file (created or truncated).
    #[arg(default_value = "osdev_dataset.jsonl")]
    output: PathBuf,

    /// Optional TOML configuration; built-in defaults and catalog otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Progress on stderr. Defaults to `human` on a terminal, `off` otherwise.
    #[arg(long, value_enum)]
    progress: Option<ProgressMode>,

    /// Print the effective site catalog and exit.
    #[arg(long)]
    list_sites: bool,

    /// Validate the written dataset and print per-category counts.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    if cli.list_sites {
        sources::list_sources(&cfg)?;
        return Ok(());
    }

    let reporter = ProgressMode::resolve(cli.progress).reporter();

    let summary =
        pipeline::build_dataset(&cfg, &cli.data_dir, &cli.output, reporter.as_ref()).await?;
    summary.print(&cli.output);

    if cli.check {
        let stats = check::check_dataset(&cli.output)?;
        stats.print();
    }

    Ok(())
}
