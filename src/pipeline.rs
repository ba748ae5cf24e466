//! Pipeline orchestration.
//!
//! Drives the two enumerations in order: the static site catalog, then the
//! manual prompt/example directory. Every item runs through
//! fetch → extract → normalize → length check → dedup → build → emit, and any
//! stage may end the item with a [`SkipReason`]. Skips are logged and counted;
//! they never stop the run. Only failures on the output stream are fatal.

use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::config::{Config, ExtractMode};
use crate::extract::ParsedDocument;
use crate::fetch::{read_bounded, FetchError, Fetcher, HttpFetcher};
use crate::fingerprint::FingerprintStore;
use crate::manual::scan_manual_dir;
use crate::models::{ManualPair, Record, SourceDescriptor};
use crate::normalize::{collapse_whitespace, meets_min_length, normalize};
use crate::progress::{Phase, PipelineProgressEvent, PipelineProgressReporter};
use crate::record::{self, PromptMaterial, RecordWriter};

/// Why an item produced no record.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("fetch failed: {0}")]
    FetchFailed(#[from] FetchError),
    #[error("no content selector configured")]
    NoContentSelector,
    #[error("content selector matched nothing")]
    NoContent,
    #[error("content too short ({chars} < {min} chars)")]
    TooShort { chars: usize, min: usize },
    #[error("duplicate content")]
    Duplicate,
    #[error("cannot read manual file: {0}")]
    ManualRead(FetchError),
}

impl SkipReason {
    /// Stable label used in the run summary.
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::FetchFailed(_) => "fetch_failed",
            SkipReason::NoContentSelector => "no_content_selector",
            SkipReason::NoContent => "no_content",
            SkipReason::TooShort { .. } => "too_short",
            SkipReason::Duplicate => "duplicate",
            SkipReason::ManualRead(_) => "manual_read",
        }
    }
}

/// Counts collected over one run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub sites_seen: usize,
    pub sites_accepted: usize,
    pub manual_seen: usize,
    pub manual_accepted: usize,
    pub skipped: BTreeMap<&'static str, usize>,
}

impl RunSummary {
    pub fn records_written(&self) -> usize {
        self.sites_accepted + self.manual_accepted
    }

    fn record_skip(&mut self, reason: &SkipReason) {
        *self.skipped.entry(reason.kind()).or_insert(0) += 1;
    }

    pub fn print(&self, output: &Path) {
        println!("dataset written to '{}'", output.display());
        println!(
            "  sites:  {} accepted of {}",
            self.sites_accepted, self.sites_seen
        );
        println!(
            "  manual: {} accepted of {}",
            self.manual_accepted, self.manual_seen
        );
        for (kind, count) in &self.skipped {
            println!("  skipped ({}): {}", kind, count);
        }
        println!("total records: {}", self.records_written());
    }
}

/// Sequential driver over the site catalog and the manual directory.
pub struct Pipeline<'a> {
    config: &'a Config,
    fetcher: &'a dyn Fetcher,
    reporter: &'a dyn PipelineProgressReporter,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        config: &'a Config,
        fetcher: &'a dyn Fetcher,
        reporter: &'a dyn PipelineProgressReporter,
    ) -> Self {
        Self {
            config,
            fetcher,
            reporter,
        }
    }

    /// Run both enumerations, sites first.
    pub async fn run<W: Write>(
        &self,
        sites: &[SourceDescriptor],
        data_dir: &Path,
        store: &mut FingerprintStore,
        writer: &mut RecordWriter<W>,
    ) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        info!(count = sites.len(), "downloading and parsing sites");
        self.process_sites(sites, store, writer, &mut summary)
            .await?;

        let manual_dir = data_dir.join(&self.config.manual.dir_name);
        info!(dir = %manual_dir.display(), "processing manual examples");
        self.process_manual(&manual_dir, store, writer, &mut summary)?;

        Ok(summary)
    }

    pub async fn process_sites<W: Write>(
        &self,
        sites: &[SourceDescriptor],
        store: &mut FingerprintStore,
        writer: &mut RecordWriter<W>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let total = sites.len() as u64;
        self.reporter.report(PipelineProgressEvent::Started {
            phase: Phase::Sites,
            total,
        });

        for (i, site) in sites.iter().enumerate() {
            summary.sites_seen += 1;
            match self.process_site(site, store).await {
                Ok(record) => {
                    writer.emit(&record)?;
                    summary.sites_accepted += 1;
                    debug!(locator = %site.locator, "record emitted");
                }
                Err(reason) => {
                    log_skip(&site.locator, &reason);
                    summary.record_skip(&reason);
                }
            }
            self.reporter.report(PipelineProgressEvent::Item {
                phase: Phase::Sites,
                n: i as u64 + 1,
                total,
                item: site.locator.clone(),
            });
        }
        Ok(())
    }

    async fn process_site(
        &self,
        site: &SourceDescriptor,
        store: &mut FingerprintStore,
    ) -> Result<Record, SkipReason> {
        if site.content_selector.is_none() {
            return Err(SkipReason::NoContentSelector);
        }

        let raw = self
            .fetcher
            .fetch(&site.locator, self.config.fetch.max_bytes)
            .await?;
        let (title, content) = extract_fields(&raw, site, self.config.extract.mode);
        drop(raw);

        let content = content.ok_or(SkipReason::NoContent)?;
        let collapsed;
        let content = if self.config.filter.collapse_whitespace {
            collapsed = collapse_whitespace(&content);
            collapsed.as_str()
        } else {
            normalize(&content)
        };

        let min = self.config.filter.min_content_chars;
        if !meets_min_length(content, min) {
            return Err(SkipReason::TooShort {
                chars: content.chars().count(),
                min,
            });
        }

        if store.is_duplicate(content) {
            return Err(SkipReason::Duplicate);
        }

        Ok(record::build(
            PromptMaterial::Synthesized {
                title: title.as_deref(),
            },
            content,
            &site.locator,
            &site.category,
        ))
    }

    pub fn process_manual<W: Write>(
        &self,
        manual_dir: &Path,
        store: &mut FingerprintStore,
        writer: &mut RecordWriter<W>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        if !manual_dir.is_dir() {
            info!(dir = %manual_dir.display(), "manual directory not found; skipping");
            return Ok(());
        }

        let pairs = match scan_manual_dir(manual_dir, &self.config.manual) {
            Ok(pairs) => pairs,
            Err(e) => {
                warn!(dir = %manual_dir.display(), error = %e, "cannot scan manual directory");
                return Ok(());
            }
        };

        self.process_pairs(&pairs, store, writer, summary)
    }

    /// Emit one record per readable, unique pair.
    pub fn process_pairs<W: Write>(
        &self,
        pairs: &[ManualPair],
        store: &mut FingerprintStore,
        writer: &mut RecordWriter<W>,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let total = pairs.len() as u64;
        self.reporter.report(PipelineProgressEvent::Started {
            phase: Phase::Manual,
            total,
        });

        for (i, pair) in pairs.iter().enumerate() {
            summary.manual_seen += 1;
            match self.process_pair(pair, store) {
                Ok(record) => {
                    writer.emit(&record)?;
                    summary.manual_accepted += 1;
                    debug!(base = %pair.base_name, "record emitted");
                }
                Err(reason) => {
                    log_skip(&pair.base_name, &reason);
                    summary.record_skip(&reason);
                }
            }
            self.reporter.report(PipelineProgressEvent::Item {
                phase: Phase::Manual,
                n: i as u64 + 1,
                total,
                item: pair.base_name.clone(),
            });
        }
        Ok(())
    }

    fn process_pair(
        &self,
        pair: &ManualPair,
        store: &mut FingerprintStore,
    ) -> Result<Record, SkipReason> {
        let limit = self.config.fetch.max_bytes;
        let prompt = read_bounded(&pair.prompt_path, limit).map_err(SkipReason::ManualRead)?;
        let example = read_bounded(&pair.example_path, limit).map_err(SkipReason::ManualRead)?;

        let prompt = String::from_utf8_lossy(&prompt);
        let example = String::from_utf8_lossy(&example);

        if store.is_duplicate(&example) {
            return Err(SkipReason::Duplicate);
        }

        Ok(record::build(
            PromptMaterial::Verbatim(&prompt),
            &example,
            &self.config.manual.source,
            &self.config.manual.category,
        ))
    }
}

/// Apply the title and content selectors to one fetched document.
///
/// Kept synchronous so the parsed tree never lives across an await point.
fn extract_fields(
    raw: &[u8],
    site: &SourceDescriptor,
    mode: ExtractMode,
) -> (Option<String>, Option<String>) {
    let doc = ParsedDocument::parse(raw);
    let title = doc.extract(site.title_selector.as_deref(), mode.for_title());
    let content = doc.extract(site.content_selector.as_deref(), mode);
    (title, content)
}

fn log_skip(item: &str, reason: &SkipReason) {
    match reason {
        SkipReason::FetchFailed(_) | SkipReason::ManualRead(_) => {
            warn!(item, "skip: {}", reason)
        }
        _ => info!(item, "skip: {}", reason),
    }
}

/// Build a dataset at `output` from the configured catalog and `data_dir`.
///
/// Fails only when the output file cannot be created or written.
pub async fn build_dataset(
    config: &Config,
    data_dir: &Path,
    output: &Path,
    reporter: &dyn PipelineProgressReporter,
) -> Result<RunSummary> {
    let sites = config.catalog()?;

    let file = std::fs::File::create(output)
        .with_context(|| format!("cannot create output file '{}'", output.display()))?;
    let mut writer = RecordWriter::new(file);

    let fetcher = HttpFetcher::new(&config.fetch).context("cannot build HTTP client")?;
    let mut store = FingerprintStore::new(config.dedup.capacity);

    let pipeline = Pipeline::new(config, &fetcher, reporter);
    let summary = pipeline
        .run(&sites, data_dir, &mut store, &mut writer)
        .await?;

    writer.into_inner()?.sync_all()?;
    debug!(fingerprints = store.len(), "fingerprint store at end of run");
    Ok(summary)
}
