//! Pipeline progress reporting.
//!
//! Reports which enumeration is running and how many items it has handled,
//! so long catalog runs show signs of life. Progress is emitted on **stderr**
//! so stdout stays reserved for the final summary.

use serde::Serialize;
use std::io::Write;

/// Enumeration currently being driven.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    /// Static site catalog.
    Sites,
    /// Hand-written prompt/example pairs.
    Manual,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Sites => "sites",
            Phase::Manual => "manual",
        }
    }
}

/// A single progress event.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum PipelineProgressEvent {
    /// An enumeration is starting with `total` items.
    Started { phase: Phase, total: u64 },
    /// `n` of `total` items handled, the last one being `item`.
    #[serde(rename = "progress")]
    Item {
        phase: Phase,
        n: u64,
        total: u64,
        item: String,
    },
}

/// Receives progress events from the pipeline driver.
pub trait PipelineProgressReporter: Send + Sync {
    fn report(&self, event: PipelineProgressEvent);
}

/// One line per event on stderr: `[sites 12/33] https://…`.
pub struct StderrProgress;

impl StderrProgress {
    fn line(event: &PipelineProgressEvent) -> String {
        match event {
            PipelineProgressEvent::Started { phase, total } => {
                format!("[{}] {} to process", phase.as_str(), total)
            }
            PipelineProgressEvent::Item {
                phase,
                n,
                total,
                item,
            } => format!("[{} {}/{}] {}", phase.as_str(), n, total, item),
        }
    }
}

impl PipelineProgressReporter for StderrProgress {
    fn report(&self, event: PipelineProgressEvent) {
        let mut err = std::io::stderr().lock();
        let _ = writeln!(err, "{}", Self::line(&event));
    }
}

/// Machine-readable progress: the serialized event, one per line on stderr.
pub struct JsonProgress;

impl PipelineProgressReporter for JsonProgress {
    fn report(&self, event: PipelineProgressEvent) {
        if let Ok(line) = serde_json::to_string(&event) {
            let mut err = std::io::stderr().lock();
            let _ = writeln!(err, "{}", line);
        }
    }
}

/// Discards every event.
pub struct SilentProgress;

impl PipelineProgressReporter for SilentProgress {
    fn report(&self, _event: PipelineProgressEvent) {}
}

/// `--progress` values.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// The requested mode, or `human` on an interactive stderr and `off`
    /// when it is redirected.
    pub fn resolve(requested: Option<Self>) -> Self {
        requested.unwrap_or(if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        })
    }

    pub fn reporter(self) -> Box<dyn PipelineProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(SilentProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
