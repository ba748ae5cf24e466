//! # osdev-dataset
//!
//! Builds a JSON-Lines corpus of prompt/response pairs for OS-development
//! model tuning.
//!
//! Content comes from two places: a static catalog of web pages (or local
//! files) queried with structural selectors, and a directory of hand-written
//! prompt/example pairs. Extracted text is normalized, deduplicated by
//! content fingerprint within the run, and appended to the output file one
//! record per line.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────┐   ┌───────────┐   ┌───────────┐   ┌────────┐
//! │ Site catalog │──▶│  Fetch   │──▶│  Extract  │──▶│ Normalize │──▶│ Dedup  │
//! └──────────────┘   └──────────┘   └───────────┘   └───────────┘   └───┬────┘
//! ┌──────────────┐                                                     │
//! │ manual/ pairs│────────────────────────────────────────────────────▶│
//! └──────────────┘                                                     ▼
//!                                                               ┌─────────────┐
//!                                                               │ JSONL lines │
//!                                                               └─────────────┘
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and the built-in catalog |
//! | [`models`] | Core data types |
//! | [`fetch`] | Local and HTTP retrieval with size/time bounds |
//! | [`extract`] | CSS-selector fragment extraction |
//! | [`normalize`] | Line-break trimming and length policy |
//! | [`fingerprint`] | Per-run content dedup |
//! | [`record`] | Record building and JSON-Lines output |
//! | [`manual`] | Prompt/example pair discovery |
//! | [`pipeline`] | Orchestration of both enumerations |
//! | [`progress`] | Progress reporting on stderr |
//! | [`check`] | Dataset verification |
//! | [`sources`] | Catalog listing |

pub mod check;
pub mod config;
pub mod extract;
pub mod fetch;
pub mod fingerprint;
pub mod manual;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod progress;
pub mod record;
pub mod sources;
