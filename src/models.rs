//! Core data models used throughout the dataset builder.
//!
//! These types represent the catalog entries, manual example pairs, and
//! output records that flow through the acquisition pipeline.

use serde::{Deserialize, Deserializer};
use std::path::PathBuf;

/// One entry of the static site catalog.
///
/// Selectors are structural (CSS) queries. `None` means the field is not
/// extracted for this site; an empty string in configuration maps to `None`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceDescriptor {
    #[serde(rename = "url")]
    pub locator: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub title_selector: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub content_selector: Option<String>,
    pub category: String,
}

impl SourceDescriptor {
    pub fn new(
        locator: impl Into<String>,
        title_selector: Option<&str>,
        content_selector: Option<&str>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            locator: locator.into(),
            title_selector: title_selector.filter(|s| !s.is_empty()).map(str::to_string),
            content_selector: content_selector
                .filter(|s| !s.is_empty())
                .map(str::to_string),
            category: category.into(),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// A hand-written prompt file matched with its example file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManualPair {
    pub base_name: String,
    pub prompt_path: PathBuf,
    pub example_path: PathBuf,
}

/// One accepted prompt/response tuple with provenance.
///
/// Records are written exactly once and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub prompt: String,
    pub response: String,
    pub source: String,
    pub category: String,
}
