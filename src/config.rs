use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::Path;

use crate::models::SourceDescriptor;

/// Site catalog compiled into the binary.
const BUILTIN_SITES: &str = include_str!("../config/sites.toml");

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub dedup: DedupConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    #[serde(default)]
    pub extract: ExtractConfig,
    #[serde(default)]
    pub manual: ManualConfig,
    /// Overrides the built-in catalog when present.
    #[serde(default)]
    pub sites: Option<Vec<SourceDescriptor>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FetchConfig {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            max_redirects: default_max_redirects(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
fn default_user_agent() -> String {
    "osdev-dataset-builder/1.0".to_string()
}
fn default_max_bytes() -> usize {
    1024 * 1024
}
fn default_max_redirects() -> usize {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct DedupConfig {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    10_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct FilterConfig {
    #[serde(default = "default_min_content_chars")]
    pub min_content_chars: usize,
    /// Collapse every whitespace run in content to a single space.
    #[serde(default)]
    pub collapse_whitespace: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_content_chars: default_min_content_chars(),
            collapse_whitespace: false,
        }
    }
}

fn default_min_content_chars() -> usize {
    50
}

/// How matched nodes are serialized into the extracted fragment.
#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExtractMode {
    /// Outer markup of each matched node.
    #[default]
    Markup,
    /// Concatenated text nodes of each matched node.
    Text,
    /// `<pre>`/`<code>` source blocks inside the matched nodes.
    Code,
}

impl ExtractMode {
    /// Mode applied to the title selector. Titles are never code.
    pub fn for_title(self) -> Self {
        match self {
            ExtractMode::Code => ExtractMode::Text,
            mode => mode,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ExtractConfig {
    #[serde(default)]
    pub mode: ExtractMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ManualConfig {
    #[serde(default = "default_manual_dir")]
    pub dir_name: String,
    #[serde(default = "default_prompt_suffix")]
    pub prompt_suffix: String,
    #[serde(default = "default_example_suffix")]
    pub example_suffix: String,
    #[serde(default = "default_manual_source")]
    pub source: String,
    #[serde(default = "default_manual_category")]
    pub category: String,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            dir_name: default_manual_dir(),
            prompt_suffix: default_prompt_suffix(),
            example_suffix: default_example_suffix(),
            source: default_manual_source(),
            category: default_manual_category(),
        }
    }
}

fn default_manual_dir() -> String {
    "manual".to_string()
}
fn default_prompt_suffix() -> String {
    "_prompt.txt".to_string()
}
fn default_example_suffix() -> String {
    "_example.c".to_string()
}
fn default_manual_source() -> String {
    "manual".to_string()
}
fn default_manual_category() -> String {
    "C_OSDEV".to_string()
}

#[derive(Debug, Deserialize)]
struct SiteCatalog {
    sites: Vec<SourceDescriptor>,
}

/// Parse the catalog compiled into the binary.
pub fn builtin_sites() -> Result<Vec<SourceDescriptor>> {
    let catalog: SiteCatalog =
        toml::from_str(BUILTIN_SITES).context("Failed to parse built-in site catalog")?;
    Ok(catalog.sites)
}

impl Config {
    /// The effective site catalog: configured sites, or the built-in list.
    pub fn catalog(&self) -> Result<Vec<SourceDescriptor>> {
        match &self.sites {
            Some(sites) => Ok(sites.clone()),
            None => builtin_sites(),
        }
    }
}

/// Load configuration from `path`, or defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            parse_config(&content)?
        }
        None => Config::default(),
    };

    validate(&config)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse config file")
}

fn validate(config: &Config) -> Result<()> {
    if config.fetch.timeout_secs == 0 {
        bail!("fetch.timeout_secs must be > 0");
    }
    if config.fetch.max_bytes < 2 {
        bail!("fetch.max_bytes must be >= 2");
    }
    if config.manual.prompt_suffix.is_empty() || config.manual.example_suffix.is_empty() {
        bail!("manual.prompt_suffix and manual.example_suffix must not be empty");
    }
    if config.manual.prompt_suffix == config.manual.example_suffix {
        bail!("manual.prompt_suffix and manual.example_suffix must differ");
    }

    if let Some(sites) = &config.sites {
        for (i, site) in sites.iter().enumerate() {
            if site.locator.trim().is_empty() {
                bail!("sites[{}].url must not be empty", i);
            }
            if site.category.trim().is_empty() {
                bail!("sites[{}].category must not be empty", i);
            }
        }
    }

    Ok(())
}
