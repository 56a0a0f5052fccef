//! Analysis configuration
//!
//! Every threshold the pipeline applies lives here, deserialized from a TOML
//! file, so the comparable envelope is inspectable and testable instead of
//! being buried in code. Defaults encode the standing business rule:
//! 1,100-1,900 finished sq ft, built through 2020, two or more stories,
//! 12-month recency window.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::filter::FilterConfig;

/// One raw tabular source (an MLS export) and the display name for its dataset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceConfig {
    /// Display name, e.g. "Rebecca Ridge"
    pub name: String,
    /// Path to the CSV (comma) or TXT/TSV (tab) export
    pub path: PathBuf,
}

/// The two datasets the analysis compares.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourcesConfig {
    /// The subject neighborhood
    pub target: SourceConfig,
    /// The broader market around it
    pub comparison: SourceConfig,
}

/// Enrichment parameters.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnrichConfig {
    /// Sold listings within this many months of the dataset's most recent
    /// sale are tagged as recent comparables.
    pub recency_months: u32,
}

impl Default for EnrichConfig {
    fn default() -> Self {
        Self { recency_months: 12 }
    }
}

/// Full pipeline configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisConfig {
    pub sources: SourcesConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub enrichment: EnrichConfig,
}

impl AnalysisConfig {
    /// Read and parse a TOML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {:?}", path))?;
        let config: AnalysisConfig = toml::from_str(&text)
            .with_context(|| format!("failed to parse config file {:?}", path))?;
        Ok(config)
    }
}
