// Import module - MLS tabular export parsers

pub mod mls_table;

use anyhow::{anyhow, Result};
use std::path::Path;
use tracing::info;

use crate::config::SourceConfig;
use crate::listings::Dataset;
pub use mls_table::LoadSummary;

/// Load one configured source into a dataset (auto-detects delimiter).
///
/// `.csv` files are comma-delimited; `.txt` and `.tsv` are tab-delimited,
/// which is how MLS full exports arrive.
pub fn load_listings(source: &SourceConfig) -> Result<(Dataset, LoadSummary)> {
    let delimiter = delimiter_for(&source.path)?;
    let delimiter_char = delimiter as char;
    info!(
        source = %source.name,
        path = ?source.path,
        delimiter = %delimiter_char,
        "loading listings"
    );
    mls_table::parse_mls_table(&source.path, &source.name, delimiter)
}

fn delimiter_for(path: &Path) -> Result<u8> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| anyhow!("source file has no extension: {:?}", path))?
        .to_lowercase();

    match extension.as_str() {
        "csv" => Ok(b','),
        "txt" | "tsv" => Ok(b'\t'),
        _ => Err(anyhow!(
            "unsupported source format: .{}. Supported formats: .csv, .txt, .tsv",
            extension
        )),
    }
}
