//! Pipeline orchestration and the exported snapshot
//!
//! Runs Loader -> Filter Engine -> Enricher for each configured source and
//! exports the results as immutable handles. The presentation layer reads the
//! snapshot; no transformation happens past this point.

use anyhow::Context;
use std::sync::Arc;
use tracing::info;

use crate::config::{AnalysisConfig, SourceConfig};
use crate::enrich;
use crate::error::{PipelineError, Result};
use crate::filter::{self, ExclusionReport, FilterConfig};
use crate::importers::{self, LoadSummary};
use crate::listings::Dataset;

/// One cleaned dataset plus the accounting from its load and filter stages.
#[derive(Debug, Clone)]
pub struct DatasetHandle {
    pub dataset: Arc<Dataset>,
    pub load: LoadSummary,
    pub exclusions: ExclusionReport,
}

/// The exported result of a full pipeline run: both cleaned datasets,
/// read-only for the rest of the session.
#[derive(Debug, Clone)]
pub struct MarketSnapshot {
    pub target: DatasetHandle,
    pub comparison: DatasetHandle,
}

impl MarketSnapshot {
    pub fn handles(&self) -> [&DatasetHandle; 2] {
        [&self.target, &self.comparison]
    }
}

/// Execute the full batch pipeline over both configured sources.
///
/// A fatal error in either source (unreadable file, missing required column,
/// zero usable rows) aborts the run; no partial snapshot is exported.
pub fn run_pipeline(config: &AnalysisConfig) -> Result<MarketSnapshot> {
    config
        .filters
        .validate()
        .map_err(PipelineError::Config)?;

    let target = process_source(&config.sources.target, config)
        .with_context(|| format!("failed to process target source '{}'", config.sources.target.name))?;
    let comparison = process_source(&config.sources.comparison, config).with_context(|| {
        format!(
            "failed to process comparison source '{}'",
            config.sources.comparison.name
        )
    })?;

    Ok(MarketSnapshot { target, comparison })
}

/// Load, filter, and enrich one source.
fn process_source(source: &SourceConfig, config: &AnalysisConfig) -> Result<DatasetHandle> {
    let (raw, load) = importers::load_listings(source)?;
    let outcome = filter::apply(&raw, &config.filters);
    let enriched = enrich::enrich(outcome.dataset, &config.enrichment);

    info!(
        source = %source.name,
        loaded = load.rows_loaded,
        excluded = outcome.report.total_excluded,
        comparable = enriched.len(),
        "pipeline stage complete"
    );

    Ok(DatasetHandle {
        dataset: Arc::new(enriched),
        load,
        exclusions: outcome.report,
    })
}

/// Re-apply the configured predicates to an already-exported dataset and
/// report how many rows a second pass would exclude. Zero means the exported
/// data is internally consistent with its configuration; anything else means
/// the filter stage was bypassed or misconfigured.
pub fn verify_invariants(handle: &DatasetHandle, filters: &FilterConfig) -> usize {
    let second_pass = filter::apply(&handle.dataset, filters);
    second_pass.report.total_excluded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EnrichConfig, SourcesConfig};
    use std::io::Write;
    use std::path::Path;

    fn write_source(dir: &Path, file: &str, rows: &[&str]) -> std::path::PathBuf {
        let path = dir.join(file);
        let mut f = std::fs::File::create(&path).unwrap();
        writeln!(
            f,
            "Listing Number\tStatus\tFinished Sqft\tYear Built\tStories\tSelling Price\tSelling Date\tDOM"
        )
        .unwrap();
        for row in rows {
            writeln!(f, "{}", row).unwrap();
        }
        path
    }

    fn config_for(dir: &Path) -> AnalysisConfig {
        let target_path = write_source(
            dir,
            "target.txt",
            &[
                "T1\tSold\t1576\t2005\t2\t$265,000\t06/01/2024\t12",
                "T2\tSold\t2688\t2005\t2\t$213,000\t03/10/2024\t30",
            ],
        );
        let comparison_path = write_source(
            dir,
            "comparison.txt",
            &[
                "C1\tSold\t1500\t2010\t2\t$250,000\t05/01/2024\t8",
                "C2\tActive\t1480\t2012\t2\t\t\t4",
            ],
        );
        AnalysisConfig {
            sources: SourcesConfig {
                target: SourceConfig {
                    name: "Target".to_string(),
                    path: target_path,
                },
                comparison: SourceConfig {
                    name: "Comparison".to_string(),
                    path: comparison_path,
                },
            },
            filters: FilterConfig::default(),
            enrichment: EnrichConfig::default(),
        }
    }

    #[test]
    fn test_run_pipeline_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = run_pipeline(&config_for(dir.path())).unwrap();

        // The 2,688 sq ft row is excluded; the rest survive.
        assert_eq!(snapshot.target.dataset.len(), 1);
        assert_eq!(snapshot.target.exclusions.total_excluded, 1);
        assert_eq!(snapshot.comparison.dataset.len(), 2);

        // Enrichment ran on the exported data.
        assert!(snapshot.target.dataset.listings()[0].price_per_sqft.is_some());
        assert!(snapshot.comparison.dataset.listings()[1].market_segment.is_some());
    }

    #[test]
    fn test_exported_snapshot_passes_verification() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_for(dir.path());
        let snapshot = run_pipeline(&config).unwrap();
        for handle in snapshot.handles() {
            assert_eq!(verify_invariants(handle, &config.filters), 0);
        }
    }

    #[test]
    fn test_missing_source_aborts_with_source_context() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.sources.comparison.path = dir.path().join("absent.txt");

        let err = run_pipeline(&config).unwrap_err();
        assert!(format!("{:#}", err).contains("Comparison"));
    }

    #[test]
    fn test_invalid_filter_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = config_for(dir.path());
        config.filters.sqft_min = Some(2000);
        config.filters.sqft_max = Some(1000);

        let err = run_pipeline(&config).unwrap_err();
        assert!(err.to_string().contains("sqft_min"));
    }
}
