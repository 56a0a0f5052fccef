//! Output formatting for CLI display
//!
//! Separates presentation from the pipeline itself: everything here consumes
//! the exported snapshot read-only and renders strings for the terminal.

use colored::Colorize;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::filter::ExclusionReport;
use crate::pipeline::{DatasetHandle, MarketSnapshot};
use crate::reports::{self, MarketStats};
use crate::utils::{format_currency, CurrencySymbol};

/// Render the full run summary for both datasets.
pub fn render_run_text(snapshot: &MarketSnapshot, recency_months: u32) -> String {
    let mut out = String::new();
    for handle in snapshot.handles() {
        render_dataset(&mut out, handle, recency_months);
    }
    out
}

fn render_dataset(out: &mut String, handle: &DatasetHandle, recency_months: u32) {
    let dataset = &handle.dataset;
    let _ = writeln!(out, "\n{}", dataset.name.bold());
    let _ = writeln!(
        out,
        "  Loaded {} of {} rows ({} skipped)",
        handle.load.rows_loaded,
        handle.load.rows_read,
        handle.load.rows_skipped()
    );
    for (reason, count) in &handle.load.skipped {
        let _ = writeln!(out, "    {} {}: {}", "-".yellow(), reason, count);
    }

    let _ = writeln!(out, "\n{}", exclusion_table(&handle.exclusions));
    let _ = writeln!(
        out,
        "  {} {} comparable listings exported",
        "✓".green().bold(),
        dataset.len()
    );

    let stats = reports::market_stats(dataset);
    let _ = writeln!(out, "\n  Market statistics (all sales):");
    let _ = writeln!(out, "{}", stats_table(&stats));

    let recent = reports::recent_sales(dataset, recency_months);
    let recent_stats = reports::stats_over(&recent);
    let _ = writeln!(
        out,
        "  Market statistics (last {} months, {} sales):",
        recency_months, recent_stats.total_sales
    );
    let _ = writeln!(out, "{}", stats_table(&recent_stats));
}

#[derive(Tabled)]
struct ExclusionRow {
    #[tabled(rename = "Predicate")]
    predicate: String,
    #[tabled(rename = "Excluded")]
    excluded: usize,
    #[tabled(rename = "Missing Field")]
    missing_field: usize,
}

fn exclusion_table(report: &ExclusionReport) -> String {
    let mut rows: Vec<ExclusionRow> = report
        .excluded
        .iter()
        .map(|(predicate, &count)| ExclusionRow {
            predicate: predicate.clone(),
            excluded: count,
            missing_field: report.missing_field_for(predicate),
        })
        .collect();
    rows.push(ExclusionRow {
        predicate: "total (distinct listings)".to_string(),
        excluded: report.total_excluded,
        missing_field: report.missing_field.values().sum(),
    });

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    table.to_string()
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

fn stats_table(stats: &MarketStats) -> String {
    let money = |v: Option<rust_decimal::Decimal>| {
        v.map(|d| format_currency(d, CurrencySymbol::Usd))
            .unwrap_or_else(|| "-".to_string())
    };
    let plain = |v: Option<rust_decimal::Decimal>| {
        v.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string())
    };

    let rows = vec![
        StatRow {
            metric: "Sales",
            value: stats.total_sales.to_string(),
        },
        StatRow {
            metric: "Median price",
            value: money(stats.median_price),
        },
        StatRow {
            metric: "Mean price",
            value: money(stats.mean_price),
        },
        StatRow {
            metric: "Price range",
            value: match (stats.min_price, stats.max_price) {
                (Some(min), Some(max)) => format!(
                    "{} - {}",
                    format_currency(min, CurrencySymbol::Usd),
                    format_currency(max, CurrencySymbol::Usd)
                ),
                _ => "-".to_string(),
            },
        },
        StatRow {
            metric: "Median $/sqft",
            value: money(stats.median_price_per_sqft),
        },
        StatRow {
            metric: "Median sqft",
            value: plain(stats.median_sqft),
        },
        StatRow {
            metric: "Median DOM",
            value: plain(stats.median_dom),
        },
    ];

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    table.modify(Columns::new(1..), Alignment::right());
    table.to_string()
}

/// JSON mirror of the run summary for machine consumption.
pub fn render_run_json(snapshot: &MarketSnapshot, recency_months: u32) -> serde_json::Result<String> {
    #[derive(Serialize)]
    struct JsonDataset {
        name: String,
        rows_read: usize,
        rows_loaded: usize,
        skipped: BTreeMap<String, usize>,
        exclusions: ExclusionReport,
        comparable_rows: usize,
        stats: MarketStats,
        recent_stats: MarketStats,
    }

    #[derive(Serialize)]
    struct JsonRun {
        recency_months: u32,
        datasets: Vec<JsonDataset>,
    }

    let datasets = snapshot
        .handles()
        .iter()
        .map(|handle| {
            let recent = reports::recent_sales(&handle.dataset, recency_months);
            JsonDataset {
                name: handle.dataset.name.clone(),
                rows_read: handle.load.rows_read,
                rows_loaded: handle.load.rows_loaded,
                skipped: handle.load.skipped.clone(),
                exclusions: handle.exclusions.clone(),
                comparable_rows: handle.dataset.len(),
                stats: reports::market_stats(&handle.dataset),
                recent_stats: reports::stats_over(&recent),
            }
        })
        .collect();

    serde_json::to_string_pretty(&JsonRun {
        recency_months,
        datasets,
    })
}

/// Render one audit line per dataset; `violations` is the count of rows a
/// second filter pass would exclude.
pub fn render_audit_line(name: &str, violations: usize) -> String {
    if violations == 0 {
        format!("{} {}: all exported listings satisfy the filter configuration", "✓".green().bold(), name)
    } else {
        format!(
            "{} {}: {} exported listings violate the filter configuration",
            "✗".red().bold(),
            name,
            violations
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, EnrichConfig, SourceConfig, SourcesConfig};
    use crate::filter::FilterConfig;
    use crate::pipeline::run_pipeline;
    use std::io::Write as IoWrite;

    fn snapshot() -> MarketSnapshot {
        let dir = tempfile::tempdir().unwrap();
        let write = |file: &str, rows: &[&str]| {
            let path = dir.path().join(file);
            let mut f = std::fs::File::create(&path).unwrap();
            writeln!(f, "Listing Number\tStatus\tFinished Sqft\tYear Built\tStories\tSelling Price\tSelling Date\tDOM").unwrap();
            for row in rows {
                writeln!(f, "{}", row).unwrap();
            }
            path
        };
        let config = AnalysisConfig {
            sources: SourcesConfig {
                target: SourceConfig {
                    name: "Target".into(),
                    path: write("t.txt", &["T1\tSold\t1576\t2005\t2\t$265,000\t06/01/2024\t12"]),
                },
                comparison: SourceConfig {
                    name: "Comparison".into(),
                    path: write("c.txt", &["C1\tSold\t1500\t2010\t2\t$250,000\t05/01/2024\t8"]),
                },
            },
            filters: FilterConfig::default(),
            enrichment: EnrichConfig::default(),
        };
        run_pipeline(&config).unwrap()
    }

    #[test]
    fn test_run_text_mentions_both_datasets() {
        colored::control::set_override(false);
        let text = render_run_text(&snapshot(), 12);
        assert!(text.contains("Target"));
        assert!(text.contains("Comparison"));
        assert!(text.contains("comparable listings exported"));
        assert!(text.contains("$265,000.00"));
    }

    #[test]
    fn test_run_json_is_valid() {
        let json = render_run_json(&snapshot(), 12).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["datasets"][0]["name"], "Target");
        assert_eq!(value["datasets"][0]["comparable_rows"], 1);
        assert_eq!(value["recency_months"], 12);
    }

    #[test]
    fn test_audit_lines() {
        colored::control::set_override(false);
        assert!(render_audit_line("Target", 0).contains("all exported listings satisfy"));
        assert!(render_audit_line("Target", 3).contains("3 exported listings violate"));
    }
}
