//! Comparable-set filter engine
//!
//! Applies the configured inclusion predicates to a dataset and returns the
//! surviving listings plus a per-predicate exclusion report. The engine
//! re-validates every listing unconditionally: source files named as if they
//! were pre-filtered have shipped out-of-range rows before, so nothing is
//! trusted on the strength of a filename. Applying the same configuration to
//! already-filtered output excludes nothing.
//!
//! Predicates fail closed: a listing missing a field a predicate needs is
//! excluded under that predicate and counted as a missing-field exclusion,
//! never silently included.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::listings::{Dataset, Listing};

/// Predicate names used as exclusion-report keys.
pub const PREDICATE_SQFT_RANGE: &str = "sqft_range";
pub const PREDICATE_MAX_YEAR_BUILT: &str = "max_year_built";
pub const PREDICATE_MIN_STORIES: &str = "min_stories";

/// Inclusion predicates for the comparable envelope.
///
/// Each predicate is optional; `None` disables it. Listings must satisfy
/// every active predicate to survive filtering.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FilterConfig {
    /// Inclusive lower bound on finished square footage
    pub sqft_min: Option<u32>,
    /// Inclusive upper bound on finished square footage
    pub sqft_max: Option<u32>,
    /// Exclude listings built after this year ("built through Y")
    pub max_year_built: Option<i32>,
    /// Exclude listings with fewer stories than this
    pub min_stories: Option<u32>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            sqft_min: Some(1100),
            sqft_max: Some(1900),
            max_year_built: Some(2020),
            min_stories: Some(2),
        }
    }
}

impl FilterConfig {
    /// A configuration with every predicate disabled.
    pub fn disabled() -> Self {
        Self {
            sqft_min: None,
            sqft_max: None,
            max_year_built: None,
            min_stories: None,
        }
    }

    /// The square-footage predicate, active when at least one bound is set.
    /// A single bound leaves the other side open.
    pub fn sqft_range(&self) -> Option<(u32, u32)> {
        match (self.sqft_min, self.sqft_max) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(0), max.unwrap_or(u32::MAX))),
        }
    }

    /// Reject inverted square-footage bounds before running the pipeline.
    pub fn validate(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.sqft_min, self.sqft_max) {
            if min > max {
                return Err(format!(
                    "sqft_min ({}) is greater than sqft_max ({})",
                    min, max
                ));
            }
        }
        Ok(())
    }
}

/// How a listing fared against one predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PredicateResult {
    Pass,
    Fail,
    /// The field the predicate needs is absent; treated as a failure
    MissingField,
}

/// Per-predicate exclusion counts for one filtered dataset.
///
/// A listing failing several predicates increments each predicate's counter;
/// `total_excluded` counts distinct listings, so
/// `input_rows == output_rows + total_excluded` always holds.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct ExclusionReport {
    pub input_rows: usize,
    pub output_rows: usize,
    pub total_excluded: usize,
    /// Exclusions per predicate, missing-field exclusions included
    pub excluded: BTreeMap<String, usize>,
    /// The subset of each predicate's exclusions caused by an absent field
    pub missing_field: BTreeMap<String, usize>,
}

impl ExclusionReport {
    pub fn excluded_by(&self, predicate: &str) -> usize {
        self.excluded.get(predicate).copied().unwrap_or(0)
    }

    pub fn missing_field_for(&self, predicate: &str) -> usize {
        self.missing_field.get(predicate).copied().unwrap_or(0)
    }
}

/// A filtered dataset together with its exclusion report.
#[derive(Debug, Clone)]
pub struct FilterOutcome {
    pub dataset: Dataset,
    pub report: ExclusionReport,
}

/// Apply every active predicate to a dataset, intersecting results.
///
/// Returns a new dataset containing only listings that satisfy all active
/// predicates, plus an [`ExclusionReport`] for observability.
pub fn apply(dataset: &Dataset, config: &FilterConfig) -> FilterOutcome {
    let mut kept = Vec::with_capacity(dataset.len());
    let mut report = ExclusionReport {
        input_rows: dataset.len(),
        ..Default::default()
    };

    for listing in dataset.iter() {
        let mut include = true;
        for (predicate, result) in evaluate(listing, config) {
            match result {
                PredicateResult::Pass => {}
                PredicateResult::Fail => {
                    include = false;
                    *report.excluded.entry(predicate.to_string()).or_insert(0) += 1;
                }
                PredicateResult::MissingField => {
                    include = false;
                    *report.excluded.entry(predicate.to_string()).or_insert(0) += 1;
                    *report
                        .missing_field
                        .entry(predicate.to_string())
                        .or_insert(0) += 1;
                    debug!(
                        identifier = %listing.identifier,
                        predicate,
                        "excluding listing with missing field (fail closed)"
                    );
                }
            }
        }
        if include {
            kept.push(listing.clone());
        } else {
            report.total_excluded += 1;
        }
    }

    report.output_rows = kept.len();
    info!(
        dataset = %dataset.name,
        input = report.input_rows,
        output = report.output_rows,
        excluded = report.total_excluded,
        "filtered dataset"
    );

    FilterOutcome {
        dataset: Dataset::from_parts(dataset.name.clone(), kept),
        report,
    }
}

/// Evaluate every active predicate against one listing, independently.
fn evaluate(listing: &Listing, config: &FilterConfig) -> Vec<(&'static str, PredicateResult)> {
    let mut results = Vec::with_capacity(3);

    if let Some((min, max)) = config.sqft_range() {
        let result = if listing.finished_area_sqft >= min && listing.finished_area_sqft <= max {
            PredicateResult::Pass
        } else {
            PredicateResult::Fail
        };
        results.push((PREDICATE_SQFT_RANGE, result));
    }

    if let Some(max_year) = config.max_year_built {
        let result = match listing.year_built {
            Some(year) if year <= max_year => PredicateResult::Pass,
            Some(_) => PredicateResult::Fail,
            None => PredicateResult::MissingField,
        };
        results.push((PREDICATE_MAX_YEAR_BUILT, result));
    }

    if let Some(min_stories) = config.min_stories {
        let result = match listing.story_count {
            Some(stories) if stories >= min_stories => PredicateResult::Pass,
            Some(_) => PredicateResult::Fail,
            None => PredicateResult::MissingField,
        };
        results.push((PREDICATE_MIN_STORIES, result));
    }

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listings::{Listing, Status};
    use rust_decimal_macros::dec;

    fn comp(identifier: &str, sqft: u32, year: i32, stories: u32) -> Listing {
        let mut listing = Listing::new(identifier, sqft, Status::Sold);
        listing.year_built = Some(year);
        listing.story_count = Some(stories);
        listing.sale_price = Some(dec!(300000));
        listing.sale_date = chrono::NaiveDate::from_ymd_opt(2024, 6, 1);
        listing
    }

    fn sample_dataset() -> Dataset {
        let mut ds = Dataset::new("test");
        ds.push(comp("IN-RANGE", 1500, 2005, 2));
        ds.push(comp("TOO-BIG", 2688, 2005, 2));
        ds.push(comp("TOO-SMALL", 900, 2005, 2));
        ds.push(comp("TOO-NEW", 1500, 2022, 2));
        ds.push(comp("RAMBLER", 1500, 2005, 1));
        ds
    }

    #[test]
    fn test_all_predicates_intersected() {
        let outcome = apply(&sample_dataset(), &FilterConfig::default());
        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.dataset.listings()[0].identifier, "IN-RANGE");
        assert_eq!(outcome.report.excluded_by(PREDICATE_SQFT_RANGE), 2);
        assert_eq!(outcome.report.excluded_by(PREDICATE_MAX_YEAR_BUILT), 1);
        assert_eq!(outcome.report.excluded_by(PREDICATE_MIN_STORIES), 1);
        assert_eq!(outcome.report.total_excluded, 4);
    }

    #[test]
    fn test_conservation_input_equals_output_plus_excluded() {
        let ds = sample_dataset();
        let outcome = apply(&ds, &FilterConfig::default());
        assert_eq!(
            outcome.report.input_rows,
            outcome.report.output_rows + outcome.report.total_excluded
        );
        assert_eq!(outcome.report.input_rows, ds.len());
    }

    #[test]
    fn test_idempotent_second_pass_excludes_nothing() {
        let config = FilterConfig::default();
        let first = apply(&sample_dataset(), &config);
        let second = apply(&first.dataset, &config);
        assert_eq!(second.dataset, first.dataset);
        assert_eq!(second.report.total_excluded, 0);
        assert!(second.report.excluded.values().all(|&n| n == 0) || second.report.excluded.is_empty());
    }

    #[test]
    fn test_known_defect_record_is_excluded() {
        // The 2,688 sq ft / $213,000 / 2005 sale that leaked through a
        // nominally pre-filtered 1100-1900 export.
        let mut listing = comp("15807 131st", 2688, 2005, 2);
        listing.sale_price = Some(dec!(213000));
        let mut ds = Dataset::new("prefiltered-by-filename-only");
        ds.push(listing);

        let outcome = apply(&ds, &FilterConfig::default());
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.report.excluded_by(PREDICATE_SQFT_RANGE), 1);
    }

    #[test]
    fn test_missing_year_built_fails_closed() {
        let mut listing = comp("NO-YEAR", 1500, 2005, 2);
        listing.year_built = None;
        let mut ds = Dataset::new("test");
        ds.push(listing);

        let outcome = apply(&ds, &FilterConfig::default());
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.report.excluded_by(PREDICATE_MAX_YEAR_BUILT), 1);
        assert_eq!(outcome.report.missing_field_for(PREDICATE_MAX_YEAR_BUILT), 1);
    }

    #[test]
    fn test_missing_stories_fails_closed() {
        let mut listing = comp("NO-STORIES", 1500, 2005, 2);
        listing.story_count = None;
        let mut ds = Dataset::new("test");
        ds.push(listing);

        let outcome = apply(&ds, &FilterConfig::default());
        assert!(outcome.dataset.is_empty());
        assert_eq!(outcome.report.missing_field_for(PREDICATE_MIN_STORIES), 1);
    }

    #[test]
    fn test_disabled_predicates_keep_everything() {
        let ds = sample_dataset();
        let outcome = apply(&ds, &FilterConfig::disabled());
        assert_eq!(outcome.dataset.len(), ds.len());
        assert_eq!(outcome.report.total_excluded, 0);
    }

    #[test]
    fn test_inclusive_boundaries() {
        let mut ds = Dataset::new("test");
        ds.push(comp("AT-MIN", 1100, 2020, 2));
        ds.push(comp("AT-MAX", 1900, 2020, 2));
        ds.push(comp("UNDER", 1099, 2020, 2));
        ds.push(comp("OVER", 1901, 2020, 2));

        let outcome = apply(&ds, &FilterConfig::default());
        let ids: Vec<&str> = outcome
            .dataset
            .iter()
            .map(|l| l.identifier.as_str())
            .collect();
        assert_eq!(ids, vec!["AT-MIN", "AT-MAX"]);
    }

    #[test]
    fn test_year_boundary_is_built_through() {
        let mut ds = Dataset::new("test");
        ds.push(comp("AT-2020", 1500, 2020, 2));
        ds.push(comp("AT-2021", 1500, 2021, 2));
        let outcome = apply(&ds, &FilterConfig::default());
        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.dataset.listings()[0].identifier, "AT-2020");
    }

    #[test]
    fn test_single_sided_sqft_bound() {
        let config = FilterConfig {
            sqft_min: Some(1100),
            sqft_max: None,
            max_year_built: None,
            min_stories: None,
        };
        let mut ds = Dataset::new("test");
        ds.push(comp("BIG", 5000, 2005, 2));
        ds.push(comp("SMALL", 900, 2005, 2));
        let outcome = apply(&ds, &config);
        assert_eq!(outcome.dataset.len(), 1);
        assert_eq!(outcome.dataset.listings()[0].identifier, "BIG");
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = FilterConfig {
            sqft_min: Some(1900),
            sqft_max: Some(1100),
            ..FilterConfig::default()
        };
        assert!(config.validate().is_err());
        assert!(FilterConfig::default().validate().is_ok());
    }

    #[test]
    fn test_multi_failure_counted_once_in_total() {
        // Fails sqft and year; total_excluded must count it once.
        let mut ds = Dataset::new("test");
        ds.push(comp("DOUBLE-FAIL", 2688, 2023, 2));
        let outcome = apply(&ds, &FilterConfig::default());
        assert_eq!(outcome.report.total_excluded, 1);
        assert_eq!(outcome.report.excluded_by(PREDICATE_SQFT_RANGE), 1);
        assert_eq!(outcome.report.excluded_by(PREDICATE_MAX_YEAR_BUILT), 1);
    }
}
