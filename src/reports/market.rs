//! Descriptive market statistics
//!
//! Simple aggregation over sold listings: medians, means, and ranges the
//! report UI and the CLI summary both display. No modeling; every number here
//! is a direct summary of the cleaned dataset.

use chrono::Months;
use itertools::Itertools;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::listings::{Dataset, Listing};

/// Summary statistics for the sold listings in one dataset.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct MarketStats {
    pub total_sales: usize,
    pub median_price: Option<Decimal>,
    pub mean_price: Option<Decimal>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub median_price_per_sqft: Option<Decimal>,
    pub mean_price_per_sqft: Option<Decimal>,
    pub median_sqft: Option<Decimal>,
    pub median_dom: Option<Decimal>,
}

/// Compute descriptive statistics over every sold listing in the dataset.
pub fn market_stats(dataset: &Dataset) -> MarketStats {
    let sold: Vec<&Listing> = dataset.iter().filter(|l| l.status.is_sold()).collect();
    stats_over(&sold)
}

/// Sold listings within `months` of the dataset's most recent sale date.
pub fn recent_sales(dataset: &Dataset, months: u32) -> Vec<&Listing> {
    let Some(max_date) = dataset.max_sale_date() else {
        return Vec::new();
    };
    let cutoff = max_date - Months::new(months);
    dataset
        .iter()
        .filter(|l| l.status.is_sold())
        .filter(|l| l.sale_date.is_some_and(|d| d >= cutoff))
        .collect()
}

/// Statistics over an arbitrary slice of sold listings (e.g. a recency window).
pub fn stats_over(sold: &[&Listing]) -> MarketStats {
    let prices: Vec<Decimal> = sold.iter().filter_map(|l| l.sale_price).collect();
    let per_sqft: Vec<Decimal> = sold.iter().filter_map(|l| l.price_per_sqft).collect();
    let sqfts: Vec<Decimal> = sold
        .iter()
        .map(|l| Decimal::from(l.finished_area_sqft))
        .collect();
    let doms: Vec<Decimal> = sold
        .iter()
        .filter_map(|l| l.days_on_market)
        .map(Decimal::from)
        .collect();

    MarketStats {
        total_sales: sold.len(),
        median_price: median(&prices),
        mean_price: mean(&prices),
        min_price: prices.iter().min().copied(),
        max_price: prices.iter().max().copied(),
        median_price_per_sqft: median(&per_sqft),
        mean_price_per_sqft: mean(&per_sqft),
        median_sqft: median(&sqfts),
        median_dom: median(&doms),
    }
}

/// Median of a set of values; the mean of the middle pair for even counts.
fn median(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sorted: Vec<Decimal> = values.iter().copied().sorted().collect();
    let mid = sorted.len() / 2;
    let median = if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / Decimal::TWO
    };
    Some(median.round_dp(2))
}

fn mean(values: &[Decimal]) -> Option<Decimal> {
    if values.is_empty() {
        return None;
    }
    let sum: Decimal = values.iter().copied().sum();
    Some((sum / Decimal::from(values.len())).round_dp(2))
}
