//! Derived-field enrichment
//!
//! Pure mapping over a filtered dataset: adds price-per-sqft, a market-segment
//! tag, and a days-on-market bucket per listing. Never adds or removes rows.
//!
//! The recency window is anchored at the most recent sale date in the dataset
//! rather than the wall clock, so re-running the pipeline over the same static
//! export always tags the same comparables.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use tracing::info;

use crate::config::EnrichConfig;
use crate::listings::{Dataset, DomBucket, Listing, MarketSegment};

/// Enrich every listing in a dataset. Cardinality-preserving and side-effect
/// free; a listing's base fields are never altered.
pub fn enrich(dataset: Dataset, config: &EnrichConfig) -> Dataset {
    let cutoff = recency_cutoff(dataset.max_sale_date(), config.recency_months);
    let name = dataset.name.clone();
    let listings: Vec<Listing> = dataset
        .iter()
        .map(|l| enrich_listing(l.clone(), cutoff))
        .collect();

    let recent = listings
        .iter()
        .filter(|l| l.market_segment == Some(MarketSegment::RecentComparable))
        .count();
    info!(
        dataset = %name,
        rows = listings.len(),
        recent_comparables = recent,
        "enriched dataset"
    );

    Dataset::from_parts(name, listings)
}

fn enrich_listing(mut listing: Listing, cutoff: Option<NaiveDate>) -> Listing {
    listing.price_per_sqft = price_per_sqft(&listing);
    listing.market_segment = Some(market_segment(&listing, cutoff));
    listing.dom_bucket = listing.days_on_market.map(DomBucket::from_days);
    listing
}

/// `sale_price / finished_area_sqft`, rounded to cents. Sold listings only;
/// a sqft of zero cannot occur past the loader but is guarded anyway.
fn price_per_sqft(listing: &Listing) -> Option<Decimal> {
    if !listing.status.is_sold() || listing.finished_area_sqft == 0 {
        return None;
    }
    listing
        .sale_price
        .map(|price| (price / Decimal::from(listing.finished_area_sqft)).round_dp(2))
}

fn market_segment(listing: &Listing, cutoff: Option<NaiveDate>) -> MarketSegment {
    use crate::listings::Status;
    match listing.status {
        Status::Active => MarketSegment::ActiveListing,
        Status::Pending => MarketSegment::PendingSale,
        Status::Sold => match (listing.sale_date, cutoff) {
            (Some(date), Some(cutoff)) if date >= cutoff => MarketSegment::RecentComparable,
            _ => MarketSegment::HistoricalSale,
        },
    }
}

/// First day of the recency window: `months` before the newest sale date.
fn recency_cutoff(max_sale_date: Option<NaiveDate>, months: u32) -> Option<NaiveDate> {
    max_sale_date.map(|date| date - Months::new(months))
}
