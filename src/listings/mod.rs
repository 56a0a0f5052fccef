//! Domain model for property listings and named datasets.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Listing status as reported by the MLS export
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Status {
    Sold,
    Pending,
    Active,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Sold => "SOLD",
            Status::Pending => "PENDING",
            Status::Active => "ACTIVE",
        }
    }

    pub fn is_sold(&self) -> bool {
        matches!(self, Status::Sold)
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "SOLD" | "S" => Ok(Status::Sold),
            "PENDING" | "PI" | "P" => Ok(Status::Pending),
            "ACTIVE" | "A" => Ok(Status::Active),
            other => Err(format!("unknown listing status: '{}'", other)),
        }
    }
}

/// Market segment tag attached during enrichment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MarketSegment {
    /// Sold within the configured recency window
    RecentComparable,
    /// Sold, but outside the recency window
    HistoricalSale,
    PendingSale,
    ActiveListing,
}

impl MarketSegment {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketSegment::RecentComparable => "RECENT_COMPARABLE",
            MarketSegment::HistoricalSale => "HISTORICAL_SALE",
            MarketSegment::PendingSale => "PENDING_SALE",
            MarketSegment::ActiveListing => "ACTIVE_LISTING",
        }
    }
}

/// Days-on-market bucket attached during enrichment
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DomBucket {
    /// 0-7 days
    Fast,
    /// 8-30 days
    Normal,
    /// 31-90 days
    Slow,
    /// Over 90 days
    Stale,
}

impl DomBucket {
    pub fn from_days(days: u32) -> Self {
        match days {
            0..=7 => DomBucket::Fast,
            8..=30 => DomBucket::Normal,
            31..=90 => DomBucket::Slow,
            _ => DomBucket::Stale,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DomBucket::Fast => "FAST",
            DomBucket::Normal => "NORMAL",
            DomBucket::Slow => "SLOW",
            DomBucket::Stale => "STALE",
        }
    }
}

/// One property record: a sold transaction, a pending sale, or an active listing.
///
/// The derived fields (`price_per_sqft`, `market_segment`, `dom_bucket`) are
/// `None` as loaded and are populated by the enrichment stage.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    /// MLS listing number, falling back to street address
    pub identifier: String,
    pub finished_area_sqft: u32,
    pub lot_size_sqft: u32,
    pub year_built: Option<i32>,
    pub story_count: Option<u32>,
    pub status: Status,
    /// Present only for sold listings
    pub sale_price: Option<Decimal>,
    /// Present only for sold listings
    pub sale_date: Option<NaiveDate>,
    pub list_price: Option<Decimal>,
    pub days_on_market: Option<u32>,

    // Derived fields, populated by enrichment
    pub price_per_sqft: Option<Decimal>,
    pub market_segment: Option<MarketSegment>,
    pub dom_bucket: Option<DomBucket>,
}

impl Listing {
    pub fn new(identifier: impl Into<String>, finished_area_sqft: u32, status: Status) -> Self {
        Self {
            identifier: identifier.into(),
            finished_area_sqft,
            lot_size_sqft: 0,
            year_built: None,
            story_count: None,
            status,
            sale_price: None,
            sale_date: None,
            list_price: None,
            days_on_market: None,
            price_per_sqft: None,
            market_segment: None,
            dom_bucket: None,
        }
    }
}

/// Named collection of listings with identifier uniqueness enforced on insert.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dataset {
    pub name: String,
    listings: Vec<Listing>,
}

impl Dataset {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            listings: Vec::new(),
        }
    }

    /// Insert a listing, rejecting duplicate identifiers.
    ///
    /// Returns false (and leaves the dataset unchanged) when a listing with
    /// the same identifier is already present.
    pub fn push(&mut self, listing: Listing) -> bool {
        if self
            .listings
            .iter()
            .any(|l| l.identifier == listing.identifier)
        {
            return false;
        }
        self.listings.push(listing);
        true
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Listing> {
        self.listings.iter()
    }

    /// Build a dataset from listings that are already known to be unique.
    ///
    /// Used by the filter and enrichment stages, which only ever narrow or
    /// map an existing dataset.
    pub(crate) fn from_parts(name: impl Into<String>, listings: Vec<Listing>) -> Self {
        Self {
            name: name.into(),
            listings,
        }
    }

    /// Most recent sale date across sold listings, if any.
    pub fn max_sale_date(&self) -> Option<NaiveDate> {
        self.listings.iter().filter_map(|l| l.sale_date).max()
    }
}
