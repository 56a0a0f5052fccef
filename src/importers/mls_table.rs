use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use csv::ReaderBuilder;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::listings::{Dataset, Listing, Status};

/// Per-source load accounting: rows read, rows kept, and skip counts by reason.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct LoadSummary {
    pub source: String,
    pub rows_read: usize,
    pub rows_loaded: usize,
    /// Skipped-row counts keyed by reason, e.g. "unparseable finished sqft"
    pub skipped: BTreeMap<String, usize>,
}

impl LoadSummary {
    pub fn rows_skipped(&self) -> usize {
        self.skipped.values().sum()
    }
}

/// Parse an MLS tabular export into a dataset.
///
/// Malformed rows are skipped and counted, never fatal; a source that yields
/// zero usable listings fails with [`PipelineError::EmptyDataset`].
pub fn parse_mls_table<P: AsRef<Path>>(
    file_path: P,
    source_name: &str,
    delimiter: u8,
) -> Result<(Dataset, LoadSummary)> {
    let path = file_path.as_ref();

    let mut reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true) // MLS exports pad trailing columns inconsistently
        .from_path(path)
        .with_context(|| format!("failed to open source file {:?}", path))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read headers from {:?}", path))?
        .clone();

    debug!(source = source_name, ?headers, "source headers");

    let mapping = find_columns(&headers, source_name)?;
    debug!(source = source_name, ?mapping, "column mapping");

    let mut dataset = Dataset::new(source_name);
    let mut summary = LoadSummary {
        source: source_name.to_string(),
        ..Default::default()
    };

    for (idx, result) in reader.records().enumerate() {
        let row_num = idx + 2; // 1-based, after the header row
        summary.rows_read += 1;

        let record = match result {
            Ok(record) => record,
            Err(e) => {
                warn!(source = source_name, row = row_num, "unreadable row: {}", e);
                *summary.skipped.entry("unreadable row".to_string()).or_insert(0) += 1;
                continue;
            }
        };

        match parse_row(&record, &mapping) {
            Ok(listing) => {
                if dataset.push(listing) {
                    summary.rows_loaded += 1;
                } else {
                    warn!(source = source_name, row = row_num, "duplicate identifier");
                    *summary
                        .skipped
                        .entry("duplicate identifier".to_string())
                        .or_insert(0) += 1;
                }
            }
            Err(reason) => {
                warn!(source = source_name, row = row_num, "skipping row: {}", reason);
                *summary.skipped.entry(reason).or_insert(0) += 1;
            }
        }
    }

    if dataset.is_empty() {
        return Err(PipelineError::EmptyDataset {
            source_name: source_name.to_string(),
        }
        .into());
    }

    info!(
        source = source_name,
        read = summary.rows_read,
        loaded = summary.rows_loaded,
        skipped = summary.rows_skipped(),
        "loaded listings"
    );

    Ok((dataset, summary))
}

#[derive(Debug)]
struct ColumnMapping {
    listing_number: Option<usize>,
    street_number: Option<usize>,
    street_name: Option<usize>,
    status: usize,
    finished_sqft: usize,
    lot_sqft: Option<usize>,
    year_built: Option<usize>,
    stories: Option<usize>,
    listing_price: Option<usize>,
    selling_price: Option<usize>,
    selling_date: Option<usize>,
    dom: Option<usize>,
}

fn find_columns(headers: &csv::StringRecord, source_name: &str) -> Result<ColumnMapping> {
    let mut listing_number = None;
    let mut street_number = None;
    let mut street_name = None;
    let mut status = None;
    let mut finished_sqft = None;
    let mut lot_sqft = None;
    let mut year_built = None;
    let mut stories = None;
    let mut listing_price = None;
    let mut selling_price = None;
    let mut selling_date = None;
    let mut dom = None;

    for (idx, header) in headers.iter().enumerate() {
        let text = header.trim().to_lowercase();

        if text.contains("listing number") || text.contains("mls number") {
            listing_number = Some(idx);
        }
        if text == "street number" {
            street_number = Some(idx);
        }
        if text == "street name" {
            street_name = Some(idx);
        }
        if text == "status" {
            status = Some(idx);
        }
        if text.contains("finished") && (text.contains("sqft") || text.contains("sq ft")) {
            finished_sqft = Some(idx);
        }
        if text.contains("lot") && (text.contains("sqft") || text.contains("sq ft")) {
            lot_sqft = Some(idx);
        }
        if text.contains("year built") {
            year_built = Some(idx);
        }
        if text.contains("stories") || text == "story count" {
            stories = Some(idx);
        }
        if text.contains("listing price") || text.contains("list price") {
            listing_price = Some(idx);
        }
        if text.contains("selling price") || text.contains("sold price") || text.contains("sale price")
        {
            selling_price = Some(idx);
        }
        if text.contains("selling date") || text.contains("sold date") || text.contains("sale date") {
            selling_date = Some(idx);
        }
        if text == "dom" || text == "days on market" {
            dom = Some(idx);
        }
    }

    let require = |column: Option<usize>, field: &str| -> Result<usize> {
        column.ok_or_else(|| {
            PipelineError::MalformedRecord {
                source_name: source_name.to_string(),
                row: 1,
                field: field.to_string(),
                detail: "required column not found in header".to_string(),
            }
            .into()
        })
    };

    // An identifier column is required: either the MLS number or an address.
    if listing_number.is_none() && street_name.is_none() {
        return Err(PipelineError::MalformedRecord {
            source_name: source_name.to_string(),
            row: 1,
            field: "Listing Number / Street Name".to_string(),
            detail: "no identifier column found in header".to_string(),
        }
        .into());
    }

    Ok(ColumnMapping {
        listing_number,
        street_number,
        street_name,
        status: require(status, "Status")?,
        finished_sqft: require(finished_sqft, "Finished Sqft")?,
        lot_sqft,
        year_built,
        stories,
        listing_price,
        selling_price,
        selling_date,
        dom,
    })
}

/// Parse one data row. The Err variant is a skip reason, not a failure.
fn parse_row(record: &csv::StringRecord, mapping: &ColumnMapping) -> Result<Listing, String> {
    let field = |idx: Option<usize>| -> Option<&str> {
        idx.and_then(|i| record.get(i)).map(str::trim).filter(|s| !s.is_empty())
    };

    let identifier = match field(mapping.listing_number) {
        Some(number) => number.to_string(),
        None => {
            let number = field(mapping.street_number).unwrap_or("");
            let name = field(mapping.street_name).unwrap_or("");
            format!("{} {}", number, name).trim().to_string()
        }
    };
    if identifier.is_empty() {
        return Err("missing identifier".to_string());
    }

    let status: Status = field(Some(mapping.status))
        .ok_or_else(|| "missing status".to_string())?
        .parse()
        .map_err(|_| "unrecognized status".to_string())?;

    let finished_area_sqft = match field(Some(mapping.finished_sqft)) {
        Some(text) => parse_sqft(text).map_err(|_| "unparseable finished sqft".to_string())?,
        None => return Err("missing finished sqft".to_string()),
    };
    if finished_area_sqft == 0 {
        return Err("unparseable finished sqft".to_string());
    }

    let lot_size_sqft = match field(mapping.lot_sqft) {
        Some(text) => parse_sqft(text).map_err(|_| "unparseable lot sqft".to_string())?,
        None => 0,
    };

    let year_built = match field(mapping.year_built) {
        Some(text) => {
            let year: i32 = text
                .parse()
                .map_err(|_| "unparseable year built".to_string())?;
            // Implausible years are treated as absent so the filter fails closed.
            if (1900..=Utc::now().year()).contains(&year) {
                Some(year)
            } else {
                None
            }
        }
        None => None,
    };

    let story_count = match field(mapping.stories) {
        Some(text) => Some(parse_stories(text).ok_or("unparseable stories")?),
        None => None,
    };

    let list_price = match field(mapping.listing_price) {
        Some(text) => Some(parse_price(text).map_err(|_| "unparseable listing price".to_string())?),
        None => None,
    };

    let sale_price = match field(mapping.selling_price) {
        Some(text) => Some(parse_price(text).map_err(|_| "unparseable selling price".to_string())?),
        None => None,
    };

    let sale_date = match field(mapping.selling_date) {
        Some(text) => Some(parse_date(text).ok_or("unparseable selling date")?),
        None => None,
    };

    let days_on_market = match field(mapping.dom) {
        Some(text) => Some(text.parse::<u32>().map_err(|_| "unparseable dom".to_string())?),
        None => None,
    };

    // A sold listing without its sale facts is a data-quality error, not a
    // tolerable gap.
    if status.is_sold() && (sale_price.is_none() || sale_date.is_none()) {
        return Err("sold listing missing sale price or date".to_string());
    }

    Ok(Listing {
        identifier,
        finished_area_sqft,
        lot_size_sqft,
        year_built,
        story_count,
        status,
        sale_price,
        sale_date,
        list_price,
        days_on_market,
        price_per_sqft: None,
        market_segment: None,
        dom_bucket: None,
    })
}

/// Square footage sometimes arrives with thousands separators ("1,576").
fn parse_sqft(text: &str) -> Result<u32, std::num::ParseIntError> {
    text.replace(',', "").parse::<u32>()
}

/// Story counts arrive as "2" or "2 Story"; take the leading integer.
fn parse_stories(text: &str) -> Option<u32> {
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    let stories: u32 = digits.parse().ok()?;
    if stories >= 1 {
        Some(stories)
    } else {
        None
    }
}

/// Strip currency decoration ("$", thousands commas) and parse.
fn parse_price(text: &str) -> Result<Decimal, rust_decimal::Error> {
    let cleaned = text.replace(['$', ','], "").replace(' ', "");
    Decimal::from_str(&cleaned)
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    for format in ["%m/%d/%Y", "%m/%d/%y", "%Y-%m-%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }
    None
}
