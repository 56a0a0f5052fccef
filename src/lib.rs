//! Comps - real-estate comparable-set preprocessing pipeline
//!
//! Loads two MLS listing exports (a target neighborhood and a broader
//! comparison area), filters them to a configured comparable envelope,
//! enriches them with derived fields, and exports the cleaned datasets plus
//! per-predicate exclusion accounting for a presentation layer to consume.

pub mod cli;
pub mod config;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod importers;
pub mod listings;
pub mod pipeline;
pub mod reports;
pub mod utils;
