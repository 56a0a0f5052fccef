// Reports module - descriptive market statistics over cleaned datasets

pub mod market;

pub use market::{market_stats, recent_sales, stats_over, MarketStats};
