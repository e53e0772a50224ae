//! Fetching, extraction, and aggregation of product prices.
//!
//! [`SearchEngine`] fans a query out to every source of a region through a
//! [`Fetcher`], runs each payload through [`extract_offers`], and returns one
//! deduplicated list ranked by price.

pub mod error;
pub mod extract;
pub mod fetch;
pub mod parse;
mod retry;
pub mod search;
pub mod url;

pub use error::{FetchError, SearchError};
pub use extract::{extract_offers, ExtractionReport, SkippedItem};
pub use fetch::{FetchSettings, Fetcher, HttpFetcher};
pub use parse::{parse_price, parse_rating, parse_review_count};
pub use search::{
    SearchEngine, SearchOptions, SearchOutcome, SearchRequest, SourceReport, SourceStatus,
};
pub use url::resolve_url;
