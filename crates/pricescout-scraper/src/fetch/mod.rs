//! The fetch contract: raw content for one query from one source.
//!
//! The orchestrator only sees [`Fetcher`]. Whether a source is served by a
//! plain HTTP request, a driven browser, or a hosted search API is decided by
//! the implementation injected into [`SearchEngine`](crate::SearchEngine).

mod http;

use async_trait::async_trait;
use pricescout_core::{SourceDescriptor, SourceQuery};

use crate::error::FetchError;

pub use http::{FetchSettings, HttpFetcher};

/// Fetch raw content (markup or JSON) for `query` from `source`.
///
/// Implementations must not share mutable per-request state between calls;
/// the orchestrator invokes `fetch` concurrently for every source of a region.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// # Errors
    ///
    /// Returns a [`FetchError`] describing why no content could be obtained.
    async fn fetch(
        &self,
        query: &SourceQuery,
        source: &SourceDescriptor,
    ) -> Result<String, FetchError>;
}
