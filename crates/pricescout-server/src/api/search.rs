use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pricescout_core::{PriceOffer, Region};
use pricescout_scraper::{SearchRequest, SourceReport};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_search_error, ApiError, ApiResponse, AppState};

const DEFAULT_REGION: &str = "us";
const DEFAULT_MAX_RESULTS: usize = 5;

#[derive(Debug, Deserialize)]
pub(super) struct SearchQuery {
    pub q: Option<String>,
    pub region: Option<String>,
    /// Comma-separated source ids.
    pub platforms: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Serialize)]
pub(super) struct SearchData {
    query: String,
    region: Region,
    platforms_searched: Vec<String>,
    platforms_used: Vec<String>,
    results: Vec<PriceOffer>,
    total_results: usize,
    search_time_ms: u64,
    sources: Vec<SourceReport>,
}

pub(super) async fn search_prices(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let mut request = SearchRequest::new(
        query.q.unwrap_or_default(),
        query.region.as_deref().unwrap_or(DEFAULT_REGION),
        query.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
    );
    if let Some(platforms) = query.platforms.as_deref() {
        request = request.with_sources(split_platforms(platforms));
    }

    let outcome = state
        .engine
        .search(request)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(
        req_id.0,
        SearchData {
            query: outcome.query,
            region: outcome.region,
            platforms_searched: outcome.sources_searched,
            platforms_used: outcome.sources_used,
            total_results: outcome.total,
            results: outcome.offers,
            search_time_ms: outcome.elapsed_ms,
            sources: outcome.source_reports,
        },
    )))
}

fn split_platforms(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_ascii_lowercase)
        .collect()
}
