use std::str::FromStr;

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use pricescout_core::{Region, RegionListing};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct PlatformsQuery {
    pub region: Option<String>,
}

pub(super) async fn list_platforms(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PlatformsQuery>,
) -> Result<Json<ApiResponse<Vec<RegionListing>>>, ApiError> {
    let catalog = state.engine.catalog();
    let mut listing = catalog.listing();

    if let Some(raw) = query.region.as_deref() {
        let region = Region::from_str(raw)
            .and_then(|region| catalog.profile(region).map(|p| p.region))
            .map_err(|e| ApiError::new(req_id.0.clone(), "unsupported_region", e.to_string()))?;
        listing.retain(|l| l.region == region);
    }

    Ok(Json(ApiResponse::new(req_id.0, listing)))
}
