//! Strategy 4: hosted shopping-search API payloads.
//!
//! Results aggregate many merchants, so each item's seller label goes through
//! [`identify`] to pick the platform instead of using the source's own id.

use pricescout_core::{identify, OfferDraft, OfferSource, SourceDescriptor};
use serde_json::Value;

use super::{json_price, json_text, price_hint, Candidate};
use crate::parse::{parse_rating, parse_review_count};
use crate::url::resolve_url;

const RESULT_KEYS: [&str; 2] = ["shopping_results", "inline_shopping_results"];

pub(super) fn extract_api_offers(source: &SourceDescriptor, body: &str) -> Vec<Candidate> {
    let payload: Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(e) => {
            tracing::debug!(source = %source.id, error = %e, "search API payload is not JSON");
            return Vec::new();
        }
    };

    if let Some(message) = payload.get("error").and_then(Value::as_str) {
        tracing::debug!(source = %source.id, api_error = message, "search API reported an error");
        return Vec::new();
    }

    RESULT_KEYS
        .iter()
        .filter_map(|key| payload.get(*key).and_then(Value::as_array))
        .flatten()
        .map(|item| item_to_offer(source, item))
        .collect()
}

fn item_to_offer(source: &SourceDescriptor, item: &Value) -> Candidate {
    let seller = item.get("source").and_then(Value::as_str).unwrap_or_default();
    let platform = identify(seller);

    let mut draft = OfferDraft::new(
        platform.id,
        platform.name,
        &source.currency,
        OfferSource::ExternalApi,
    );
    draft.product_name = item.get("title").and_then(Value::as_str).map(str::to_string);
    draft.price = item
        .get("extracted_price")
        .and_then(|v| json_price(v, None))
        .or_else(|| {
            item.get("price")
                .and_then(|v| json_price(v, price_hint(source)))
        });
    draft.seller = Some(seller.to_string());
    draft.url = item
        .get("link")
        .or_else(|| item.get("product_link"))
        .and_then(Value::as_str)
        .map(|href| resolve_url(&source.base_url, href))
        .unwrap_or_default();
    draft.rating = item
        .get("rating")
        .and_then(json_text)
        .and_then(|t| parse_rating(&t));
    draft.review_count = item
        .get("reviews")
        .and_then(json_text)
        .and_then(|t| parse_review_count(&t));
    draft.image_url = item
        .get("thumbnail")
        .and_then(Value::as_str)
        .map(str::to_string);

    draft.finish()
}
