//! Strategy 1: schema.org `Product` records in JSON-LD blocks.

use std::sync::LazyLock;

use pricescout_core::{OfferDraft, OfferSource, SourceDescriptor};
use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

use super::{json_price, json_text, price_hint, Candidate};
use crate::parse::{parse_rating, parse_review_count};
use crate::url::resolve_url;

static LD_JSON_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

/// The price point chosen from an offer collection, with the fields that
/// travel with it.
struct PricePoint {
    price: Decimal,
    seller: Option<String>,
    url: Option<String>,
    in_stock: bool,
}

pub(super) fn extract_structured_offers(source: &SourceDescriptor, html: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for cap in LD_JSON_RE.captures_iter(html) {
        let Some(json_text) = cap.get(1).map(|m| m.as_str().trim()) else {
            continue;
        };

        let value: Value = match serde_json::from_str(json_text) {
            Ok(v) => v,
            Err(e) => {
                tracing::debug!(source = %source.id, error = %e, "skipping malformed JSON-LD block");
                continue;
            }
        };

        let mut products = Vec::new();
        collect_products(&value, &mut products);
        candidates.extend(products.into_iter().map(|p| product_to_offer(source, p)));
    }

    candidates
}

/// Walk top-level objects, arrays, `@graph` containers, and `ItemList`
/// elements, collecting every `Product` node in document order.
fn collect_products<'a>(value: &'a Value, out: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_products(item, out);
            }
        }
        Value::Object(map) => {
            if has_type(value, "Product") {
                out.push(value);
                return;
            }
            if let Some(graph) = map.get("@graph") {
                collect_products(graph, out);
            }
            if has_type(value, "ItemList") {
                if let Some(elements) = map.get("itemListElement") {
                    collect_products(elements, out);
                }
            }
            if has_type(value, "ListItem") {
                if let Some(item) = map.get("item") {
                    collect_products(item, out);
                }
            }
        }
        _ => {}
    }
}

/// `@type` may be a plain string or an array of strings.
fn has_type(item: &Value, wanted: &str) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case(wanted),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case(wanted)),
        _ => false,
    }
}

fn product_to_offer(source: &SourceDescriptor, product: &Value) -> Candidate {
    let mut draft = OfferDraft::new(
        &source.id,
        &source.name,
        &source.currency,
        OfferSource::StructuredData,
    );
    draft.product_name = product.get("name").and_then(Value::as_str).map(str::to_string);

    let best = product
        .get("offers")
        .and_then(|offers| lowest_price_point(offers, price_hint(source)));
    if let Some(point) = best {
        draft.price = Some(point.price);
        draft.seller = point.seller;
        draft.in_stock = point.in_stock;
        if let Some(url) = point.url {
            draft.url = resolve_url(&source.base_url, &url);
        }
    }
    if draft.url.is_empty() {
        if let Some(url) = product.get("url").and_then(Value::as_str) {
            draft.url = resolve_url(&source.base_url, url);
        }
    }

    draft.image_url = product
        .get("image")
        .and_then(image_url)
        .map(|src| resolve_url(&source.base_url, &src))
        .filter(|u| !u.is_empty());

    if let Some(agg) = product.get("aggregateRating") {
        draft.rating = agg
            .get("ratingValue")
            .and_then(json_text)
            .and_then(|t| parse_rating(&t));
        draft.review_count = agg
            .get("reviewCount")
            .or_else(|| agg.get("ratingCount"))
            .and_then(json_text)
            .and_then(|t| parse_review_count(&t));
    }

    draft.finish()
}

/// Lowest valid price across an `Offer`, `AggregateOffer`, or array of either.
fn lowest_price_point(offers: &Value, price_hint: Option<&str>) -> Option<PricePoint> {
    let mut points = Vec::new();
    collect_price_points(offers, price_hint, &mut points);
    // min_by_key keeps the first of equal prices.
    points.into_iter().min_by_key(|p| p.price)
}

fn collect_price_points(offer: &Value, price_hint: Option<&str>, out: &mut Vec<PricePoint>) {
    match offer {
        Value::Array(items) => {
            for item in items {
                collect_price_points(item, price_hint, out);
            }
        }
        Value::Object(_) => {
            if let Some(nested) = offer.get("offers") {
                collect_price_points(nested, price_hint, out);
            }
            let price = offer
                .get("price")
                .or_else(|| offer.get("lowPrice"))
                .and_then(|v| structured_price(v, price_hint));
            if let Some(price) = price {
                out.push(PricePoint {
                    price,
                    seller: offer.get("seller").and_then(seller_name),
                    url: offer.get("url").and_then(Value::as_str).map(str::to_string),
                    in_stock: offer
                        .get("availability")
                        .and_then(Value::as_str)
                        .is_none_or(is_available),
                });
            }
        }
        _ => {}
    }
}

/// schema.org requires `.` decimals in `price`, so string prices are parsed
/// without the locale hint unless they carry a visible separator mix.
fn structured_price(value: &Value, price_hint: Option<&str>) -> Option<Decimal> {
    match value {
        Value::String(s) if s.contains(',') => json_price(value, price_hint),
        _ => json_price(value, None),
    }
}

fn seller_name(seller: &Value) -> Option<String> {
    match seller {
        Value::String(s) => Some(s.clone()),
        Value::Object(_) => seller.get("name").and_then(Value::as_str).map(str::to_string),
        _ => None,
    }
}

fn is_available(availability: &str) -> bool {
    let lowered = availability.to_ascii_lowercase();
    !(lowered.contains("outofstock") || lowered.contains("soldout") || lowered.contains("discontinued"))
}

fn image_url(image: &Value) -> Option<String> {
    match image {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(image_url),
        Value::Object(_) => image
            .get("url")
            .or_else(|| image.get("contentUrl"))
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}
