//! The canonical priced listing produced by extraction.
//!
//! A [`PriceOffer`] can only be obtained through [`OfferDraft::finish`], which
//! rejects candidates with an empty/short name or a non-positive price. Once
//! built an offer is read-only: fields are private and exposed via accessors.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Minimum product-name length (in characters, after trimming).
pub const MIN_PRODUCT_NAME_LEN: usize = 3;

/// Number of normalized characters kept in a dedup key.
pub const DEDUP_KEY_LEN: usize = 50;

/// Which extraction path produced an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferSource {
    StructuredData,
    EmbeddedScript,
    Selector,
    ExternalApi,
}

impl OfferSource {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OfferSource::StructuredData => "structured_data",
            OfferSource::EmbeddedScript => "embedded_script",
            OfferSource::Selector => "selector",
            OfferSource::ExternalApi => "external_api",
        }
    }
}

impl std::fmt::Display for OfferSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a candidate item did not become an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The item was flagged as an advertisement.
    Sponsored,
    MissingName,
    NameTooShort,
    MissingPrice,
    /// A price was found but is zero or negative.
    InvalidPrice,
    /// An offer with the same dedup key was already collected.
    Duplicate,
}

impl SkipReason {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SkipReason::Sponsored => "sponsored",
            SkipReason::MissingName => "missing_name",
            SkipReason::NameTooShort => "name_too_short",
            SkipReason::MissingPrice => "missing_price",
            SkipReason::InvalidPrice => "invalid_price",
            SkipReason::Duplicate => "duplicate",
        }
    }
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable builder for a candidate offer.
///
/// Strategies fill whatever fields they can find and call [`finish`](Self::finish).
#[derive(Debug, Clone)]
pub struct OfferDraft {
    pub platform_id: String,
    pub platform_name: String,
    pub product_name: Option<String>,
    pub price: Option<Decimal>,
    pub currency: String,
    pub url: String,
    pub seller: Option<String>,
    pub rating: Option<f32>,
    pub review_count: Option<u32>,
    pub image_url: Option<String>,
    pub in_stock: bool,
    pub source: OfferSource,
}

impl OfferDraft {
    #[must_use]
    pub fn new(
        platform_id: impl Into<String>,
        platform_name: impl Into<String>,
        currency: impl Into<String>,
        source: OfferSource,
    ) -> Self {
        Self {
            platform_id: platform_id.into(),
            platform_name: platform_name.into(),
            product_name: None,
            price: None,
            currency: currency.into(),
            url: String::new(),
            seller: None,
            rating: None,
            review_count: None,
            image_url: None,
            in_stock: true,
            source,
        }
    }

    /// Validate the draft and freeze it into a [`PriceOffer`] stamped with the
    /// current time.
    ///
    /// # Errors
    ///
    /// Returns the [`SkipReason`] describing the first failed invariant.
    pub fn finish(self) -> Result<PriceOffer, SkipReason> {
        let product_name = self
            .product_name
            .as_deref()
            .map(collapse_whitespace)
            .filter(|s| !s.is_empty())
            .ok_or(SkipReason::MissingName)?;
        if product_name.chars().count() < MIN_PRODUCT_NAME_LEN {
            return Err(SkipReason::NameTooShort);
        }

        let price = self.price.ok_or(SkipReason::MissingPrice)?;
        if price <= Decimal::ZERO {
            return Err(SkipReason::InvalidPrice);
        }

        let rating = self
            .rating
            .filter(|r| r.is_finite() && (0.0..=5.0).contains(r));

        Ok(PriceOffer {
            platform_id: self.platform_id,
            platform_name: self.platform_name,
            product_name,
            price: price.normalize(),
            currency: self.currency,
            url: self.url,
            seller: non_blank(self.seller),
            rating,
            review_count: self.review_count,
            image_url: non_blank(self.image_url),
            in_stock: self.in_stock,
            scraped_at: Utc::now(),
            source: self.source,
        })
    }
}

/// One normalized, priced product listing from one source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceOffer {
    platform_id: String,
    platform_name: String,
    product_name: String,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    currency: String,
    url: String,
    seller: Option<String>,
    rating: Option<f32>,
    review_count: Option<u32>,
    image_url: Option<String>,
    in_stock: bool,
    scraped_at: DateTime<Utc>,
    source: OfferSource,
}

impl PriceOffer {
    #[must_use]
    pub fn platform_id(&self) -> &str {
        &self.platform_id
    }

    #[must_use]
    pub fn platform_name(&self) -> &str {
        &self.platform_name
    }

    #[must_use]
    pub fn product_name(&self) -> &str {
        &self.product_name
    }

    /// Always strictly positive.
    #[must_use]
    pub fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Absolute URL, or empty when the listing link could not be resolved.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    #[must_use]
    pub fn seller(&self) -> Option<&str> {
        self.seller.as_deref()
    }

    #[must_use]
    pub fn rating(&self) -> Option<f32> {
        self.rating
    }

    #[must_use]
    pub fn review_count(&self) -> Option<u32> {
        self.review_count
    }

    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.image_url.as_deref()
    }

    #[must_use]
    pub fn in_stock(&self) -> bool {
        self.in_stock
    }

    #[must_use]
    pub fn scraped_at(&self) -> DateTime<Utc> {
        self.scraped_at
    }

    #[must_use]
    pub fn source(&self) -> OfferSource {
        self.source
    }

    /// Normalized product-name fingerprint, see [`product_key`].
    #[must_use]
    pub fn dedup_key(&self) -> String {
        product_key(&self.product_name)
    }
}

/// Fingerprint a product name for near-duplicate detection.
///
/// Lowercases, drops every non-alphanumeric character (whitespace included),
/// and keeps the first [`DEDUP_KEY_LEN`] characters, so
/// `"Apple iPhone 16 Pro, 128GB"` and `"apple iphone 16 pro 128gb!!"` collide.
/// A name with no alphanumeric characters keys on its trimmed, lowercased
/// text instead.
#[must_use]
pub fn product_key(name: &str) -> String {
    let key: String = name
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .take(DEDUP_KEY_LEN)
        .collect();
    if !key.is_empty() {
        return key;
    }
    name.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .take(DEDUP_KEY_LEN)
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn draft(name: Option<&str>, price: Option<&str>) -> OfferDraft {
        let mut d = OfferDraft::new("amazon_us", "Amazon US", "$", OfferSource::Selector);
        d.product_name = name.map(str::to_string);
        d.price = price.map(|p| Decimal::from_str(p).unwrap());
        d
    }

    #[test]
    fn finish_builds_offer_with_trimmed_name() {
        let offer = draft(Some("  Apple   iPhone 16 Pro  "), Some("999.00"))
            .finish()
            .unwrap();
        assert_eq!(offer.product_name(), "Apple iPhone 16 Pro");
        assert_eq!(offer.price(), Decimal::from_str("999").unwrap());
        assert!(offer.in_stock());
        assert_eq!(offer.source(), OfferSource::Selector);
    }

    #[test]
    fn finish_rejects_missing_and_blank_names() {
        assert_eq!(
            draft(None, Some("1")).finish().unwrap_err(),
            SkipReason::MissingName
        );
        assert_eq!(
            draft(Some("   "), Some("1")).finish().unwrap_err(),
            SkipReason::MissingName
        );
    }

    #[test]
    fn finish_rejects_short_names() {
        assert_eq!(
            draft(Some(" TV "), Some("100")).finish().unwrap_err(),
            SkipReason::NameTooShort
        );
    }

    #[test]
    fn finish_rejects_missing_zero_and_negative_prices() {
        assert_eq!(
            draft(Some("Widget"), None).finish().unwrap_err(),
            SkipReason::MissingPrice
        );
        assert_eq!(
            draft(Some("Widget"), Some("0")).finish().unwrap_err(),
            SkipReason::InvalidPrice
        );
        assert_eq!(
            draft(Some("Widget"), Some("-3.50")).finish().unwrap_err(),
            SkipReason::InvalidPrice
        );
    }

    #[test]
    fn finish_drops_out_of_range_rating_and_blank_optionals() {
        let mut d = draft(Some("Widget"), Some("5"));
        d.rating = Some(7.5);
        d.seller = Some("  ".to_string());
        d.image_url = Some(String::new());
        let offer = d.finish().unwrap();
        assert!(offer.rating().is_none());
        assert!(offer.seller().is_none());
        assert!(offer.image_url().is_none());
    }

    #[test]
    fn product_key_merges_punctuation_and_case_variants() {
        assert_eq!(
            product_key("Apple iPhone 16 Pro, 128GB"),
            product_key("apple iphone 16 pro 128gb!!")
        );
        assert_eq!(product_key("Apple iPhone 16 Pro, 128GB"), "appleiphone16pro128gb");
    }

    #[test]
    fn product_key_without_alphanumerics_keeps_symbols() {
        assert_eq!(product_key("  ★★★ ~~~ "), "★★★ ~~~");
        assert_ne!(product_key("★★★ ~~~"), product_key("--- !!!"));
    }

    #[test]
    fn product_key_truncates_to_prefix() {
        let long = "a".repeat(DEDUP_KEY_LEN + 20);
        assert_eq!(product_key(&long).chars().count(), DEDUP_KEY_LEN);
    }

    #[test]
    fn offer_serializes_price_as_number() {
        let offer = draft(Some("Widget"), Some("1049.99")).finish().unwrap();
        let json = serde_json::to_value(&offer).unwrap();
        assert_eq!(json["price"], serde_json::json!(1049.99));
        assert_eq!(json["source"], "selector");
        assert_eq!(json["platform_id"], "amazon_us");
    }
}
