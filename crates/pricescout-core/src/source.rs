//! Data-driven source descriptors.
//!
//! A source is described entirely by data: where to fetch, which extraction
//! strategies to run in which order, and the locator tables the selector
//! strategy walks. Adding a site means adding a descriptor.

use std::borrow::Cow;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One extraction strategy, listed in the order a source wants them tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// schema.org `Product` / `Offer` records in JSON-LD blocks.
    StructuredData,
    /// Name/price pairs found inside inline `<script>` payloads.
    EmbeddedScript,
    /// Repeating product cards walked with CSS locators.
    Selector,
    /// A hosted shopping-search API JSON response.
    ExternalApi,
}

/// How raw content for a source is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transport {
    #[default]
    Http,
    /// Sites that serve bot-hostile markup to non-browser clients.
    Browser,
    /// Hosted search API requiring an API key.
    SearchApi,
}

/// Advertisement predicate for one product card.
///
/// The card is sponsored when `selector` matches inside it and, if
/// `text_contains` is set, the matched element's text contains it
/// (case-insensitive).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SponsoredRule {
    pub selector: String,
    #[serde(default)]
    pub text_contains: Option<String>,
}

/// Prioritized alternative CSS selectors per product-card field.
///
/// Each list is tried in order; the first locator yielding a usable value wins.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLocators {
    pub card: Vec<String>,
    pub title: Vec<String>,
    /// Prefixed to the title when present.
    #[serde(default)]
    pub brand: Vec<String>,
    #[serde(default)]
    pub price: Vec<String>,
    /// Split-price fallback: integer part.
    #[serde(default)]
    pub price_whole: Vec<String>,
    /// Split-price fallback: fractional part (defaults to `00`).
    #[serde(default)]
    pub price_fraction: Vec<String>,
    #[serde(default)]
    pub link: Vec<String>,
    #[serde(default)]
    pub rating: Vec<String>,
    #[serde(default)]
    pub review_count: Vec<String>,
    #[serde(default)]
    pub image: Vec<String>,
    #[serde(default)]
    pub seller: Vec<String>,
    /// Any match marks the card as out of stock.
    #[serde(default)]
    pub out_of_stock: Vec<String>,
}

/// Static description of one queryable source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescriptor {
    /// Stable lowercase id, also used as the offer `platform_id`.
    pub id: String,
    pub name: String,
    /// Origin used to resolve relative links.
    pub base_url: String,
    /// Search URL template with a `{query}` placeholder and, for search APIs,
    /// an `{api_key}` placeholder.
    pub search_url: String,
    /// BCP 47 tag such as `de-DE`; empty inherits the region's locale.
    #[serde(default)]
    pub locale: String,
    /// Empty derives the header from the locale.
    #[serde(default)]
    pub accept_language: String,
    /// Currency symbol or code, also a price parser convention hint. Empty
    /// inherits the region's currency.
    #[serde(default)]
    pub currency: String,
    #[serde(default)]
    pub transport: Transport,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    pub strategies: Vec<StrategyKind>,
    #[serde(default)]
    pub locators: Option<CardLocators>,
    #[serde(default)]
    pub sponsored: Vec<SponsoredRule>,
}

impl SourceDescriptor {
    /// Per-source task timeout, falling back to `default` when unset.
    #[must_use]
    pub fn timeout(&self, default: Duration) -> Duration {
        self.timeout_secs.map_or(default, Duration::from_secs)
    }

    #[must_use]
    pub fn uses(&self, kind: StrategyKind) -> bool {
        self.strategies.contains(&kind)
    }

    /// This descriptor with any empty locale, `Accept-Language`, or currency
    /// filled from the region defaults. Borrows when nothing is missing.
    #[must_use]
    pub fn with_region_defaults(&self, locale: &str, currency: &str) -> Cow<'_, Self> {
        if !self.locale.is_empty() && !self.accept_language.is_empty() && !self.currency.is_empty()
        {
            return Cow::Borrowed(self);
        }

        let mut source = self.clone();
        if source.locale.is_empty() {
            source.locale = locale.to_string();
        }
        if source.accept_language.is_empty() {
            source.accept_language = match source.locale.split_once('-') {
                Some((language, _)) => format!("{},{language};q=0.9", source.locale),
                None => source.locale.clone(),
            };
        }
        if source.currency.is_empty() {
            source.currency = currency.to_string();
        }
        Cow::Owned(source)
    }
}
