//! Extraction pipeline: raw markup or JSON in, validated offers out.
//!
//! Runs a source's strategies in its configured order (structured data,
//! embedded script, selectors, or an external search API payload) until the
//! quota is met. Every strategy dedupes against offers already collected in
//! the same run, so a weaker strategy only fills gaps and never replaces an
//! offer found earlier.

mod embed;
mod jsonld;
mod selector;
mod shopping;

use std::collections::HashSet;
use std::str::FromStr;

use pricescout_core::{PriceOffer, SkipReason, SourceDescriptor, StrategyKind};
use rust_decimal::Decimal;

use crate::parse::{parse_price, uses_comma_decimal};

/// The embedded-script strategy only runs while fewer offers than this have
/// been collected.
pub const EMBEDDED_SCRIPT_THRESHOLD: usize = 3;

/// The selector strategy inspects at most `quota * SELECTOR_SCAN_FACTOR` cards.
pub const SELECTOR_SCAN_FACTOR: usize = 4;

/// Typed outcome for one candidate item.
pub(crate) type Candidate = Result<PriceOffer, SkipReason>;

/// One candidate that did not become an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedItem {
    pub strategy: StrategyKind,
    pub reason: SkipReason,
}

/// Offers collected from one raw payload plus every skipped candidate.
#[derive(Debug, Default)]
pub struct ExtractionReport {
    pub offers: Vec<PriceOffer>,
    pub skipped: Vec<SkippedItem>,
}

impl ExtractionReport {
    #[must_use]
    pub fn skip_count(&self, reason: SkipReason) -> usize {
        self.skipped.iter().filter(|s| s.reason == reason).count()
    }
}

/// Run `source`'s strategies over `raw` until `quota` offers are collected.
///
/// Never fails: a strategy that cannot parse the payload contributes nothing
/// and logs at `debug`.
#[must_use]
pub fn extract_offers(source: &SourceDescriptor, raw: &str, quota: usize) -> ExtractionReport {
    let mut collector = Collector::new(quota);

    for &strategy in &source.strategies {
        if collector.is_full() {
            break;
        }

        let candidates = match strategy {
            StrategyKind::StructuredData => jsonld::extract_structured_offers(source, raw),
            StrategyKind::EmbeddedScript => {
                if collector.len() >= EMBEDDED_SCRIPT_THRESHOLD {
                    continue;
                }
                embed::extract_script_offers(source, raw)
            }
            StrategyKind::Selector => {
                selector::extract_card_offers(source, raw, quota.saturating_mul(SELECTOR_SCAN_FACTOR))
            }
            StrategyKind::ExternalApi => shopping::extract_api_offers(source, raw),
        };

        let added = collector.absorb(strategy, candidates);
        tracing::debug!(
            source = %source.id,
            strategy = ?strategy,
            added,
            total = collector.len(),
            "extraction strategy finished"
        );
    }

    collector.finish()
}

struct Collector {
    quota: usize,
    keys: HashSet<String>,
    report: ExtractionReport,
}

impl Collector {
    fn new(quota: usize) -> Self {
        Self {
            quota,
            keys: HashSet::new(),
            report: ExtractionReport::default(),
        }
    }

    fn len(&self) -> usize {
        self.report.offers.len()
    }

    fn is_full(&self) -> bool {
        self.len() >= self.quota
    }

    fn absorb(&mut self, strategy: StrategyKind, candidates: Vec<Candidate>) -> usize {
        let before = self.len();
        for candidate in candidates {
            if self.is_full() {
                break;
            }
            let outcome = candidate.and_then(|offer| {
                if self.keys.insert(offer.dedup_key()) {
                    Ok(offer)
                } else {
                    Err(SkipReason::Duplicate)
                }
            });
            match outcome {
                Ok(offer) => self.report.offers.push(offer),
                Err(reason) => {
                    tracing::debug!(strategy = ?strategy, reason = %reason, "candidate skipped");
                    self.report.skipped.push(SkippedItem { strategy, reason });
                }
            }
        }
        self.len() - before
    }

    fn finish(self) -> ExtractionReport {
        self.report
    }
}

/// Text of a JSON scalar: strings as-is, numbers in their canonical form.
pub(crate) fn json_text(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The hint that forces the comma-decimal convention for `source`, if its
/// currency or locale calls for one.
pub(crate) fn price_hint(source: &SourceDescriptor) -> Option<&str> {
    [source.currency.as_str(), source.locale.as_str()]
        .into_iter()
        .find(|hint| uses_comma_decimal(hint))
}

/// Price from a JSON scalar.
///
/// Numbers are machine-formatted and read directly; strings are display text
/// and go through [`parse_price`] with the source's currency hint.
pub(crate) fn json_price(value: &serde_json::Value, currency_hint: Option<&str>) -> Option<Decimal> {
    match value {
        serde_json::Value::Number(n) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .ok()
                .filter(|p| *p > Decimal::ZERO)
        }
        serde_json::Value::String(s) => parse_price(s, currency_hint),
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use pricescout_core::StrategyKind::{EmbeddedScript, Selector, StructuredData};
    use pricescout_core::{OfferSource, SkipReason};
    use serde_json::json;

    use super::test_support::site_source;
    use super::*;

    fn jsonld_product(name: &str, price: &str) -> String {
        format!(
            r#"<script type="application/ld+json">{{"@type":"Product","name":"{name}","offers":{{"@type":"Offer","price":"{price}"}}}}</script>"#
        )
    }

    fn card(name: &str, price: &str) -> String {
        format!(r#"<div class="card"><a href="/p/1"><span class="title">{name}</span></a><span class="price">{price}</span></div>"#)
    }

    #[test]
    fn weaker_strategy_fills_gaps_without_replacing() {
        let source = site_source(&[StructuredData, Selector], "$");
        let html = format!(
            "<html><head>{}</head><body>{}{}</body></html>",
            jsonld_product("Apple iPhone 16 Pro 128GB", "999.00"),
            card("apple iphone 16 pro, 128gb", "$949.00"),
            card("Samsung Galaxy S25", "$799.99"),
        );

        let report = extract_offers(&source, &html, 5);

        assert_eq!(report.offers.len(), 2);
        assert_eq!(report.offers[0].source(), OfferSource::StructuredData);
        assert_eq!(report.offers[0].price(), Decimal::from(999));
        assert_eq!(report.offers[1].product_name(), "Samsung Galaxy S25");
        assert_eq!(report.offers[1].source(), OfferSource::Selector);
        assert_eq!(report.skip_count(SkipReason::Duplicate), 1);
    }

    #[test]
    fn stops_once_quota_is_met() {
        let source = site_source(&[StructuredData, Selector], "$");
        let html = format!(
            "{}{}{}",
            jsonld_product("First Widget", "10"),
            jsonld_product("Second Widget", "20"),
            card("Third Widget", "$30"),
        );

        let report = extract_offers(&source, &html, 2);

        assert_eq!(report.offers.len(), 2);
        assert!(report
            .offers
            .iter()
            .all(|o| o.source() == OfferSource::StructuredData));
    }

    #[test]
    fn embedded_script_skipped_at_threshold() {
        let source = site_source(&[StructuredData, EmbeddedScript], "$");
        let mut html: String = ["Alpha Phone", "Beta Phone", "Gamma Phone"]
            .iter()
            .map(|n| jsonld_product(n, "100"))
            .collect();
        html.push_str(r#"<script>window.__DATA__ = {"name":"Delta Phone","price":55};</script>"#);

        let report = extract_offers(&source, &html, 10);

        assert_eq!(report.offers.len(), EMBEDDED_SCRIPT_THRESHOLD);
        assert!(report.offers.iter().all(|o| o.product_name() != "Delta Phone"));
    }

    #[test]
    fn embedded_script_runs_below_threshold() {
        let source = site_source(&[StructuredData, EmbeddedScript], "$");
        let html = format!(
            "{}{}",
            jsonld_product("Alpha Phone", "100"),
            r#"<script>window.__DATA__ = {"name":"Delta Phone","price":55};</script>"#
        );

        let report = extract_offers(&source, &html, 10);

        let names: Vec<&str> = report.offers.iter().map(PriceOffer::product_name).collect();
        assert_eq!(names, ["Alpha Phone", "Delta Phone"]);
        assert_eq!(report.offers[1].source(), OfferSource::EmbeddedScript);
    }

    #[test]
    fn garbage_input_yields_empty_report() {
        let source = site_source(&[StructuredData, EmbeddedScript, Selector], "$");
        let report = extract_offers(&source, "\u{0}<<<not html{{[", 5);
        assert!(report.offers.is_empty());
    }

    #[test]
    fn zero_quota_collects_nothing() {
        let source = site_source(&[StructuredData], "$");
        let report = extract_offers(&source, &jsonld_product("Some Widget", "10"), 0);
        assert!(report.offers.is_empty());
    }

    #[test]
    fn price_hint_prefers_currency_then_locale() {
        let mut source = site_source(&[Selector], "₺");
        assert_eq!(price_hint(&source), Some("₺"));

        source.currency = "€".to_string();
        source.locale = "de-DE".to_string();
        assert_eq!(price_hint(&source), Some("de-DE"));

        source.locale = "en-US".to_string();
        assert_eq!(price_hint(&source), None);
    }

    #[test]
    fn json_price_reads_numbers_without_locale_hint() {
        assert_eq!(json_price(&json!(1049.99), Some("₺")), Decimal::from_str("1049.99").ok());
        assert_eq!(json_price(&json!("1.049,99 TL"), Some("₺")), Decimal::from_str("1049.99").ok());
        assert_eq!(json_price(&json!(0), None), None);
        assert_eq!(json_price(&json!(null), None), None);
    }
}
