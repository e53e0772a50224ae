//! Strategy 3: repeating product cards walked with CSS locators.

use std::str::FromStr;

use pricescout_core::{CardLocators, OfferDraft, OfferSource, SkipReason, SourceDescriptor};
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use super::{price_hint, Candidate};
use crate::parse::{parse_price, parse_rating, parse_review_count};
use crate::url::resolve_url;

/// Compiled form of [`CardLocators`]. Locators that fail to parse are
/// dropped with a `debug` log; the remaining alternatives still apply.
struct CompiledLocators {
    card: Vec<Selector>,
    title: Vec<Selector>,
    brand: Vec<Selector>,
    price: Vec<Selector>,
    price_whole: Vec<Selector>,
    price_fraction: Vec<Selector>,
    link: Vec<Selector>,
    rating: Vec<Selector>,
    review_count: Vec<Selector>,
    image: Vec<Selector>,
    seller: Vec<Selector>,
    out_of_stock: Vec<Selector>,
    sponsored: Vec<(Selector, Option<String>)>,
}

impl CompiledLocators {
    fn new(source: &SourceDescriptor, locators: &CardLocators) -> Self {
        let compile = |list: &[String]| compile_all(&source.id, list);
        Self {
            card: compile(&locators.card),
            title: compile(&locators.title),
            brand: compile(&locators.brand),
            price: compile(&locators.price),
            price_whole: compile(&locators.price_whole),
            price_fraction: compile(&locators.price_fraction),
            link: compile(&locators.link),
            rating: compile(&locators.rating),
            review_count: compile(&locators.review_count),
            image: compile(&locators.image),
            seller: compile(&locators.seller),
            out_of_stock: compile(&locators.out_of_stock),
            sponsored: source
                .sponsored
                .iter()
                .filter_map(|rule| {
                    compile_one(&source.id, &rule.selector)
                        .map(|sel| (sel, rule.text_contains.as_ref().map(|t| t.to_lowercase())))
                })
                .collect(),
        }
    }
}

fn compile_all(source_id: &str, list: &[String]) -> Vec<Selector> {
    list.iter()
        .filter_map(|raw| compile_one(source_id, raw))
        .collect()
}

fn compile_one(source_id: &str, raw: &str) -> Option<Selector> {
    match Selector::parse(raw) {
        Ok(sel) => Some(sel),
        Err(e) => {
            tracing::debug!(source = source_id, locator = raw, error = ?e, "invalid CSS locator");
            None
        }
    }
}

pub(super) fn extract_card_offers(
    source: &SourceDescriptor,
    html: &str,
    scan_limit: usize,
) -> Vec<Candidate> {
    let Some(locators) = source.locators.as_ref() else {
        return Vec::new();
    };
    let compiled = CompiledLocators::new(source, locators);
    let document = Html::parse_document(html);

    // First card locator that matches anything wins.
    let cards: Vec<ElementRef<'_>> = compiled
        .card
        .iter()
        .map(|sel| document.select(sel).collect::<Vec<_>>())
        .find(|found| !found.is_empty())
        .unwrap_or_default();

    if cards.is_empty() {
        tracing::debug!(source = %source.id, "no product cards matched");
    }

    cards
        .into_iter()
        .take(scan_limit)
        .map(|card| parse_card(source, &compiled, card))
        .collect()
}

/// Turn one card into an offer. The advertisement check runs before any
/// other field is read.
fn parse_card(source: &SourceDescriptor, loc: &CompiledLocators, card: ElementRef<'_>) -> Candidate {
    if is_sponsored(loc, card) {
        return Err(SkipReason::Sponsored);
    }

    let mut draft = OfferDraft::new(&source.id, &source.name, &source.currency, OfferSource::Selector);

    let title = first_text(card, &loc.title);
    draft.product_name = match (first_text(card, &loc.brand), title) {
        (Some(brand), Some(title)) if !title.to_lowercase().starts_with(&brand.to_lowercase()) => {
            Some(format!("{brand} {title}"))
        }
        (_, title) => title,
    };

    draft.price = first_parsed(card, &loc.price, |text| {
        parse_price(text, price_hint(source))
    })
    .or_else(|| split_price(card, loc));

    let href = first_element(card, &loc.link)
        .and_then(|a| a.value().attr("href"))
        .or_else(|| card.value().attr("href"));
    if let Some(href) = href {
        draft.url = resolve_url(&source.base_url, href);
    }

    draft.rating = first_parsed_labelled(card, &loc.rating, parse_rating);
    draft.review_count = first_parsed_labelled(card, &loc.review_count, parse_review_count);
    draft.image_url = first_element(card, &loc.image)
        .and_then(|img| {
            let v = img.value();
            v.attr("src")
                .filter(|s| !s.starts_with("data:"))
                .or_else(|| v.attr("data-src"))
        })
        .map(|src| resolve_url(&source.base_url, src));
    draft.seller = first_text(card, &loc.seller);
    draft.in_stock = !loc.out_of_stock.iter().any(|sel| card.select(sel).next().is_some());

    draft.finish()
}

fn is_sponsored(loc: &CompiledLocators, card: ElementRef<'_>) -> bool {
    loc.sponsored.iter().any(|(sel, marker)| {
        card.select(sel).any(|el| match marker {
            None => true,
            Some(marker) => element_text(el).to_lowercase().contains(marker.as_str()),
        })
    })
}

fn element_text(el: ElementRef<'_>) -> String {
    let raw = el.text().collect::<Vec<_>>().join(" ");
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn first_element<'a>(card: ElementRef<'a>, selectors: &[Selector]) -> Option<ElementRef<'a>> {
    selectors.iter().find_map(|sel| card.select(sel).next())
}

/// First non-empty text across the alternative locators.
fn first_text(card: ElementRef<'_>, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| {
        card.select(sel)
            .map(element_text)
            .find(|text| !text.is_empty())
    })
}

/// First locator whose element text parses.
fn first_parsed<T>(
    card: ElementRef<'_>,
    selectors: &[Selector],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    selectors
        .iter()
        .find_map(|sel| card.select(sel).find_map(|el| parse(&element_text(el))))
}

/// Like [`first_parsed`] but prefers the `aria-label`/`title` attribute,
/// where ratings and review counts are often spelled out.
fn first_parsed_labelled<T>(
    card: ElementRef<'_>,
    selectors: &[Selector],
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T> {
    selectors.iter().find_map(|sel| {
        card.select(sel).find_map(|el| {
            let v = el.value();
            v.attr("aria-label")
                .or_else(|| v.attr("title"))
                .and_then(&parse)
                .or_else(|| parse(&element_text(el)))
        })
    })
}

/// Split-price fallback: `<span class="whole">1,049.</span><span class="fraction">99</span>`.
fn split_price(card: ElementRef<'_>, loc: &CompiledLocators) -> Option<Decimal> {
    let whole: String = first_text(card, &loc.price_whole)?
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    if whole.is_empty() {
        return None;
    }
    let fraction: String = first_text(card, &loc.price_fraction)
        .map(|f| f.chars().filter(char::is_ascii_digit).collect())
        .filter(|f: &String| !f.is_empty())
        .unwrap_or_else(|| "00".to_string());

    Decimal::from_str(&format!("{whole}.{fraction}"))
        .ok()
        .filter(|p| *p > Decimal::ZERO)
}
