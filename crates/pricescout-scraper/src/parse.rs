//! Locale-aware price, rating, and review-count parsing.
//!
//! All functions are pure and total: malformed input yields `None`, never a
//! panic. "No price" is an expected outcome for a card, not a fault.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Currency hints whose prices always use `.` for thousands and `,` for decimals.
const COMMA_DECIMAL_CURRENCIES: [&str; 3] = ["₺", "TL", "TRY"];

/// Locale languages that write prices as `1.049,99`. Matched against the
/// language subtag of hints such as `de-DE` or `tr_TR`.
const COMMA_DECIMAL_LANGUAGES: [&str; 7] = ["de", "tr", "fr", "es", "it", "nl", "pt"];

static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("valid regex"));

static REVIEW_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d.,]*)\s*([kKmM])?\b").expect("valid regex"));

/// Parse a displayed price such as `"$1,049.99"`, `"1.049,99 €"`, or `"42.999 TL"`.
///
/// Everything except digits, `.` and `,` is discarded, then:
/// - both separators present: whichever appears last is the decimal point;
/// - only `,`: decimal when exactly two digits follow the last comma,
///   otherwise a thousands separator;
/// - only `.`: a single dot is a decimal point, repeated dots are thousands
///   separators.
///
/// A hint of `₺`, `TL`, `TRY`, or a comma-decimal locale such as `de-DE`
/// forces the comma-decimal convention regardless of position, so `"1.049 €"`
/// under `de-DE` is 1049. Non-positive results are `None`.
#[must_use]
pub fn parse_price(text: &str, currency_hint: Option<&str>) -> Option<Decimal> {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == ',')
        .collect();
    if !cleaned.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    let decimal_sep = if currency_hint.is_some_and(uses_comma_decimal) {
        Some(',')
    } else {
        infer_decimal_separator(&cleaned)
    };

    let normalized = keep_last_separator(&cleaned, decimal_sep);
    let normalized = normalized.trim_end_matches('.');
    let normalized = if normalized.starts_with('.') {
        format!("0{normalized}")
    } else {
        normalized.to_string()
    };

    Decimal::from_str(&normalized)
        .ok()
        .filter(|price| *price > Decimal::ZERO)
}

/// Whether `hint`, a currency or a locale tag, forces the comma-decimal
/// convention.
pub(crate) fn uses_comma_decimal(hint: &str) -> bool {
    let hint = hint.trim();
    if COMMA_DECIMAL_CURRENCIES
        .iter()
        .any(|c| hint.eq_ignore_ascii_case(c))
    {
        return true;
    }
    hint.split_once(['-', '_']).is_some_and(|(language, _)| {
        COMMA_DECIMAL_LANGUAGES
            .iter()
            .any(|l| language.eq_ignore_ascii_case(l))
    })
}

fn infer_decimal_separator(cleaned: &str) -> Option<char> {
    match (cleaned.rfind('.'), cleaned.rfind(',')) {
        (Some(dot), Some(comma)) => Some(if dot > comma { '.' } else { ',' }),
        (None, Some(comma)) => {
            let trailing = &cleaned[comma + 1..];
            (trailing.len() == 2 && trailing.bytes().all(|b| b.is_ascii_digit())).then_some(',')
        }
        (Some(_), None) => (cleaned.matches('.').count() == 1).then_some('.'),
        (None, None) => None,
    }
}

/// Drop every separator except the last occurrence of `decimal_sep`, which
/// becomes `.`.
fn keep_last_separator(cleaned: &str, decimal_sep: Option<char>) -> String {
    let decimal_at = decimal_sep.and_then(|sep| cleaned.rfind(sep));
    cleaned
        .char_indices()
        .filter_map(|(i, c)| {
            if c.is_ascii_digit() {
                Some(c)
            } else if Some(i) == decimal_at {
                Some('.')
            } else {
                None
            }
        })
        .collect()
}

/// Parse a star rating such as `"4.5 out of 5 stars"` or `"4,5 von 5 Sternen"`.
///
/// Takes the first number in the text and keeps it only within `0.0..=5.0`.
#[must_use]
pub fn parse_rating(text: &str) -> Option<f32> {
    let m = RATING_RE.find(text)?;
    m.as_str()
        .replace(',', ".")
        .parse::<f32>()
        .ok()
        .filter(|r| (0.0..=5.0).contains(r))
}

/// Parse a review count such as `"(1,234)"`, `"2.345 Bewertungen"`, or `"1.2K"`.
///
/// Separators are stripped unless a `K`/`M` suffix follows, in which case the
/// number is read as a decimal and scaled.
#[must_use]
pub fn parse_review_count(text: &str) -> Option<u32> {
    let caps = REVIEW_COUNT_RE.captures(text)?;
    let number = caps.get(1)?.as_str().trim_end_matches(['.', ',']);

    let Some(suffix) = caps.get(2) else {
        let digits: String = number.chars().filter(char::is_ascii_digit).collect();
        return digits.parse::<u32>().ok();
    };

    let multiplier = match suffix.as_str() {
        "k" | "K" => Decimal::from(1_000u32),
        _ => Decimal::from(1_000_000u32),
    };
    let value = Decimal::from_str(&number.replace(',', ".")).ok()?;
    value.checked_mul(multiplier)?.trunc().to_u32()
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
