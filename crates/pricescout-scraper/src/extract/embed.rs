//! Strategy 2: name/price pairs inside inline `<script>` payloads.
//!
//! Many storefronts hydrate their result grid from a JSON blob assigned in an
//! inline script. The blob's shape differs per site and per deploy, so this
//! strategy pattern-matches a name field followed by a price field within the
//! same object rather than deserializing a fixed schema.

use std::str::FromStr;
use std::sync::LazyLock;

use pricescout_core::{OfferDraft, OfferSource, SourceDescriptor};
use regex::Regex;
use rust_decimal::Decimal;

use super::{price_hint, Candidate};
use crate::parse::parse_price;
use crate::url::resolve_url;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b([^>]*)>(.*?)</script>").expect("valid regex")
});

// A name-like key, then (without leaving the object) a price-like key whose
// value is a number, a quoted string, or a small object holding the amount.
static PAIR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r#""(?:name|title|productName|displayName)"\s*:\s*"((?:[^"\\]|\\.){3,}?)""#,
        r#"[^{}]*?"#,
        r#""(?:price|salePrice|sellingPrice|currentPrice|discountedPrice|finalPrice)"\s*:\s*"#,
        r#"(?:\{[^{}]*?"(?:value|amount|price|sellingPrice)"\s*:\s*)?"#,
        r#"(")?[^0-9"{},\-]{0,4}(-?[0-9][0-9.,]*)"#,
    ))
    .expect("valid regex")
});

static URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:url|productUrl|canonicalUrl|href|link)"\s*:\s*"((?:[^"\\]|\\.)+?)""#)
        .expect("valid regex")
});

static IMAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(?:image|imageUrl|thumbnail|thumbnailUrl)"\s*:\s*"((?:[^"\\]|\\.)+?)""#)
        .expect("valid regex")
});

pub(super) fn extract_script_offers(source: &SourceDescriptor, html: &str) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    for cap in SCRIPT_RE.captures_iter(html) {
        let attrs = cap.get(1).map_or("", |m| m.as_str());
        if attrs.to_ascii_lowercase().contains("ld+json") {
            continue;
        }
        let Some(content) = cap.get(2).map(|m| m.as_str()) else {
            continue;
        };
        if content.trim().is_empty() {
            continue;
        }

        for pair in PAIR_RE.captures_iter(content) {
            let (Some(whole), Some(name), Some(price)) = (pair.get(0), pair.get(1), pair.get(3))
            else {
                continue;
            };
            let quoted = pair.get(2).is_some();
            let object_rest = object_tail(&content[whole.start()..]);

            let mut draft = OfferDraft::new(
                &source.id,
                &source.name,
                &source.currency,
                OfferSource::EmbeddedScript,
            );
            draft.product_name = Some(unescape(name.as_str()));
            draft.price = embedded_price(source, price.as_str(), quoted);
            if let Some(url) = first_capture(&URL_RE, object_rest) {
                draft.url = resolve_url(&source.base_url, &unescape(url));
            }
            draft.image_url = first_capture(&IMAGE_RE, object_rest)
                .map(|img| resolve_url(&source.base_url, &unescape(img)));

            candidates.push(draft.finish());
        }
    }

    candidates
}

/// Read a captured price value. A leading minus keeps its sign so the
/// offer is rejected as an invalid price. Quoted values get the source's
/// comma-decimal hint only when they contain a comma, since `"4299.90"` is
/// machine-formatted even on a lira storefront.
fn embedded_price(source: &SourceDescriptor, raw: &str, quoted: bool) -> Option<Decimal> {
    if let Some(magnitude) = raw.strip_prefix('-') {
        return embedded_price(source, magnitude, quoted).map(|p| -p);
    }
    if !quoted {
        return Decimal::from_str(raw.trim_end_matches(['.', ','])).ok();
    }
    let hint = if raw.contains(',') { price_hint(source) } else { None };
    parse_price(raw, hint)
}

fn first_capture<'a>(re: &Regex, haystack: &'a str) -> Option<&'a str> {
    re.captures(haystack)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// The remainder of the JSON object that starts somewhere inside `s`: every
/// character up to the `}` closing the current object, honouring nested
/// brackets and string literals.
fn object_tail(s: &str) -> &str {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth < 0 {
                    return &s[..i];
                }
            }
            _ => {}
        }
    }
    s
}

/// Decode JSON string escapes (`\"`, `\u00e7`, `\/`), keeping the raw text
/// when it is not a valid JSON string body.
fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}
