//! Seller-label to platform mapping.

use serde::Serialize;

/// Canonical platform identity: a stable lowercase id plus a display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Platform {
    pub id: String,
    pub name: String,
}

impl Platform {
    fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
        }
    }
}

/// `(keyword, platform id, display name)`, matched case-insensitively as a
/// substring. First match wins, so specific keywords precede generic ones
/// (`amazon.de` before `amazon`, `best buy` before `buy`-like fragments).
const PLATFORM_TABLE: &[(&str, &str, &str)] = &[
    ("amazon.de", "amazon_de", "Amazon DE"),
    ("amazon.com.tr", "amazon_tr", "Amazon TR"),
    ("amazon.co.uk", "amazon_uk", "Amazon UK"),
    ("amazon", "amazon_us", "Amazon US"),
    ("best buy", "bestbuy", "Best Buy"),
    ("bestbuy", "bestbuy", "Best Buy"),
    ("walmart", "walmart", "Walmart"),
    ("target", "target", "Target"),
    ("newegg", "newegg", "Newegg"),
    ("b&h", "bhphoto", "B&H Photo"),
    ("costco", "costco", "Costco"),
    ("ebay", "ebay", "eBay"),
    ("apple", "apple", "Apple"),
    ("samsung", "samsung", "Samsung"),
    ("trendyol", "trendyol", "Trendyol"),
    ("hepsiburada", "hepsiburada", "Hepsiburada"),
    ("n11", "n11", "n11"),
    ("mediamarkt", "mediamarkt", "MediaMarkt"),
    ("media markt", "mediamarkt", "MediaMarkt"),
    ("saturn", "saturn", "Saturn"),
    ("otto.de", "otto", "Otto"),
];

/// Map a free-text seller/source label to a canonical platform.
///
/// Unmatched non-empty labels pass through as `("other", label)`; empty or
/// whitespace-only labels map to `("unknown", "Unknown")`.
#[must_use]
pub fn identify(seller_label: &str) -> Platform {
    let label = seller_label.trim();
    if label.is_empty() {
        return Platform::new("unknown", "Unknown");
    }

    let lowered = label.to_lowercase();
    PLATFORM_TABLE
        .iter()
        .find(|(keyword, _, _)| lowered.contains(keyword))
        .map_or_else(
            || Platform::new("other", label),
            |(_, id, name)| Platform::new(id, name),
        )
}
