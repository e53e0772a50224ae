//! Region catalog compiled into the binary.
//!
//! Overridable at startup with `PRICESCOUT_REGIONS_PATH`.

use crate::region::{Region, RegionProfile};
use crate::source::{CardLocators, SourceDescriptor, SponsoredRule, StrategyKind, Transport};

const SITE_STRATEGIES: [StrategyKind; 3] = [
    StrategyKind::StructuredData,
    StrategyKind::EmbeddedScript,
    StrategyKind::Selector,
];

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

struct Site<'a> {
    id: &'a str,
    name: &'a str,
    base_url: &'a str,
    search_path: &'a str,
    locale: &'a str,
    accept_language: &'a str,
    currency: &'a str,
}

fn site(s: &Site<'_>, transport: Transport, locators: CardLocators) -> SourceDescriptor {
    SourceDescriptor {
        id: s.id.to_string(),
        name: s.name.to_string(),
        base_url: s.base_url.to_string(),
        search_url: format!("{}{}", s.base_url, s.search_path),
        locale: s.locale.to_string(),
        accept_language: s.accept_language.to_string(),
        currency: s.currency.to_string(),
        transport,
        timeout_secs: (transport == Transport::Browser).then_some(20),
        strategies: SITE_STRATEGIES.to_vec(),
        locators: Some(locators),
        sponsored: Vec::new(),
    }
}

fn google_shopping(
    id: &str,
    name: &str,
    gl: &str,
    hl: &str,
    locale: &str,
    currency: &str,
) -> SourceDescriptor {
    SourceDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        base_url: "https://www.google.com".to_string(),
        search_url: format!(
            "https://serpapi.com/search.json?engine=google_shopping&q={{query}}&gl={gl}&hl={hl}&api_key={{api_key}}"
        ),
        locale: locale.to_string(),
        accept_language: format!("{locale},{hl};q=0.9"),
        currency: currency.to_string(),
        transport: Transport::SearchApi,
        timeout_secs: None,
        strategies: vec![StrategyKind::ExternalApi],
        locators: None,
        sponsored: Vec::new(),
    }
}

fn amazon_locators(rating_marker: &str, reviews_marker: &str) -> CardLocators {
    CardLocators {
        card: list(&[r#"[data-component-type="s-search-result"]"#]),
        title: list(&["h2 a span", "h2 span"]),
        price: list(&[".a-price:not(.a-text-price) .a-offscreen"]),
        price_whole: list(&[".a-price:not(.a-text-price) .a-price-whole"]),
        price_fraction: list(&[".a-price:not(.a-text-price) .a-price-fraction"]),
        link: list(&["h2 a", "a.a-link-normal.s-no-outline"]),
        rating: vec![format!(r#"[aria-label*="{rating_marker}"]"#)],
        review_count: vec![
            format!(r#"[aria-label*="{reviews_marker}"]"#),
            ".s-link-style .s-underline-text".to_string(),
        ],
        image: list(&["img.s-image"]),
        seller: list(&[".a-row.a-size-base.a-color-secondary .a-size-base"]),
        ..CardLocators::default()
    }
}

fn amazon_sponsored(marker: &str) -> Vec<SponsoredRule> {
    vec![
        SponsoredRule {
            selector: ".s-label-popover-default".to_string(),
            text_contains: Some(marker.to_string()),
        },
        SponsoredRule {
            selector: ".puis-sponsored-label-text".to_string(),
            text_contains: None,
        },
    ]
}

fn amazon_us() -> SourceDescriptor {
    let mut source = site(
        &Site {
            id: "amazon_us",
            name: "Amazon US",
            base_url: "https://www.amazon.com",
            search_path: "/s?k={query}",
            locale: "en-US",
            accept_language: "en-US,en;q=0.9",
            currency: "$",
        },
        Transport::Browser,
        amazon_locators("out of 5 stars", "ratings"),
    );
    source.sponsored = amazon_sponsored("Sponsored");
    source
}

fn amazon_de() -> SourceDescriptor {
    let mut source = site(
        &Site {
            id: "amazon_de",
            name: "Amazon DE",
            base_url: "https://www.amazon.de",
            search_path: "/s?k={query}",
            locale: "de-DE",
            accept_language: "de-DE,de;q=0.9,en;q=0.8",
            currency: "€",
        },
        Transport::Browser,
        amazon_locators("von 5 Sternen", "Bewertungen"),
    );
    source.sponsored = amazon_sponsored("Gesponsert");
    source
}

fn walmart() -> SourceDescriptor {
    site(
        &Site {
            id: "walmart",
            name: "Walmart",
            base_url: "https://www.walmart.com",
            search_path: "/search?q={query}",
            locale: "en-US",
            accept_language: "en-US,en;q=0.9",
            currency: "$",
        },
        Transport::Http,
        CardLocators {
            card: list(&["[data-item-id]"]),
            title: list(&[r#"[data-automation-id="product-title"]"#, "a span"]),
            price: list(&[
                r#"[data-automation-id="product-price"] .f2"#,
                r#"[itemprop="price"]"#,
            ]),
            link: list(&[r#"a[href*="/ip/"]"#, "a"]),
            image: list(&[r#"img[data-testid="productTileImage"]"#, "img"]),
            out_of_stock: list(&[r#"[data-automation-id="out-of-stock"]"#]),
            ..CardLocators::default()
        },
    )
}

fn bestbuy() -> SourceDescriptor {
    site(
        &Site {
            id: "bestbuy",
            name: "Best Buy",
            base_url: "https://www.bestbuy.com",
            search_path: "/site/searchpage.jsp?st={query}",
            locale: "en-US",
            accept_language: "en-US,en;q=0.9",
            currency: "$",
        },
        Transport::Http,
        CardLocators {
            card: list(&[".sku-item", r#"[class*="sku-item"]"#]),
            title: list(&[".sku-title a", "h4 a"]),
            price: list(&[
                ".priceView-customer-price span",
                r#"[data-testid="customer-price"] span"#,
            ]),
            link: list(&[".sku-title a", "h4 a"]),
            rating: list(&[".c-ratings-reviews .visually-hidden"]),
            review_count: list(&[".c-reviews"]),
            image: list(&["img.product-image"]),
            out_of_stock: list(&[r#"button[data-button-state="SOLD_OUT"]"#]),
            ..CardLocators::default()
        },
    )
}

fn trendyol() -> SourceDescriptor {
    site(
        &Site {
            id: "trendyol",
            name: "Trendyol",
            base_url: "https://www.trendyol.com",
            search_path: "/sr?q={query}",
            locale: "tr-TR",
            accept_language: "tr-TR,tr;q=0.9,en;q=0.8",
            currency: "₺",
        },
        Transport::Http,
        CardLocators {
            card: list(&[".p-card-wrppr", r#"[class*="prdct-cntnr"]"#]),
            title: list(&[".prdct-desc-cntnr-name"]),
            brand: list(&[".prdct-desc-cntnr-ttl"]),
            price: list(&[".prc-box-dscntd", ".prc-box-sllng"]),
            link: list(&["a"]),
            rating: list(&[".rating-score"]),
            review_count: list(&[".ratingCount"]),
            image: list(&["img.p-card-img", "img"]),
            ..CardLocators::default()
        },
    )
}

fn hepsiburada() -> SourceDescriptor {
    site(
        &Site {
            id: "hepsiburada",
            name: "Hepsiburada",
            base_url: "https://www.hepsiburada.com",
            search_path: "/ara?q={query}",
            locale: "tr-TR",
            accept_language: "tr-TR,tr;q=0.9,en;q=0.8",
            currency: "₺",
        },
        Transport::Http,
        CardLocators {
            card: list(&[
                r#"[data-test-id="product-card-item"]"#,
                ".productListContent-item",
            ]),
            title: list(&[r#"[data-test-id="product-card-name"]"#, "h3"]),
            price: list(&[
                r#"[data-test-id="price-current-price"]"#,
                ".product-price",
            ]),
            link: list(&["a"]),
            image: list(&["img"]),
            ..CardLocators::default()
        },
    )
}

pub(crate) fn builtin_regions() -> Vec<RegionProfile> {
    vec![
        RegionProfile {
            region: Region::Us,
            name: "United States".to_string(),
            locale: "en-US".to_string(),
            currency: "$".to_string(),
            sources: vec![
                amazon_us(),
                walmart(),
                bestbuy(),
                google_shopping("google_shopping_us", "Google Shopping US", "us", "en", "en-US", "$"),
            ],
        },
        RegionProfile {
            region: Region::Tr,
            name: "Turkey".to_string(),
            locale: "tr-TR".to_string(),
            currency: "₺".to_string(),
            sources: vec![
                trendyol(),
                hepsiburada(),
                google_shopping("google_shopping_tr", "Google Shopping TR", "tr", "tr", "tr-TR", "₺"),
            ],
        },
        RegionProfile {
            region: Region::Eu,
            name: "Europe".to_string(),
            locale: "de-DE".to_string(),
            currency: "€".to_string(),
            sources: vec![
                amazon_de(),
                google_shopping("google_shopping_de", "Google Shopping DE", "de", "de", "de-DE", "€"),
            ],
        },
    ]
}
