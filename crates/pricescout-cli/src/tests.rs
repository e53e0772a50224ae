use std::str::FromStr;

use pricescout_core::{OfferDraft, OfferSource, Region, RegionCatalog};
use pricescout_scraper::{SearchOutcome, SourceReport, SourceStatus};
use rust_decimal::Decimal;

use super::*;

fn offer(name: &str, price: &str, url: &str, in_stock: bool) -> pricescout_core::PriceOffer {
    let mut draft = OfferDraft::new("walmart", "Walmart", "$", OfferSource::StructuredData);
    draft.product_name = Some(name.to_string());
    draft.price = Some(Decimal::from_str(price).expect("decimal"));
    draft.url = url.to_string();
    draft.in_stock = in_stock;
    draft.finish().expect("valid offer")
}

#[test]
fn parses_search_with_defaults() {
    let cli = Cli::try_parse_from(["pricescout-cli", "search", "iphone 16"])
        .expect("expected valid cli args");

    match cli.command {
        Commands::Search {
            query,
            region,
            max_results,
            platforms,
            json,
        } => {
            assert_eq!(query, "iphone 16");
            assert_eq!(region, "us");
            assert_eq!(max_results, 5);
            assert!(platforms.is_empty());
            assert!(!json);
        }
        Commands::Regions => panic!("expected search command"),
    }
}

#[test]
fn parses_search_with_all_flags() {
    let cli = Cli::try_parse_from([
        "pricescout-cli",
        "search",
        "airpods",
        "--region",
        "tr",
        "-n",
        "10",
        "--platforms",
        "trendyol,hepsiburada",
        "--json",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Commands::Search {
            ref region,
            max_results: 10,
            ref platforms,
            json: true,
            ..
        } if region == "tr" && platforms == &["trendyol", "hepsiburada"]
    ));
}

#[test]
fn parses_regions_command() {
    let cli = Cli::try_parse_from(["pricescout-cli", "regions"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Regions));
}

#[test]
fn search_requires_a_query() {
    assert!(Cli::try_parse_from(["pricescout-cli", "search"]).is_err());
}

#[test]
fn offer_line_pads_price_and_marks_stock() {
    let line = search::offer_line(&offer(
        "Apple AirPods 4",
        "129",
        "https://www.walmart.com/ip/1",
        false,
    ));
    assert!(line.starts_with("    129.00 $"), "got: {line}");
    assert!(line.contains("Walmart"));
    assert!(line.contains("Apple AirPods 4  https://www.walmart.com/ip/1"));
    assert!(line.ends_with("(out of stock)"));
}

#[test]
fn render_outcome_lists_offers_and_failed_sources() {
    let outcome = SearchOutcome {
        query: "airpods".to_string(),
        region: Region::Us,
        offers: vec![offer("Apple AirPods 4", "129", "", true)],
        total: 1,
        elapsed_ms: 812,
        sources_searched: vec!["walmart".to_string(), "bestbuy".to_string()],
        sources_used: vec!["walmart".to_string()],
        source_reports: vec![
            SourceReport {
                source_id: "walmart".to_string(),
                status: SourceStatus::Ok { offers: 1 },
                elapsed_ms: 640,
            },
            SourceReport {
                source_id: "bestbuy".to_string(),
                status: SourceStatus::Failed {
                    reason: "blocked by anti-bot protection".to_string(),
                },
                elapsed_ms: 120,
            },
        ],
    };

    let text = search::render_outcome(&outcome);
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "1 result(s) for \"airpods\" in us (812 ms)");
    assert!(lines[1].contains("Apple AirPods 4"));
    assert_eq!(lines[2], "  ! bestbuy: failed: blocked by anti-bot protection");
    assert_eq!(lines.len(), 3);
}

#[test]
fn render_regions_lists_platforms_under_each_region() {
    let text = search::render_regions(&RegionCatalog::builtin().listing());
    assert!(text.contains("tr - Turkey (₺)"));
    assert!(text.contains("trendyol"));
    assert!(text.contains("amazon_de"));
}
