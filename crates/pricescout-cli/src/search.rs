//! Command handlers for one-shot searches and catalog listing.

use std::sync::Arc;

use pricescout_core::{AppConfig, PriceOffer, RegionCatalog, RegionListing};
use pricescout_scraper::{
    FetchSettings, HttpFetcher, SearchEngine, SearchOptions, SearchOutcome, SearchRequest,
    SourceStatus,
};

pub(crate) struct SearchArgs {
    pub query: String,
    pub region: String,
    pub max_results: usize,
    pub platforms: Vec<String>,
    pub json: bool,
}

/// Run one search and print it to stdout.
///
/// # Errors
///
/// Returns an error for invalid input (empty query, unknown region or
/// platforms) or when the catalog or HTTP client cannot be built. Failing
/// sources are reported in the output, not as errors.
pub(crate) async fn run_search(config: &AppConfig, args: SearchArgs) -> anyhow::Result<()> {
    let catalog = Arc::new(RegionCatalog::for_config(config)?);
    let fetcher = Arc::new(HttpFetcher::new(FetchSettings::from(config))?);
    let engine = SearchEngine::new(catalog, fetcher, SearchOptions::from(config));

    let mut request = SearchRequest::new(args.query, args.region, args.max_results);
    if !args.platforms.is_empty() {
        request = request.with_sources(args.platforms);
    }
    let outcome = engine.search(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", render_outcome(&outcome));
    }
    Ok(())
}

/// Print the region catalog.
///
/// # Errors
///
/// Returns an error if the regions file configured for the process is invalid.
pub(crate) fn run_regions(config: &AppConfig) -> anyhow::Result<()> {
    let catalog = RegionCatalog::for_config(config)?;
    print!("{}", render_regions(&catalog.listing()));
    Ok(())
}

pub(crate) fn render_outcome(outcome: &SearchOutcome) -> String {
    let mut out = format!(
        "{} result(s) for \"{}\" in {} ({} ms)\n",
        outcome.total, outcome.query, outcome.region, outcome.elapsed_ms
    );
    for offer in &outcome.offers {
        out.push_str(&offer_line(offer));
        out.push('\n');
    }
    for report in &outcome.source_reports {
        let note = match &report.status {
            SourceStatus::Ok { .. } | SourceStatus::Empty => continue,
            SourceStatus::Failed { reason } => format!("failed: {reason}"),
            SourceStatus::TimedOut => "timed out".to_string(),
            SourceStatus::DeadlineExceeded => "abandoned at search deadline".to_string(),
        };
        out.push_str(&format!("  ! {}: {note}\n", report.source_id));
    }
    out
}

/// `price currency  platform  name  url`, with `(out of stock)` appended when
/// the listing says so.
pub(crate) fn offer_line(offer: &PriceOffer) -> String {
    let mut line = format!(
        "{:>10} {:<3} {:<16} {}",
        format!("{:.2}", offer.price()),
        offer.currency(),
        offer.platform_name(),
        offer.product_name()
    );
    if !offer.url().is_empty() {
        line.push_str("  ");
        line.push_str(offer.url());
    }
    if !offer.in_stock() {
        line.push_str("  (out of stock)");
    }
    line
}

pub(crate) fn render_regions(listing: &[RegionListing]) -> String {
    let mut out = String::new();
    for region in listing {
        out.push_str(&format!(
            "{} - {} ({})\n",
            region.region, region.name, region.currency
        ));
        for platform in &region.platforms {
            out.push_str(&format!("    {:<20} {}\n", platform.id, platform.name));
        }
    }
    out
}
