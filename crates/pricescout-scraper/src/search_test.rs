use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pricescout_core::{Region, RegionCatalog, RegionProfile, SourceDescriptor, StrategyKind, Transport};
use rust_decimal::Decimal;
use serde_json::json;

use super::*;
use crate::error::FetchError;

// ---------------------------------------------------------------------------
// Stub fetcher
// ---------------------------------------------------------------------------

enum Reply {
    Page(String),
    Fail,
    Hang,
}

struct StubFetcher {
    replies: HashMap<String, Reply>,
    calls: AtomicUsize,
    accept_languages: Mutex<Vec<String>>,
}

impl StubFetcher {
    fn new(replies: Vec<(&str, Reply)>) -> Arc<Self> {
        Arc::new(Self {
            replies: replies
                .into_iter()
                .map(|(id, reply)| (id.to_string(), reply))
                .collect(),
            calls: AtomicUsize::new(0),
            accept_languages: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(
        &self,
        _query: &SourceQuery,
        source: &SourceDescriptor,
    ) -> Result<String, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.accept_languages
            .lock()
            .unwrap()
            .push(source.accept_language.clone());
        match self.replies.get(&source.id) {
            Some(Reply::Page(body)) => Ok(body.clone()),
            Some(Reply::Hang) => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(String::new())
            }
            Some(Reply::Fail) | None => Err(FetchError::Blocked {
                url: source.base_url.clone(),
                reason: "HTTP 403".to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn site(id: &str) -> SourceDescriptor {
    SourceDescriptor {
        id: id.to_string(),
        name: id.to_uppercase(),
        base_url: format!("https://{id}.example.com"),
        search_url: format!("https://{id}.example.com/search?q={{query}}"),
        locale: "en-US".to_string(),
        accept_language: "en-US,en;q=0.9".to_string(),
        currency: "$".to_string(),
        transport: Transport::Http,
        timeout_secs: None,
        strategies: vec![StrategyKind::StructuredData],
        locators: None,
        sponsored: Vec::new(),
    }
}

fn catalog() -> Arc<RegionCatalog> {
    let us = RegionProfile {
        region: Region::Us,
        name: "United States".to_string(),
        locale: "en-US".to_string(),
        currency: "$".to_string(),
        sources: vec![site("alpha"), site("beta"), site("gamma")],
    };
    let tr = RegionProfile {
        region: Region::Tr,
        name: "Turkey".to_string(),
        locale: "tr-TR".to_string(),
        currency: "₺".to_string(),
        sources: Vec::new(),
    };
    Arc::new(RegionCatalog::from_profiles(vec![us, tr]).unwrap())
}

/// A search page carrying one JSON-LD `Product` per `(name, price)` pair.
fn page(items: &[(&str, &str)]) -> Reply {
    let products: Vec<_> = items
        .iter()
        .map(|(name, price)| {
            json!({
                "@context": "https://schema.org",
                "@type": "Product",
                "name": name,
                "offers": {"@type": "Offer", "price": price, "priceCurrency": "USD"}
            })
        })
        .collect();
    Reply::Page(format!(
        r#"<html><head><script type="application/ld+json">{}</script></head><body></body></html>"#,
        serde_json::Value::Array(products)
    ))
}

fn options() -> SearchOptions {
    SearchOptions {
        source_timeout: Duration::from_secs(5),
        deadline: None,
        max_results_limit: 20,
    }
}

fn engine(fetcher: Arc<StubFetcher>, options: SearchOptions) -> SearchEngine {
    SearchEngine::new(catalog(), fetcher, options)
}

fn prices(outcome: &SearchOutcome) -> Vec<Decimal> {
    outcome.offers.iter().map(PriceOffer::price).collect()
}

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn status_of<'a>(outcome: &'a SearchOutcome, id: &str) -> &'a SourceStatus {
    &outcome
        .source_reports
        .iter()
        .find(|r| r.source_id == id)
        .unwrap()
        .status
}

// ---------------------------------------------------------------------------
// Region defaults
// ---------------------------------------------------------------------------

#[tokio::test]
async fn source_without_locale_inherits_region_defaults() {
    let mut bazaar = site("bazaar");
    bazaar.locale.clear();
    bazaar.accept_language.clear();
    bazaar.currency.clear();
    let tr = RegionProfile {
        region: Region::Tr,
        name: "Turkey".to_string(),
        locale: "tr-TR".to_string(),
        currency: "₺".to_string(),
        sources: vec![bazaar],
    };
    let catalog = Arc::new(RegionCatalog::from_profiles(vec![tr]).unwrap());
    let fetcher = StubFetcher::new(vec![("bazaar", page(&[("Türk Kahvesi Makinesi", "1.299,90")]))]);

    let outcome = SearchEngine::new(catalog, fetcher.clone(), options())
        .search(SearchRequest::new("kahve makinesi", "tr", 5))
        .await
        .unwrap();

    let offer = &outcome.offers[0];
    assert_eq!(offer.currency(), "₺");
    assert_eq!(offer.price(), dec("1299.90"));
    assert_eq!(*fetcher.accept_languages.lock().unwrap(), vec!["tr-TR,tr;q=0.9"]);
}

// ---------------------------------------------------------------------------
// Error isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failing_source_does_not_fail_the_search() {
    let fetcher = StubFetcher::new(vec![
        ("alpha", page(&[("Sony WH-1000XM5 Headphones", "348.00")])),
        ("beta", Reply::Fail),
        ("gamma", page(&[("Bose QuietComfort Ultra", "429.00")])),
    ]);
    let outcome = engine(fetcher, options())
        .search(SearchRequest::new("headphones", "us", 10))
        .await
        .unwrap();

    assert_eq!(outcome.offers.len(), 2);
    assert_eq!(outcome.sources_used, vec!["alpha", "gamma"]);
    assert_eq!(outcome.sources_searched, vec!["alpha", "beta", "gamma"]);
    assert!(matches!(status_of(&outcome, "beta"), SourceStatus::Failed { reason } if reason.contains("403")));
    assert_eq!(status_of(&outcome, "alpha"), &SourceStatus::Ok { offers: 1 });
}

#[tokio::test]
async fn slow_source_times_out_without_blocking_others() {
    let fetcher = StubFetcher::new(vec![
        ("alpha", page(&[("Sony WH-1000XM5 Headphones", "348.00")])),
        ("beta", Reply::Hang),
        ("gamma", page(&[("Bose QuietComfort Ultra", "429.00")])),
    ]);
    let opts = SearchOptions {
        source_timeout: Duration::from_millis(100),
        ..options()
    };
    let outcome = engine(fetcher, opts)
        .search(SearchRequest::new("headphones", "us", 10))
        .await
        .unwrap();

    assert_eq!(outcome.sources_used, vec!["alpha", "gamma"]);
    assert_eq!(status_of(&outcome, "beta"), &SourceStatus::TimedOut);
}

#[tokio::test]
async fn overall_deadline_keeps_completed_results() {
    let fetcher = StubFetcher::new(vec![
        ("alpha", page(&[("Sony WH-1000XM5 Headphones", "348.00")])),
        ("beta", Reply::Hang),
        ("gamma", Reply::Hang),
    ]);
    let opts = SearchOptions {
        source_timeout: Duration::from_secs(10),
        deadline: Some(Duration::from_millis(200)),
        ..options()
    };
    let outcome = engine(fetcher, opts)
        .search(SearchRequest::new("headphones", "us", 10))
        .await
        .unwrap();

    assert_eq!(prices(&outcome), vec![dec("348")]);
    assert_eq!(outcome.sources_used, vec!["alpha"]);
    assert_eq!(status_of(&outcome, "beta"), &SourceStatus::DeadlineExceeded);
    assert_eq!(status_of(&outcome, "gamma"), &SourceStatus::DeadlineExceeded);
    assert!(outcome.elapsed_ms < 5_000);
}

#[tokio::test]
async fn empty_page_is_reported_but_not_used() {
    let fetcher = StubFetcher::new(vec![
        ("alpha", Reply::Page("<html><body>No results</body></html>".to_string())),
        ("beta", page(&[("Kindle Paperwhite", "149.99")])),
        ("gamma", Reply::Fail),
    ]);
    let outcome = engine(fetcher, options())
        .search(SearchRequest::new("kindle", "us", 5))
        .await
        .unwrap();

    assert_eq!(status_of(&outcome, "alpha"), &SourceStatus::Empty);
    assert_eq!(outcome.sources_used, vec!["beta"]);
}

// ---------------------------------------------------------------------------
// Merge, dedupe, rank, truncate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn duplicate_products_keep_the_higher_priority_source() {
    let fetcher = StubFetcher::new(vec![
        ("alpha", page(&[("Apple iPhone 16 Pro, 128GB", "999.00")])),
        ("beta", page(&[("apple iphone 16 pro 128gb!!", "949.00")])),
        ("gamma", Reply::Fail),
    ]);
    let outcome = engine(fetcher, options())
        .search(SearchRequest::new("iphone 16 pro", "us", 10))
        .await
        .unwrap();

    assert_eq!(outcome.offers.len(), 1);
    assert_eq!(outcome.offers[0].platform_id(), "alpha");
    assert_eq!(outcome.offers[0].price(), dec("999"));
}

#[tokio::test]
async fn offers_are_ranked_by_price_then_truncated() {
    let replies = || {
        vec![
            ("alpha", page(&[("Phone Model Alpha", "999")])),
            ("beta", page(&[("Phone Model Beta", "899")])),
            ("gamma", page(&[("Phone Model Gamma", "1099")])),
        ]
    };

    let outcome = engine(StubFetcher::new(replies()), options())
        .search(SearchRequest::new("phone", "us", 10))
        .await
        .unwrap();
    assert_eq!(prices(&outcome), vec![dec("899"), dec("999"), dec("1099")]);
    assert_eq!(outcome.total, 3);

    let outcome = engine(StubFetcher::new(replies()), options())
        .search(SearchRequest::new("phone", "us", 2))
        .await
        .unwrap();
    assert_eq!(prices(&outcome), vec![dec("899"), dec("999")]);
    assert_eq!(outcome.total, 2);
}

#[tokio::test]
async fn equal_prices_keep_source_priority_order() {
    let fetcher = StubFetcher::new(vec![
        ("alpha", page(&[("Charger Alpha 65W", "39.99")])),
        ("beta", page(&[("Charger Beta 65W", "39.99")])),
        ("gamma", page(&[("Charger Gamma 65W", "19.99")])),
    ]);
    let outcome = engine(fetcher, options())
        .search(SearchRequest::new("charger", "us", 10))
        .await
        .unwrap();

    let platforms: Vec<_> = outcome.offers.iter().map(PriceOffer::platform_id).collect();
    assert_eq!(platforms, vec!["gamma", "alpha", "beta"]);
}

#[tokio::test]
async fn max_results_is_the_per_source_quota() {
    let fetcher = StubFetcher::new(vec![
        (
            "alpha",
            page(&[
                ("Monitor Model One", "199"),
                ("Monitor Model Two", "149"),
                ("Monitor Model Three", "249"),
            ]),
        ),
        ("beta", Reply::Fail),
        ("gamma", Reply::Fail),
    ]);
    let outcome = engine(fetcher, options())
        .search(SearchRequest::new("monitor", "us", 2))
        .await
        .unwrap();

    assert_eq!(status_of(&outcome, "alpha"), &SourceStatus::Ok { offers: 2 });
    assert_eq!(prices(&outcome), vec![dec("149"), dec("199")]);
}

#[tokio::test]
async fn region_without_sources_returns_empty_outcome() {
    let fetcher = StubFetcher::new(Vec::new());
    let outcome = engine(fetcher, options())
        .search(SearchRequest::new("çay makinesi", "TR", 5))
        .await
        .unwrap();

    assert_eq!(outcome.region, Region::Tr);
    assert!(outcome.offers.is_empty());
    assert!(outcome.sources_searched.is_empty());
}

// ---------------------------------------------------------------------------
// Input errors
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_region_is_an_input_error() {
    let fetcher = StubFetcher::new(vec![("alpha", page(&[("Anything Good", "1")]))]);
    let engine = engine(Arc::clone(&fetcher), options());
    let err = engine
        .search(SearchRequest::new("tv", "mars", 5))
        .await
        .unwrap_err();

    assert_eq!(err, SearchError::UnsupportedRegion("mars".to_string()));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn blank_query_is_rejected() {
    let err = engine(StubFetcher::new(Vec::new()), options())
        .search(SearchRequest::new("   ", "us", 5))
        .await
        .unwrap_err();
    assert_eq!(err, SearchError::EmptyQuery);
}

#[tokio::test]
async fn max_results_must_be_within_limit() {
    let engine = engine(StubFetcher::new(Vec::new()), options());
    for max_results in [0, 21] {
        let err = engine
            .search(SearchRequest::new("tv", "us", max_results))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SearchError::InvalidMaxResults {
                max_results,
                limit: 20
            }
        );
    }
}

#[tokio::test]
async fn source_filter_limits_and_validates_sources() {
    let fetcher = StubFetcher::new(vec![
        ("alpha", page(&[("Laptop Stand Alpha", "29")])),
        ("gamma", page(&[("Laptop Stand Gamma", "25")])),
    ]);
    let engine = engine(Arc::clone(&fetcher), options());

    let outcome = engine
        .search(
            SearchRequest::new("laptop stand", "us", 5)
                .with_sources(vec!["GAMMA".to_string(), "nope".to_string()]),
        )
        .await
        .unwrap();
    assert_eq!(outcome.sources_searched, vec!["gamma"]);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

    let err = engine
        .search(SearchRequest::new("laptop stand", "us", 5).with_sources(vec!["nope".to_string()]))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SearchError::NoMatchingSources {
            requested: "nope".to_string(),
            available: "alpha,beta,gamma".to_string(),
        }
    );
}

#[test]
fn options_from_config_disable_zero_deadline() {
    let mut config = pricescout_core::AppConfig {
        env: pricescout_core::Environment::Test,
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        log_level: "debug".to_string(),
        regions_path: None,
        request_timeout_secs: 15,
        source_timeout_secs: 25,
        search_deadline_secs: 0,
        user_agent: "pricescout-test".to_string(),
        max_retries: 0,
        retry_backoff_base_ms: 0,
        request_jitter_ms: 0,
        max_results_limit: 20,
        serpapi_api_key: None,
    };
    assert_eq!(SearchOptions::from(&config).deadline, None);

    config.search_deadline_secs = 12;
    assert_eq!(
        SearchOptions::from(&config).deadline,
        Some(Duration::from_secs(12))
    );
}
