//! `reqwest`-backed implementation of the fetch contract.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use pricescout_core::{AppConfig, SourceDescriptor, SourceQuery, Transport};
use rand::Rng;
use reqwest::{header, Client, StatusCode};

use super::Fetcher;
use crate::error::FetchError;
use crate::retry::retry_with_backoff;
use crate::url::host_of;

/// Unreserved characters (RFC 3986) stay literal; everything else is escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

const QUERY_PLACEHOLDER: &str = "{query}";
const API_KEY_PLACEHOLDER: &str = "{api_key}";

/// Tunables for [`HttpFetcher`], usually taken from [`AppConfig`].
#[derive(Clone)]
pub struct FetchSettings {
    pub request_timeout: Duration,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Upper bound of a random delay before each request; `0` disables it.
    pub jitter_ms: u64,
    /// Key substituted into `{api_key}` for search-API sources.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for FetchSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchSettings")
            .field("request_timeout", &self.request_timeout)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("jitter_ms", &self.jitter_ms)
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

impl From<&AppConfig> for FetchSettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            jitter_ms: config.request_jitter_ms,
            api_key: config.serpapi_api_key.clone(),
        }
    }
}

/// Fetches search pages and search-API payloads over HTTP.
///
/// `browser` sources are served here too, with browser-like navigation
/// headers; inject a different [`Fetcher`] to drive a real browser.
pub struct HttpFetcher {
    client: Client,
    settings: FetchSettings,
}

/// A request URL plus a copy safe to log and embed in errors.
struct SearchTarget {
    url: String,
    display_url: String,
}

impl HttpFetcher {
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the `reqwest::Client` cannot be
    /// built (e.g. invalid TLS configuration).
    pub fn new(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(settings.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(settings.user_agent.as_str())
            .build()?;
        Ok(Self { client, settings })
    }

    fn search_target(
        &self,
        query: &SourceQuery,
        source: &SourceDescriptor,
    ) -> Result<SearchTarget, FetchError> {
        let encoded = utf8_percent_encode(query.text(), QUERY_COMPONENT).to_string();
        let url = source.search_url.replace(QUERY_PLACEHOLDER, &encoded);

        let needs_key =
            source.transport == Transport::SearchApi || url.contains(API_KEY_PLACEHOLDER);
        if !needs_key {
            return Ok(SearchTarget {
                display_url: url.clone(),
                url,
            });
        }

        let Some(key) = self.settings.api_key.as_deref() else {
            return Err(FetchError::NotConfigured {
                source_id: source.id.clone(),
                reason: "no search API key configured".to_string(),
            });
        };
        let key = utf8_percent_encode(key, QUERY_COMPONENT).to_string();
        Ok(SearchTarget {
            display_url: url.replace(API_KEY_PLACEHOLDER, "[redacted]"),
            url: url.replace(API_KEY_PLACEHOLDER, &key),
        })
    }

    fn request(&self, source: &SourceDescriptor, url: &str) -> reqwest::RequestBuilder {
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT_LANGUAGE, &source.accept_language)
            .header(header::CACHE_CONTROL, "no-cache");

        match source.transport {
            Transport::SearchApi => request.header(header::ACCEPT, "application/json"),
            Transport::Http => request.header(header::ACCEPT, HTML_ACCEPT),
            Transport::Browser => request
                .header(header::ACCEPT, HTML_ACCEPT)
                .header(header::UPGRADE_INSECURE_REQUESTS, "1")
                .header("Sec-Fetch-Dest", "document")
                .header("Sec-Fetch-Mode", "navigate")
                .header("Sec-Fetch-Site", "none")
                .header("Sec-Fetch-User", "?1"),
        }
    }

    async fn fetch_once(
        &self,
        source: &SourceDescriptor,
        target: &SearchTarget,
    ) -> Result<String, FetchError> {
        let display_url = || target.display_url.clone();

        let response = self
            .request(source, &target.url)
            .send()
            .await
            .map_err(|e| classify_transport(e, &target.display_url))?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .unwrap_or(0);
            return Err(FetchError::RateLimited {
                url: display_url(),
                retry_after_secs,
            });
        }
        if status == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound { url: display_url() });
        }
        if status == StatusCode::FORBIDDEN || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err(FetchError::Blocked {
                url: display_url(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: display_url(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_transport(e, &target.display_url))?;
        if let Some(marker) = bot_challenge_marker(&body) {
            return Err(FetchError::Blocked {
                url: display_url(),
                reason: format!("challenge page ({marker})"),
            });
        }
        Ok(body)
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        query: &SourceQuery,
        source: &SourceDescriptor,
    ) -> Result<String, FetchError> {
        let target = self.search_target(query, source)?;

        if self.settings.jitter_ms > 0 {
            let delay_ms = rand::rng().random_range(0..=self.settings.jitter_ms);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }

        tracing::debug!(
            source = %source.id,
            region = %query.region(),
            host = %host_of(&target.display_url),
            transport = ?source.transport,
            "fetching search page"
        );

        let body = retry_with_backoff(
            self.settings.max_retries,
            self.settings.retry_backoff_base_ms,
            || self.fetch_once(source, &target),
        )
        .await?;

        tracing::debug!(source = %source.id, bytes = body.len(), "fetched search page");
        Ok(body)
    }
}

fn classify_transport(err: reqwest::Error, display_url: &str) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: display_url.to_owned(),
        }
    } else {
        FetchError::Transport(err.without_url())
    }
}

/// Name of the first anti-bot marker found in `body`, if any.
fn bot_challenge_marker(body: &str) -> Option<&'static str> {
    let lowered = body.to_ascii_lowercase();

    let has_just_a_moment = lowered.contains("just a moment...");
    if lowered.contains("attention required! | cloudflare")
        || lowered.contains("/cdn-cgi/challenge-platform/")
        || (has_just_a_moment
            && (lowered.contains("please enable cookies") || lowered.contains("cf-chl-")))
    {
        return Some("cloudflare");
    }

    const CAPTCHA_MARKERS: [(&str, &str); 5] = [
        ("/errors/validatecaptcha", "captcha"),
        ("enter the characters you see below", "captcha"),
        ("px-captcha", "captcha"),
        ("robot or human?", "robot check"),
        ("are you a robot", "robot check"),
    ];
    CAPTCHA_MARKERS
        .iter()
        .find(|(needle, _)| lowered.contains(needle))
        .map(|(_, name)| *name)
}
