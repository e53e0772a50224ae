//! Listing-link resolution against a source's base URL.

use reqwest::Url;

/// Resolve a scraped `href` against `base_url`.
///
/// Handles absolute (`https://..`), protocol-relative (`//cdn..`), and
/// relative (`/dp/..`, `item?id=1`) links. Returns an empty string when the
/// link is blank or cannot be resolved, since an offer's URL may be empty.
#[must_use]
pub fn resolve_url(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return String::new();
    }

    if let Ok(absolute) = Url::parse(href) {
        return match absolute.scheme() {
            "http" | "https" => absolute.into(),
            _ => String::new(),
        };
    }

    match Url::parse(base_url).and_then(|base| base.join(href)) {
        Ok(url) => url.into(),
        Err(e) => {
            tracing::debug!(base_url, href, error = %e, "could not resolve listing link");
            String::new()
        }
    }
}

/// Host of `url`, falling back to the input when it does not parse.
#[must_use]
pub(crate) fn host_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .unwrap_or_else(|| url.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: &str = "https://www.amazon.com";

    #[test]
    fn resolves_root_relative_path() {
        assert_eq!(
            resolve_url(BASE, "/dp/B0CHX1W1XY?ref=sr_1_1"),
            "https://www.amazon.com/dp/B0CHX1W1XY?ref=sr_1_1"
        );
    }

    #[test]
    fn resolves_protocol_relative_link() {
        assert_eq!(
            resolve_url(BASE, "//images.example.com/a.jpg"),
            "https://images.example.com/a.jpg"
        );
    }

    #[test]
    fn keeps_absolute_link() {
        assert_eq!(
            resolve_url(BASE, "https://www.walmart.com/ip/123"),
            "https://www.walmart.com/ip/123"
        );
    }

    #[test]
    fn resolves_bare_relative_path() {
        assert_eq!(
            resolve_url("https://www.trendyol.com/sr?q=x", "apple/iphone-p-1"),
            "https://www.trendyol.com/apple/iphone-p-1"
        );
    }

    #[test]
    fn blank_fragment_and_script_links_are_empty() {
        assert_eq!(resolve_url(BASE, "   "), "");
        assert_eq!(resolve_url(BASE, "#"), "");
        assert_eq!(resolve_url(BASE, "javascript:void(0)"), "");
        assert_eq!(resolve_url(BASE, "mailto:a@b.c"), "");
    }

    #[test]
    fn unparseable_base_yields_empty() {
        assert_eq!(resolve_url("not a url", "/dp/1"), "");
    }

    #[test]
    fn host_of_falls_back_to_input() {
        assert_eq!(host_of("https://www.bestbuy.com/site/x"), "www.bestbuy.com");
        assert_eq!(host_of("nonsense"), "nonsense");
    }
}
