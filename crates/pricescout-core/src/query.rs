use crate::region::Region;

/// One search request as seen by every source adapter.
///
/// Built once per search and cloned into each source task; there is no
/// mutation API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceQuery {
    text: String,
    region: Region,
    max_results: usize,
    locale: String,
    currency: String,
}

impl SourceQuery {
    #[must_use]
    pub fn new(
        text: impl Into<String>,
        region: Region,
        max_results: usize,
        locale: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            region,
            max_results,
            locale: locale.into(),
            currency: currency.into(),
        }
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn region(&self) -> Region {
        self.region
    }

    #[must_use]
    pub fn max_results(&self) -> usize {
        self.max_results
    }

    /// Region default locale, e.g. `en-US`.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Region default currency symbol or code.
    #[must_use]
    pub fn currency(&self) -> &str {
        &self.currency
    }
}
