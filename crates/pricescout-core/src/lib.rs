//! Shared domain model and configuration for pricescout.
//!
//! Holds the canonical [`PriceOffer`] entity, the per-search [`SourceQuery`],
//! the static region/source catalog ([`RegionCatalog`]), the seller-label
//! [`identify`] table, and environment configuration.

pub mod app_config;
mod builtin;
pub mod config;
pub mod error;
pub mod offer;
pub mod platform;
pub mod query;
pub mod region;
pub mod source;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use offer::{product_key, OfferDraft, OfferSource, PriceOffer, SkipReason, DEDUP_KEY_LEN};
pub use platform::{identify, Platform};
pub use query::SourceQuery;
pub use region::{PlatformListing, Region, RegionCatalog, RegionListing, RegionProfile};
pub use source::{CardLocators, SourceDescriptor, SponsoredRule, StrategyKind, Transport};
