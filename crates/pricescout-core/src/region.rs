//! Region routing: which sources serve which market.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::source::{SourceDescriptor, StrategyKind, Transport};
use crate::{AppConfig, ConfigError, CoreError};

/// A market context determining currency, locale, and applicable sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Us,
    Tr,
    Eu,
}

impl Region {
    pub const ALL: [Region; 3] = [Region::Us, Region::Tr, Region::Eu];

    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Region::Us => "us",
            Region::Tr => "tr",
            Region::Eu => "eu",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Region {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "us" => Ok(Region::Us),
            "tr" => Ok(Region::Tr),
            "eu" => Ok(Region::Eu),
            _ => Err(CoreError::UnsupportedRegion(s.to_string())),
        }
    }
}

/// Static configuration for one region: defaults plus its ordered sources.
///
/// Source order is priority order: it decides which offer survives when two
/// sources return the same product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionProfile {
    pub region: Region,
    pub name: String,
    pub locale: String,
    pub currency: String,
    pub sources: Vec<SourceDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RegionsFile {
    regions: Vec<RegionProfile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlatformListing {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegionListing {
    pub region: Region,
    pub name: String,
    pub currency: String,
    pub platforms: Vec<PlatformListing>,
}

/// Read-only region/source table, built once at startup.
#[derive(Debug, Clone)]
pub struct RegionCatalog {
    regions: Vec<RegionProfile>,
}

impl RegionCatalog {
    /// The catalog compiled into the binary.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            regions: crate::builtin::builtin_regions(),
        }
    }

    /// Build a catalog from explicit profiles after validating them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRegions`] when the profiles are inconsistent.
    pub fn from_profiles(regions: Vec<RegionProfile>) -> Result<Self, ConfigError> {
        validate_profiles(&regions)?;
        Ok(Self { regions })
    }

    /// Parse and validate a YAML catalog (`regions: [...]`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the YAML cannot be parsed or fails validation.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let file: RegionsFile = serde_yaml::from_str(content)?;
        Self::from_profiles(file.regions)
    }

    /// Load a YAML catalog from disk.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or validated.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::RegionsFileIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_yaml_str(&content)
    }

    /// The catalog a process should serve: the YAML file named by
    /// `regions_path` (or the built-in table), minus search-API sources when
    /// no API key is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the regions file cannot be loaded.
    pub fn for_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let catalog = match &config.regions_path {
            Some(path) => Self::load(path)?,
            None => Self::builtin(),
        };
        Ok(if config.serpapi_api_key.is_some() {
            catalog
        } else {
            catalog.without_transport(Transport::SearchApi)
        })
    }

    /// Drop every source using `transport`, e.g. search APIs when no key is set.
    #[must_use]
    pub fn without_transport(mut self, transport: Transport) -> Self {
        for profile in &mut self.regions {
            profile.sources.retain(|s| s.transport != transport);
        }
        self
    }

    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedRegion`] when the region has no profile.
    pub fn profile(&self, region: Region) -> Result<&RegionProfile, CoreError> {
        self.regions
            .iter()
            .find(|p| p.region == region)
            .ok_or_else(|| CoreError::UnsupportedRegion(region.code().to_string()))
    }

    /// Ordered source descriptors for a region.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnsupportedRegion`] when the region has no profile.
    pub fn sources_for(&self, region: Region) -> Result<&[SourceDescriptor], CoreError> {
        self.profile(region).map(|p| p.sources.as_slice())
    }

    pub fn regions(&self) -> impl Iterator<Item = Region> + '_ {
        self.regions.iter().map(|p| p.region)
    }

    /// Discovery view: regions and their source ids/names.
    #[must_use]
    pub fn listing(&self) -> Vec<RegionListing> {
        self.regions
            .iter()
            .map(|p| RegionListing {
                region: p.region,
                name: p.name.clone(),
                currency: p.currency.clone(),
                platforms: p
                    .sources
                    .iter()
                    .map(|s| PlatformListing {
                        id: s.id.clone(),
                        name: s.name.clone(),
                    })
                    .collect(),
            })
            .collect()
    }
}

fn validate_profiles(regions: &[RegionProfile]) -> Result<(), ConfigError> {
    let mut errors = Vec::new();
    let mut seen_regions = HashSet::new();

    for profile in regions {
        if !seen_regions.insert(profile.region) {
            errors.push(format!("duplicate region '{}'", profile.region));
        }

        let mut seen_sources = HashSet::new();
        for source in &profile.sources {
            let label = format!("{}/{}", profile.region, source.id);
            if source.id.trim().is_empty() {
                errors.push(format!("region '{}' has a source with an empty id", profile.region));
            }
            if !seen_sources.insert(source.id.as_str()) {
                errors.push(format!("duplicate source id '{label}'"));
            }
            if !source.search_url.contains("{query}") {
                errors.push(format!("{label}: search_url has no {{query}} placeholder"));
            }
            if source.strategies.is_empty() {
                errors.push(format!("{label}: no extraction strategies"));
            }
            if source.uses(StrategyKind::Selector) {
                match &source.locators {
                    None => errors.push(format!("{label}: selector strategy requires locators")),
                    Some(l) => {
                        if l.card.is_empty() || l.title.is_empty() {
                            errors.push(format!("{label}: locators need card and title entries"));
                        }
                        if l.price.is_empty() && l.price_whole.is_empty() {
                            errors.push(format!("{label}: locators need a price entry"));
                        }
                    }
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::InvalidRegions(errors.join("; ")))
    }
}
