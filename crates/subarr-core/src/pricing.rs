//! Pricing catalog
//!
//! Read-only view over the configuration: per-server/per-quality tier
//! prices, first-purchase promo prices, and the section lists a plan grants.

use std::sync::Arc;

use subarr_types::Quality;

use crate::config::{Config, ServerConfig, TierPrices};
use crate::error::CoreError;

/// Resolves prices and plan sections from configuration
#[derive(Clone)]
pub struct PricingCatalog {
    config: Arc<Config>,
}

impl PricingCatalog {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }

    /// Server block, or `ServerNotConfigured`
    pub fn server(&self, name: &str) -> Result<&ServerConfig, CoreError> {
        self.config
            .server(name)
            .ok_or_else(|| CoreError::ServerNotConfigured(name.to_string()))
    }

    /// Standard tier prices; an unknown server or missing plan yields an
    /// all-zero table rather than an error, callers decide whether that is
    /// fatal
    pub fn tier_prices(&self, server: &str, quality: Quality) -> TierPrices {
        self.config
            .server(server)
            .map(|s| s.tier_prices(quality))
            .unwrap_or_default()
    }

    /// First-purchase promo table, if configured
    pub fn promo_prices(&self, server: &str, quality: Quality) -> Option<TierPrices> {
        self.config.promotions.prices_for(server, quality).cloned()
    }

    /// Section names a plan grants (standard libraries, plus optional
    /// libraries on the 4k plan)
    pub fn sections_for(&self, server: &str, quality: Quality) -> Result<Vec<String>, CoreError> {
        Ok(self.server(server)?.sections_for(quality))
    }

    /// Tier-by-tier sum across several plans, for batch renewals
    pub fn summed_tier_prices(&self, plans: &[(&str, Quality)]) -> TierPrices {
        plans.iter().fold(TierPrices::default(), |acc, (server, quality)| {
            acc.add(&self.tier_prices(server, *quality))
        })
    }
}

impl std::fmt::Debug for PricingCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PricingCatalog")
            .field("servers", &self.config.servers.keys())
            .finish()
    }
}
