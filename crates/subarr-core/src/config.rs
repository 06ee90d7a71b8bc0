//! Configuration document
//!
//! The deployment supplies a single YAML document: one block per media
//! server (connection info, library lists, pricing), plus global promotion,
//! referral, payment-method, and notification-template sections.

use std::collections::BTreeMap;
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use subarr_types::Quality;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Prices for the four fixed term lengths
///
/// A missing tier means that term is not sold on this plan and is treated as
/// price 0 everywhere.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TierPrices {
    #[serde(rename = "1Month")]
    pub one_month: Option<Decimal>,
    #[serde(rename = "3Month")]
    pub three_month: Option<Decimal>,
    #[serde(rename = "6Month")]
    pub six_month: Option<Decimal>,
    #[serde(rename = "12Month")]
    pub twelve_month: Option<Decimal>,
}

impl TierPrices {
    /// Price for a term length in months; unset and unknown tiers are 0
    pub fn price_for(&self, months: u32) -> Decimal {
        let price = match months {
            1 => self.one_month,
            3 => self.three_month,
            6 => self.six_month,
            12 => self.twelve_month,
            _ => None,
        };
        price.unwrap_or(Decimal::ZERO).round_dp(2)
    }

    /// True if no tier has a positive price
    pub fn is_unpriced(&self) -> bool {
        [1, 3, 6, 12]
            .iter()
            .all(|&m| self.price_for(m) <= Decimal::ZERO)
    }

    /// Tier-by-tier sum of two price tables (batch renewals)
    pub fn add(&self, other: &TierPrices) -> TierPrices {
        let sum = |m: u32| {
            let total = self.price_for(m) + other.price_for(m);
            (total > Decimal::ZERO).then_some(total)
        };
        TierPrices {
            one_month: sum(1),
            three_month: sum(3),
            six_month: sum(6),
            twelve_month: sum(12),
        }
    }
}

/// One media server's configuration block
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Display name; defaults to the map key
    #[serde(default)]
    pub server_name: Option<String>,
    /// Server base URL
    pub base_url: String,
    /// API token
    pub token: String,
    /// Libraries every subscriber gets
    #[serde(default)]
    pub standard_libraries: Vec<String>,
    /// Extra libraries granted on the 4k plan
    #[serde(default)]
    pub optional_libraries: Vec<String>,
    /// Chat role granted to subscribers on this server
    #[serde(default)]
    pub role: Option<String>,
    /// Pricing keyed by quality ("1080p" / "4k")
    #[serde(default)]
    pub pricing: BTreeMap<String, TierPrices>,
}

impl ServerConfig {
    /// Tier prices for a quality; a missing block is an all-zero table
    pub fn tier_prices(&self, quality: Quality) -> TierPrices {
        self.pricing.get(quality.as_key()).cloned().unwrap_or_default()
    }

    /// Section names a subscriber on this plan should have access to
    pub fn sections_for(&self, quality: Quality) -> Vec<String> {
        let mut sections = self.standard_libraries.clone();
        if quality == Quality::FourK {
            sections.extend(self.optional_libraries.iter().cloned());
        }
        sections
    }
}

/// First-purchase promotional prices, keyed server -> quality -> tiers
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Promotions {
    #[serde(default)]
    pub first_time_prices: BTreeMap<String, BTreeMap<String, TierPrices>>,
}

impl Promotions {
    /// Promo price table for a server/quality, if one is configured
    pub fn prices_for(&self, server: &str, quality: Quality) -> Option<&TierPrices> {
        self.first_time_prices.get(server)?.get(quality.as_key())
    }
}

fn default_true() -> bool {
    true
}

fn default_rewards() -> BTreeMap<u32, u32> {
    BTreeMap::from([(1, 7), (3, 14), (6, 30), (12, 60)])
}

/// Referral program configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Referrals {
    /// Whether referral rewards are granted at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Purchased months -> days added to the referrer's subscription
    #[serde(default = "default_rewards")]
    pub rewards_by_months: BTreeMap<u32, u32>,
}

impl Default for Referrals {
    fn default() -> Self {
        Self {
            enabled: true,
            rewards_by_months: default_rewards(),
        }
    }
}

/// SMTP delivery settings (consumed by the notifier implementation)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
}

fn default_smtp_port() -> u16 {
    587
}

fn default_payment_subject() -> String {
    "Subscription Updated".to_string()
}

fn default_payment_body() -> String {
    "Your subscription for {primaryEmail} now ends on {newEndDate}.".to_string()
}

fn default_welcome_subject() -> String {
    "Subscription Created".to_string()
}

fn default_welcome_body() -> String {
    "Your subscription for {primaryEmail} has been created.\nServer: {server}\nLibraries: {section_names}\nEnd: {newEndDate}".to_string()
}

fn default_move_subject() -> String {
    "Subscription Moved".to_string()
}

fn default_move_body() -> String {
    "Your subscription for {primaryEmail} is now on {server}.\nLibraries: {section_names}".to_string()
}

fn default_referral_subject() -> String {
    "Referral bonus applied".to_string()
}

fn default_referral_body() -> String {
    "Thanks for referring {referredEmail}.\nWe extended your subscription from {beforeEnd} to {afterEnd} (+{daysExtended} days).".to_string()
}

/// Subject/body templates for subscriber-facing notifications
///
/// Bodies may use the placeholders `{primaryEmail}`, `{server}`,
/// `{section_names}` and `{newEndDate}`; referral templates additionally use
/// `{referredEmail}`, `{beforeEnd}`, `{afterEnd}` and `{daysExtended}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Notifications {
    #[serde(default = "default_payment_subject")]
    pub payment_subject: String,
    #[serde(default = "default_payment_body")]
    pub payment_body: String,
    #[serde(default = "default_welcome_subject")]
    pub welcome_subject: String,
    #[serde(default = "default_welcome_body")]
    pub welcome_body: String,
    #[serde(default = "default_move_subject")]
    pub move_subject: String,
    #[serde(default = "default_move_body")]
    pub move_body: String,
    #[serde(default = "default_referral_subject")]
    pub referral_subject: String,
    #[serde(default = "default_referral_body")]
    pub referral_body: String,
}

impl Default for Notifications {
    fn default() -> Self {
        Self {
            payment_subject: default_payment_subject(),
            payment_body: default_payment_body(),
            welcome_subject: default_welcome_subject(),
            welcome_body: default_welcome_body(),
            move_subject: default_move_subject(),
            move_body: default_move_body(),
            referral_subject: default_referral_subject(),
            referral_body: default_referral_body(),
        }
    }
}

/// Substitute `{key}` placeholders in a template
pub fn render_template(template: &str, vars: &[(&str, String)]) -> String {
    let mut out = template.to_string();
    for (key, value) in vars {
        out = out.replace(&format!("{{{key}}}"), value);
    }
    out
}

/// Top-level configuration document
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Media servers keyed by short name
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(default)]
    pub promotions: Promotions,
    #[serde(default)]
    pub referrals: Referrals,
    /// Accepted payment methods, surfaced to the onboarding wizard
    #[serde(default)]
    pub payment_methods: Vec<String>,
    #[serde(default)]
    pub notifications: Notifications,
    /// SMTP settings; absent means email delivery is not configured
    #[serde(default)]
    pub email: Option<EmailConfig>,
}

impl Config {
    /// Parse a YAML document
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load and parse a YAML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml(&raw)
    }

    /// Server block by name
    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.get(name)
    }
}
