//! Subscriber identity and subscription state

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Unique subscriber identifier assigned by the record store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriberId(pub i64);

impl std::fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SubscriberId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Library/pricing plan quality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Quality {
    /// Standard plan (1080p libraries only)
    #[serde(rename = "1080p")]
    Standard,
    /// 4K plan (standard plus optional libraries)
    #[serde(rename = "4k")]
    FourK,
}

impl Quality {
    /// Config key for this quality's pricing block
    pub fn as_key(&self) -> &'static str {
        match self {
            Self::Standard => "1080p",
            Self::FourK => "4k",
        }
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

impl std::str::FromStr for Quality {
    type Err = crate::SubarrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Legacy records store the 4k flag as "Yes"/"No".
        match s.trim().to_lowercase().as_str() {
            "4k" | "yes" => Ok(Self::FourK),
            "1080p" | "standard" | "no" => Ok(Self::Standard),
            other => Err(crate::SubarrError::InvalidQuality(other.to_string())),
        }
    }
}

/// Subscription status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// Subscription is paid up and provisioned
    Active,
    /// Subscription has lapsed; access may have been revoked
    Inactive,
}

impl std::fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => f.write_str("Active"),
            Self::Inactive => f.write_str("Inactive"),
        }
    }
}

impl std::str::FromStr for SubscriptionStatus {
    type Err = crate::SubarrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            other => Err(crate::SubarrError::InvalidStatus(other.to_string())),
        }
    }
}

/// A subscriber's full record as held by the record store
///
/// Created once at onboarding; mutated by renewals (dates, paid amount,
/// status) and moves (server, quality, paid amount). Never hard-deleted by
/// the workflows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriberRecord {
    /// Record-store id
    pub id: SubscriberId,
    /// Primary email (also the media-server account email)
    pub primary_email: String,
    /// Secondary email, if the subscriber uses a different contact address
    pub secondary_email: Option<String>,
    /// Primary chat handle
    pub primary_chat: Option<String>,
    /// Numeric chat-platform id for DMs and role grants
    pub primary_chat_id: Option<u64>,
    /// Secondary chat handle
    pub secondary_chat: Option<String>,
    /// Name of the person who sends payments (may differ from the handles)
    pub payment_person: Option<String>,
    /// Payment method used (one of the configured methods)
    pub payment_method: Option<String>,
    /// Media server the subscriber is provisioned on
    pub server: String,
    /// Plan quality
    pub quality: Quality,
    /// Subscription status
    pub status: SubscriptionStatus,
    /// Cumulative amount paid over the life of the subscription
    pub paid_amount_total: Decimal,
    /// Date the subscriber first joined
    pub join_date: NaiveDate,
    /// Current period start
    pub start_date: NaiveDate,
    /// Current period end
    pub end_date: NaiveDate,
}

impl SubscriberRecord {
    /// Case-insensitive match against the primary email
    pub fn matches_email(&self, email: &str) -> bool {
        self.primary_email.eq_ignore_ascii_case(email.trim())
    }
}

/// Input for creating a subscriber record
#[derive(Debug, Clone)]
pub struct NewSubscriber {
    pub primary_email: String,
    pub secondary_email: Option<String>,
    pub primary_chat: Option<String>,
    pub primary_chat_id: Option<u64>,
    pub secondary_chat: Option<String>,
    pub payment_person: Option<String>,
    pub payment_method: Option<String>,
    pub server: String,
    pub quality: Quality,
    pub paid_amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
