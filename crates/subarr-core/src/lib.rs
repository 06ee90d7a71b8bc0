//! Subscription-term and pricing reconciliation engine
//!
//! Given an arbitrary payment amount, the engine infers how many months of
//! service were purchased against tiered per-server pricing (with optional
//! first-purchase promotional prices), apportions any unreconciled
//! remainder, and drives the onboarding, renewal and move workflows that
//! apply the resulting state transitions exactly once per payment event.
//!
//! The record store, media-server provisioning API and notification
//! delivery are collaborators behind traits; see [`context::RuntimeContext`]
//! for how a host application wires them in.

pub mod config;
pub mod context;
pub mod dedup;
pub mod error;
pub mod notify;
pub mod pricing;
pub mod provision;
pub mod referral;
pub mod term;
pub mod workflow;

pub use config::{Config, ConfigError, TierPrices};
pub use context::RuntimeContext;
pub use dedup::PendingOperations;
pub use error::CoreError;
pub use notify::{Notifier, NotifyError};
pub use pricing::PricingCatalog;
pub use provision::{MediaServerClient, ProvisionError, RoleGranter, ServerConnection};
pub use referral::ReferralRewards;
pub use term::{resolve_batch, resolve_term, BatchResolution, TermResolution};
pub use workflow::{
    BatchRenewalPreview, BatchRenewalSelected, IdentityCollected, MoveApplied, MoveOutcome,
    MovePreview, MoveTargetSelected, OnboardingApplied, OnboardingIdentity, OnboardingOutcome,
    OnboardingPreview, PaymentMethodSelected, PlanSelected, QualitySelected, ReferralPreview,
    RenewalApplied, RenewalOutcome, RenewalPreview, RenewalSelected,
};
