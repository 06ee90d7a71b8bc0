//! Core errors

use rust_decimal::Decimal;
use thiserror::Error;

use subarr_store::StoreError;

use crate::notify::NotifyError;
use crate::provision::ProvisionError;

/// Errors surfaced by the workflows
///
/// Term-resolution and configuration failures always precede any side
/// effect. External-service failures (provisioning, notification, audit) are
/// only errors where a workflow makes them one; otherwise they are collected
/// as warnings on the applied result and never unwind a committed record
/// update.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Payment amount cannot be mapped to any term length
    #[error("cannot determine a term length for amount {0}")]
    UnresolvableAmount(Decimal),

    /// No configuration block for the named server
    #[error("server not configured: {0}")]
    ServerNotConfigured(String),

    /// Configuration could not be loaded
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// Onboarding rejected: primary email already registered
    #[error("a subscriber with email {0} already exists")]
    DuplicateEmail(String),

    /// No record matched the identifier
    #[error("subscriber not found: {0}")]
    SubscriberNotFound(String),

    /// More than one record matched; the operator must disambiguate
    #[error("identifier {term} is ambiguous ({matches} records)")]
    AmbiguousIdentity { term: String, matches: usize },

    /// Operation requires an active subscription
    #[error("subscriber {0} is inactive")]
    SubscriberInactive(String),

    /// Payment method is not in the configured list
    #[error("unknown payment method: {0}")]
    UnknownPaymentMethod(String),

    /// Record store failure
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Provisioning failure in a position the workflow cannot continue from
    #[error("provisioning failed: {0}")]
    Provision(#[from] ProvisionError),

    /// Notification failure in a position the workflow cannot continue from
    #[error("notification failed: {0}")]
    Notify(#[from] NotifyError),

    /// Calendar arithmetic left the supported date range
    #[error("date arithmetic overflow")]
    DateOverflow,
}
