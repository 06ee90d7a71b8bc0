//! Operator workflows
//!
//! Each workflow is an explicit state machine: a state is a struct carrying
//! exactly the data collected so far, and a transition is a method that
//! consumes the state and returns the next one. Previews are side-effect
//! free; only a `confirm` mutates anything, and every confirm claims an
//! idempotency key first so a duplicate confirmation is a silent no-op.
//!
//! Within a confirm, the record-store mutation is the operation; everything
//! around it (audit log, provisioning where noted, notifications, role
//! grants) is best-effort, with failures collected into the applied result's
//! warning list.

mod onboarding;
mod renewal;
mod transfer;

pub use onboarding::{
    IdentityCollected, OnboardingApplied, OnboardingIdentity, OnboardingOutcome,
    OnboardingPreview, PaymentMethodSelected, PlanSelected, QualitySelected, ReferralPreview,
};
pub use renewal::{
    BatchRenewalPreview, BatchRenewalSelected, RenewalApplied, RenewalOutcome, RenewalPreview,
    RenewalSelected,
};
pub use transfer::{MoveApplied, MoveOutcome, MovePreview, MoveTargetSelected};

use chrono::{Months, NaiveDate};
use tracing::warn;

use crate::context::RuntimeContext;
use crate::error::CoreError;

/// Calendar-month addition; 2025-01-31 + 1 month clamps to 2025-02-28
pub(crate) fn add_months(date: NaiveDate, months: u32) -> Result<NaiveDate, CoreError> {
    date.checked_add_months(Months::new(months))
        .ok_or(CoreError::DateOverflow)
}

/// Date format used in notes lines and notification bodies
pub(crate) fn format_date(date: NaiveDate) -> String {
    date.format("%m/%d/%Y").to_string()
}

/// Record a non-fatal failure and keep going
pub(crate) fn record_warning(
    warnings: &mut Vec<String>,
    what: &str,
    err: impl std::fmt::Display,
) {
    warn!(%err, "{what} failed");
    warnings.push(format!("{what}: {err}"));
}

/// Best-effort subscriber notification: chat DM when a chat id is on file,
/// email to the primary address
pub(crate) async fn notify_subscriber(
    ctx: &RuntimeContext,
    chat_id: Option<u64>,
    email: &str,
    subject: &str,
    body: &str,
    warnings: &mut Vec<String>,
) {
    if let Some(chat_id) = chat_id {
        if let Err(err) = ctx.notifier.send_dm(chat_id, subject, body).await {
            record_warning(warnings, "chat notification", err);
        }
    }
    if let Err(err) = ctx.notifier.send_email(email, subject, body).await {
        record_warning(warnings, "email notification", err);
    }
}
