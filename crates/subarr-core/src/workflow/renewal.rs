//! Renewal workflow
//!
//! Selected -> PreviewComputed -> Confirmed -> Applied. The preview resolves
//! the paid amount against the subscriber's standard price table (never
//! promo) and computes the new period dates; confirm applies the record
//! mutation exactly once per (subscriber, dates) key.
//!
//! A batch renewal resolves one payment against the summed tier prices of
//! every member and then applies a per-member renewal for the shared month
//! count.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, instrument};

use subarr_store::FieldUpdate;
use subarr_types::{
    SubscriberId, SubscriberRecord, SubscriptionStatus, TransactionEntry, TransactionKind,
};

use crate::config::render_template;
use crate::context::RuntimeContext;
use crate::error::CoreError;
use crate::provision::ServerConnection;
use crate::term::{resolve_batch, resolve_term, TermResolution};

use super::{add_months, format_date, notify_subscriber, record_warning};

/// A subscriber chosen for renewal together with the raw paid amount
#[derive(Debug, Clone)]
pub struct RenewalSelected {
    pub subscriber: SubscriberRecord,
    pub amount: Decimal,
}

impl RenewalSelected {
    pub fn new(subscriber: SubscriberRecord, amount: Decimal) -> Self {
        Self { subscriber, amount }
    }

    /// Resolve the term and compute the new period; rejects unresolvable
    /// amounts before anything is touched
    pub fn preview(self, ctx: &RuntimeContext, today: NaiveDate) -> Result<RenewalPreview, CoreError> {
        let prices = ctx
            .catalog
            .tier_prices(&self.subscriber.server, self.subscriber.quality);
        let resolution = resolve_term(self.amount, &prices, None, false);
        if resolution.months == 0 {
            return Err(CoreError::UnresolvableAmount(self.amount));
        }
        RenewalPreview::compute(self.subscriber, self.amount, resolution, today)
    }
}

/// Computed renewal preview awaiting operator confirmation
#[derive(Debug, Clone)]
pub struct RenewalPreview {
    pub subscriber: SubscriberRecord,
    pub amount: Decimal,
    pub resolution: TermResolution,
    pub new_start: NaiveDate,
    pub new_end: NaiveDate,
    pub new_paid_total: Decimal,
}

impl RenewalPreview {
    fn compute(
        subscriber: SubscriberRecord,
        amount: Decimal,
        resolution: TermResolution,
        today: NaiveDate,
    ) -> Result<Self, CoreError> {
        // An active subscription extends from its current end; a lapsed one
        // restarts today so the subscriber is not billed for the gap.
        let base = subscriber.end_date.max(today);
        let new_end = add_months(base, resolution.months)?;
        let new_start = match subscriber.status {
            SubscriptionStatus::Active => subscriber.end_date,
            SubscriptionStatus::Inactive => today,
        };
        let new_paid_total = (subscriber.paid_amount_total + amount).round_dp(2);
        Ok(Self {
            subscriber,
            amount,
            resolution,
            new_start,
            new_end,
            new_paid_total,
        })
    }

    fn idempotency_key(&self) -> String {
        format!("{}|{}|{}", self.subscriber.id, self.new_start, self.new_end)
    }

    /// Apply the renewal: persist dates/amount/status, then best-effort
    /// audit, re-provisioning and notification
    #[instrument(skip(self, ctx), fields(subscriber = %self.subscriber.id))]
    pub async fn confirm(self, ctx: &RuntimeContext) -> Result<RenewalOutcome, CoreError> {
        if !ctx.pending.claim(&self.idempotency_key()) {
            info!(subscriber = %self.subscriber.id, "duplicate renewal confirmation ignored");
            return Ok(RenewalOutcome::Duplicate);
        }

        let id = self.subscriber.id;
        let was_inactive = self.subscriber.status == SubscriptionStatus::Inactive;

        ctx.subscribers
            .update_field(id, FieldUpdate::PaidAmountTotal(self.new_paid_total))
            .await?;
        ctx.subscribers
            .update_field(id, FieldUpdate::StartDate(self.new_start))
            .await?;
        ctx.subscribers
            .update_field(id, FieldUpdate::EndDate(self.new_end))
            .await?;
        ctx.subscribers
            .update_field(id, FieldUpdate::Status(SubscriptionStatus::Active))
            .await?;

        let mut warnings = Vec::new();

        let entry = TransactionEntry::builder(TransactionKind::Renewal, self.subscriber.primary_email.clone())
            .amount(self.amount)
            .payment_method(self.subscriber.payment_method.clone().unwrap_or_default())
            .field("Server", &self.subscriber.server)
            .field("Quality", self.subscriber.quality)
            .field("Length", self.resolution.months)
            .date_field("NewStart", self.new_start)
            .date_field("NewEnd", self.new_end)
            .field("Alignment", self.resolution.alignment_line(self.amount))
            .details(json!({
                "months": self.resolution.months,
                "leftover": self.resolution.leftover,
                "exact": self.resolution.exact,
            }))
            .build();
        if let Err(err) = ctx.transactions.append(entry).await {
            record_warning(&mut warnings, "audit log", err);
        }

        // A lapsed subscriber may have had access revoked; re-grant their
        // plan's sections and chat role on renewal.
        if was_inactive {
            if let Err(err) = regrant(ctx, &self.subscriber).await {
                record_warning(&mut warnings, "re-provisioning", err);
            }
            if let (Some(chat_id), Ok(server)) = (
                self.subscriber.primary_chat_id,
                ctx.catalog.server(&self.subscriber.server),
            ) {
                if let Some(role) = &server.role {
                    if let Err(err) = ctx.roles.grant_role(chat_id, role).await {
                        record_warning(&mut warnings, "role grant", err);
                    }
                }
            }
        }

        let vars = [
            ("primaryEmail", self.subscriber.primary_email.clone()),
            ("server", self.subscriber.server.clone()),
            ("newEndDate", format_date(self.new_end)),
        ];
        let subject = render_template(&ctx.config.notifications.payment_subject, &vars);
        let body = render_template(&ctx.config.notifications.payment_body, &vars);
        notify_subscriber(
            ctx,
            self.subscriber.primary_chat_id,
            &self.subscriber.primary_email,
            &subject,
            &body,
            &mut warnings,
        )
        .await;

        info!(
            subscriber = %id,
            months = self.resolution.months,
            new_end = %self.new_end,
            warnings = warnings.len(),
            "renewal applied"
        );
        Ok(RenewalOutcome::Applied(RenewalApplied {
            subscriber_id: id,
            months: self.resolution.months,
            new_start: self.new_start,
            new_end: self.new_end,
            new_paid_total: self.new_paid_total,
            warnings,
        }))
    }
}

async fn regrant(ctx: &RuntimeContext, subscriber: &SubscriberRecord) -> Result<(), CoreError> {
    let server = ctx.catalog.server(&subscriber.server)?;
    let sections = server.sections_for(subscriber.quality);
    let connection = ServerConnection::from_config(&subscriber.server, server);
    ctx.media
        .grant(&subscriber.primary_email, &connection, &sections, true)
        .await?;
    Ok(())
}

/// Applied renewal summary
#[derive(Debug, Clone)]
pub struct RenewalApplied {
    pub subscriber_id: SubscriberId,
    pub months: u32,
    pub new_start: NaiveDate,
    pub new_end: NaiveDate,
    pub new_paid_total: Decimal,
    /// Non-fatal failures encountered after the record update
    pub warnings: Vec<String>,
}

/// Result of confirming a renewal
#[derive(Debug, Clone)]
pub enum RenewalOutcome {
    Applied(RenewalApplied),
    /// The idempotency key was already claimed; nothing was changed
    Duplicate,
}

/// Several co-paying subscribers renewing under one payment
#[derive(Debug, Clone)]
pub struct BatchRenewalSelected {
    pub members: Vec<SubscriberRecord>,
    pub amount: Decimal,
}

impl BatchRenewalSelected {
    pub fn new(members: Vec<SubscriberRecord>, amount: Decimal) -> Self {
        Self { members, amount }
    }

    /// Resolve the payment once against the summed tier prices and build a
    /// per-member preview for the shared month count
    pub fn preview(
        self,
        ctx: &RuntimeContext,
        today: NaiveDate,
    ) -> Result<BatchRenewalPreview, CoreError> {
        let plans: Vec<(&str, subarr_types::Quality)> = self
            .members
            .iter()
            .map(|m| (m.server.as_str(), m.quality))
            .collect();
        let summed = ctx.catalog.summed_tier_prices(&plans);
        let batch = resolve_batch(self.amount, &summed, self.members.len());
        if batch.months == 0 {
            return Err(CoreError::UnresolvableAmount(self.amount));
        }

        let mut previews = Vec::with_capacity(self.members.len());
        for member in self.members {
            let prices = ctx.catalog.tier_prices(&member.server, member.quality);
            // Attribute the member's own tier price for the shared term, or
            // month-by-month pricing when the term is not a sold tier, plus
            // an equal share of the leftover.
            let own_price = match prices.price_for(batch.months) {
                p if p > Decimal::ZERO => p,
                _ => prices.price_for(1) * Decimal::from(batch.months),
            };
            let attributed = (own_price + batch.leftover_each).round_dp(2);
            let resolution = TermResolution {
                months: batch.months,
                leftover: batch.leftover_each,
                exact: batch.exact,
                breakdown: vec![batch.months],
            };
            previews.push(RenewalPreview::compute(member, attributed, resolution, today)?);
        }
        Ok(BatchRenewalPreview {
            amount: self.amount,
            months: batch.months,
            leftover_total: batch.leftover_total,
            members: previews,
        })
    }
}

/// Computed batch preview: one shared term, one member preview each
#[derive(Debug, Clone)]
pub struct BatchRenewalPreview {
    pub amount: Decimal,
    pub months: u32,
    pub leftover_total: Decimal,
    pub members: Vec<RenewalPreview>,
}

impl BatchRenewalPreview {
    /// Apply every member's renewal in order; a member whose record update
    /// fails aborts the remainder of the batch
    #[instrument(skip(self, ctx), fields(members = self.members.len()))]
    pub async fn confirm(self, ctx: &RuntimeContext) -> Result<Vec<RenewalOutcome>, CoreError> {
        let mut outcomes = Vec::with_capacity(self.members.len());
        for preview in self.members {
            outcomes.push(preview.confirm(ctx).await?);
        }
        Ok(outcomes)
    }
}
