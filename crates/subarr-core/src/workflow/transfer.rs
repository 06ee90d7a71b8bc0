//! Move workflow
//!
//! TargetSelected -> PreviewComputed -> Confirmed -> Applied. Moving a
//! subscriber between servers grants on the new server before revoking on
//! the old one so the subscriber is never left with zero access; a
//! quality-only change on the same server is a single in-place section
//! update instead.

use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, instrument};

use subarr_store::FieldUpdate;
use subarr_types::{
    Quality, SubscriberId, SubscriberRecord, SubscriptionStatus, TransactionEntry, TransactionKind,
};

use crate::config::render_template;
use crate::context::RuntimeContext;
use crate::error::CoreError;
use crate::provision::ServerConnection;

use super::{notify_subscriber, record_warning};

/// A subscriber and the server/quality they are moving to
#[derive(Debug, Clone)]
pub struct MoveTargetSelected {
    pub subscriber: SubscriberRecord,
    pub new_server: String,
    pub new_quality: Quality,
    /// Payment accompanying the move, if any; added to the cumulative total
    pub paid_amount: Option<Decimal>,
}

impl MoveTargetSelected {
    pub fn new(subscriber: SubscriberRecord, new_server: &str, new_quality: Quality) -> Self {
        Self {
            subscriber,
            new_server: new_server.to_string(),
            new_quality,
            paid_amount: None,
        }
    }

    pub fn with_payment(mut self, amount: Decimal) -> Self {
        self.paid_amount = Some(amount);
        self
    }

    /// Diff the old and new section lists; rejects inactive subscribers and
    /// unconfigured servers before anything is touched
    pub fn preview(self, ctx: &RuntimeContext) -> Result<MovePreview, CoreError> {
        if self.subscriber.status == SubscriptionStatus::Inactive {
            return Err(CoreError::SubscriberInactive(
                self.subscriber.primary_email.clone(),
            ));
        }
        let sections_old = ctx
            .catalog
            .sections_for(&self.subscriber.server, self.subscriber.quality)?;
        let sections_new = ctx.catalog.sections_for(&self.new_server, self.new_quality)?;
        let server_changed = self.subscriber.server != self.new_server;
        let quality_changed = self.subscriber.quality != self.new_quality;
        Ok(MovePreview {
            subscriber: self.subscriber,
            new_server: self.new_server,
            new_quality: self.new_quality,
            paid_amount: self.paid_amount,
            sections_old,
            sections_new,
            server_changed,
            quality_changed,
        })
    }
}

/// Computed move preview awaiting operator confirmation
#[derive(Debug, Clone)]
pub struct MovePreview {
    pub subscriber: SubscriberRecord,
    pub new_server: String,
    pub new_quality: Quality,
    pub paid_amount: Option<Decimal>,
    pub sections_old: Vec<String>,
    pub sections_new: Vec<String>,
    pub server_changed: bool,
    pub quality_changed: bool,
}

impl MovePreview {
    fn idempotency_key(&self) -> String {
        format!("{}|{}|{}", self.subscriber.id, self.new_server, self.new_quality)
    }

    /// Provision the target plan, then persist the record changes
    ///
    /// A grant failure on the new server aborts the move with no state
    /// change; a revoke failure after a successful grant is a warning since
    /// the subscriber already holds the new access.
    #[instrument(skip(self, ctx), fields(subscriber = %self.subscriber.id))]
    pub async fn confirm(self, ctx: &RuntimeContext) -> Result<MoveOutcome, CoreError> {
        if !ctx.pending.claim(&self.idempotency_key()) {
            info!(subscriber = %self.subscriber.id, "duplicate move confirmation ignored");
            return Ok(MoveOutcome::Duplicate);
        }

        let mut warnings = Vec::new();
        let email = self.subscriber.primary_email.clone();
        let id = self.subscriber.id;

        if self.server_changed {
            let new_server = ctx.catalog.server(&self.new_server)?;
            let new_connection = ServerConnection::from_config(&self.new_server, new_server);
            ctx.media
                .grant(&email, &new_connection, &self.sections_new, true)
                .await?;

            match ctx.catalog.server(&self.subscriber.server) {
                Ok(old_server) => {
                    let old_connection =
                        ServerConnection::from_config(&self.subscriber.server, old_server);
                    if let Err(err) = ctx
                        .media
                        .revoke(&email, &old_connection, &self.sections_old)
                        .await
                    {
                        record_warning(&mut warnings, "revoke on old server", err);
                    }
                }
                Err(err) => record_warning(&mut warnings, "revoke on old server", err),
            }
        } else if self.quality_changed {
            let server = ctx.catalog.server(&self.new_server)?;
            let connection = ServerConnection::from_config(&self.new_server, server);
            if let Err(err) = ctx
                .media
                .update_sections(&email, &connection, &self.sections_new)
                .await
            {
                record_warning(&mut warnings, "section update", err);
            }
        }

        ctx.subscribers
            .update_field(id, FieldUpdate::Server(self.new_server.clone()))
            .await?;
        ctx.subscribers
            .update_field(id, FieldUpdate::Quality(self.new_quality))
            .await?;
        let new_paid_total = match self.paid_amount {
            Some(amount) => {
                let total = (self.subscriber.paid_amount_total + amount).round_dp(2);
                ctx.subscribers
                    .update_field(id, FieldUpdate::PaidAmountTotal(total))
                    .await?;
                total
            }
            None => self.subscriber.paid_amount_total,
        };

        let entry = TransactionEntry::builder(TransactionKind::Move, email.clone())
            .amount(self.paid_amount.unwrap_or_default())
            .payment_method(self.subscriber.payment_method.clone().unwrap_or_default())
            .field("From", &self.subscriber.server)
            .field("To", &self.new_server)
            .field("Quality", self.new_quality)
            .details(json!({
                "server_changed": self.server_changed,
                "quality_changed": self.quality_changed,
            }))
            .build();
        if let Err(err) = ctx.transactions.append(entry).await {
            record_warning(&mut warnings, "audit log", err);
        }

        let vars = [
            ("primaryEmail", email.clone()),
            ("server", self.new_server.clone()),
            ("section_names", self.sections_new.join(", ")),
        ];
        let subject = render_template(&ctx.config.notifications.move_subject, &vars);
        let body = render_template(&ctx.config.notifications.move_body, &vars);
        notify_subscriber(
            ctx,
            self.subscriber.primary_chat_id,
            &email,
            &subject,
            &body,
            &mut warnings,
        )
        .await;

        info!(
            subscriber = %id,
            server = %self.new_server,
            quality = %self.new_quality,
            warnings = warnings.len(),
            "move applied"
        );
        Ok(MoveOutcome::Applied(MoveApplied {
            subscriber_id: id,
            server: self.new_server,
            quality: self.new_quality,
            new_paid_total,
            warnings,
        }))
    }
}

/// Applied move summary
#[derive(Debug, Clone)]
pub struct MoveApplied {
    pub subscriber_id: SubscriberId,
    pub server: String,
    pub quality: Quality,
    pub new_paid_total: Decimal,
    /// Non-fatal failures encountered during the move
    pub warnings: Vec<String>,
}

/// Result of confirming a move
#[derive(Debug, Clone)]
pub enum MoveOutcome {
    Applied(MoveApplied),
    /// The idempotency key was already claimed; nothing was changed
    Duplicate,
}
