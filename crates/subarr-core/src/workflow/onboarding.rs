//! Onboarding workflow
//!
//! IdentityCollected -> PaymentMethodSelected -> PlanSelected ->
//! QualitySelected -> PreviewComputed -> Confirmed -> Applied. Each wizard
//! step validates its own input so an invalid choice cannot reach the
//! preview. The preview resolves the amount with first-purchase promo
//! pricing and, when a referrer is attached, computes the referral extension
//! without applying it; confirm creates the record and then runs the
//! best-effort tail (audit, grant, referral, notifications, chat role).

use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde_json::json;
use tracing::{info, instrument};

use subarr_store::{FieldUpdate, StoreError};
use subarr_types::{
    NewSubscriber, Quality, SubscriberId, SubscriberRecord, SubscriptionStatus, TransactionEntry,
    TransactionKind,
};

use crate::config::render_template;
use crate::context::RuntimeContext;
use crate::error::CoreError;
use crate::provision::ServerConnection;
use crate::term::{resolve_term, TermResolution};

use super::{add_months, format_date, notify_subscriber, record_warning};

/// Identity fields collected before the wizard starts
#[derive(Debug, Clone)]
pub struct OnboardingIdentity {
    pub primary_email: String,
    pub secondary_email: Option<String>,
    pub primary_chat: Option<String>,
    pub primary_chat_id: Option<u64>,
    pub secondary_chat: Option<String>,
    pub payment_person: Option<String>,
}

/// Wizard step 1: identity accepted, email not yet registered
#[derive(Debug, Clone)]
pub struct IdentityCollected {
    identity: OnboardingIdentity,
}

impl IdentityCollected {
    /// Start the wizard; rejects an email that case-insensitively matches an
    /// existing record's primary email
    pub async fn begin(
        ctx: &RuntimeContext,
        identity: OnboardingIdentity,
    ) -> Result<Self, CoreError> {
        let email = identity.primary_email.trim();
        if ctx.subscribers.find_by_email(email).await?.is_some() {
            return Err(CoreError::DuplicateEmail(email.to_string()));
        }
        Ok(Self { identity })
    }

    /// Record the payment method; when the deployment configures an accepted
    /// list, the choice must be on it
    pub fn payment_method(
        self,
        ctx: &RuntimeContext,
        method: Option<String>,
    ) -> Result<PaymentMethodSelected, CoreError> {
        if let Some(method) = &method {
            let accepted = &ctx.config.payment_methods;
            if !accepted.is_empty() && !accepted.iter().any(|m| m.eq_ignore_ascii_case(method)) {
                return Err(CoreError::UnknownPaymentMethod(method.clone()));
            }
        }
        Ok(PaymentMethodSelected {
            identity: self.identity,
            payment_method: method,
        })
    }
}

/// Wizard step 2: payment method chosen
#[derive(Debug, Clone)]
pub struct PaymentMethodSelected {
    identity: OnboardingIdentity,
    payment_method: Option<String>,
}

impl PaymentMethodSelected {
    /// Choose the media server; it must have a configuration block
    pub fn plan(self, ctx: &RuntimeContext, server: &str) -> Result<PlanSelected, CoreError> {
        ctx.catalog.server(server)?;
        Ok(PlanSelected {
            identity: self.identity,
            payment_method: self.payment_method,
            server: server.to_string(),
        })
    }
}

/// Wizard step 3: server chosen
#[derive(Debug, Clone)]
pub struct PlanSelected {
    identity: OnboardingIdentity,
    payment_method: Option<String>,
    server: String,
}

impl PlanSelected {
    pub fn quality(self, quality: Quality) -> QualitySelected {
        QualitySelected {
            identity: self.identity,
            payment_method: self.payment_method,
            server: self.server,
            quality,
            referrer: None,
        }
    }
}

/// Wizard step 4: plan complete, optional referrer attachment
#[derive(Debug, Clone)]
pub struct QualitySelected {
    identity: OnboardingIdentity,
    payment_method: Option<String>,
    server: String,
    quality: Quality,
    referrer: Option<SubscriberRecord>,
}

impl QualitySelected {
    /// Search candidate referrers for an operator-supplied identifier; the
    /// operator disambiguates and attaches one with [`Self::with_referrer`]
    pub async fn find_referrer_candidates(
        &self,
        ctx: &RuntimeContext,
        term: &str,
    ) -> Result<Vec<SubscriberRecord>, CoreError> {
        Ok(ctx.subscribers.find(term).await?)
    }

    pub fn with_referrer(mut self, referrer: SubscriberRecord) -> Self {
        self.referrer = Some(referrer);
        self
    }

    /// Resolve the amount (promo-aware) and compute the onboarding preview
    pub fn preview(
        self,
        ctx: &RuntimeContext,
        amount: Decimal,
        today: NaiveDate,
    ) -> Result<OnboardingPreview, CoreError> {
        let prices = ctx.catalog.tier_prices(&self.server, self.quality);
        let promo = ctx.catalog.promo_prices(&self.server, self.quality);
        let resolution = resolve_term(amount, &prices, promo.as_ref(), true);
        if resolution.months == 0 {
            return Err(CoreError::UnresolvableAmount(amount));
        }

        let end_date = add_months(today, resolution.months)?;

        // The extension is previewed here and re-checked at apply time; a
        // referrer who lapses in between earns nothing.
        let referral = match &self.referrer {
            Some(referrer) if referrer.status == SubscriptionStatus::Active => {
                match ctx.rewards.reward_for(resolution.months) {
                    Some(days) => {
                        let after_end = referrer
                            .end_date
                            .checked_add_days(Days::new(u64::from(days)))
                            .ok_or(CoreError::DateOverflow)?;
                        Some(ReferralPreview {
                            referrer_id: referrer.id,
                            referrer_email: referrer.primary_email.clone(),
                            before_end: referrer.end_date,
                            after_end,
                            days,
                        })
                    }
                    None => None,
                }
            }
            _ => None,
        };

        Ok(OnboardingPreview {
            identity: self.identity,
            payment_method: self.payment_method,
            server: self.server,
            quality: self.quality,
            amount,
            resolution,
            start_date: today,
            end_date,
            referral,
        })
    }
}

/// Previewed referral extension for the referrer
#[derive(Debug, Clone)]
pub struct ReferralPreview {
    pub referrer_id: SubscriberId,
    pub referrer_email: String,
    pub before_end: NaiveDate,
    pub after_end: NaiveDate,
    pub days: u32,
}

/// Computed onboarding preview awaiting operator confirmation
#[derive(Debug, Clone)]
pub struct OnboardingPreview {
    pub identity: OnboardingIdentity,
    pub payment_method: Option<String>,
    pub server: String,
    pub quality: Quality,
    pub amount: Decimal,
    pub resolution: TermResolution,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub referral: Option<ReferralPreview>,
}

impl OnboardingPreview {
    fn idempotency_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.identity.primary_email.trim().to_lowercase(),
            self.start_date,
            self.end_date
        )
    }

    /// Create the subscriber record, then run the best-effort tail
    #[instrument(skip(self, ctx), fields(email = %self.identity.primary_email))]
    pub async fn confirm(self, ctx: &RuntimeContext) -> Result<OnboardingOutcome, CoreError> {
        if !ctx.pending.claim(&self.idempotency_key()) {
            info!(email = %self.identity.primary_email, "duplicate onboarding confirmation ignored");
            return Ok(OnboardingOutcome::Duplicate);
        }

        let subscriber = ctx
            .subscribers
            .create(NewSubscriber {
                primary_email: self.identity.primary_email.trim().to_string(),
                secondary_email: self.identity.secondary_email.clone(),
                primary_chat: self.identity.primary_chat.clone(),
                primary_chat_id: self.identity.primary_chat_id,
                secondary_chat: self.identity.secondary_chat.clone(),
                payment_person: self.identity.payment_person.clone(),
                payment_method: self.payment_method.clone(),
                server: self.server.clone(),
                quality: self.quality,
                paid_amount: self.amount,
                start_date: self.start_date,
                end_date: self.end_date,
            })
            .await
            .map_err(|err| match err {
                StoreError::DuplicateEmail(email) => CoreError::DuplicateEmail(email),
                other => CoreError::Store(other),
            })?;

        let mut warnings = Vec::new();

        let entry = TransactionEntry::builder(TransactionKind::NewSubscriber, subscriber.primary_email.clone())
            .amount(self.amount)
            .payment_method(self.payment_method.clone().unwrap_or_default())
            .field("Server", &self.server)
            .field("Quality", self.quality)
            .field("Length", self.resolution.months)
            .date_field("Start", self.start_date)
            .date_field("End", self.end_date)
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

        let sections = match self.grant_access(ctx, &subscriber).await {
            Ok(sections) => sections,
            Err(err) => {
                record_warning(&mut warnings, "provisioning", err);
                Vec::new()
            }
        };

        if let Some(referral) = &self.referral {
            self.apply_referral(ctx, referral, &subscriber, &mut warnings)
                .await;
        }

        let vars = [
            ("primaryEmail", subscriber.primary_email.clone()),
            ("server", self.server.clone()),
            ("section_names", sections.join(", ")),
            ("newEndDate", format_date(self.end_date)),
        ];
        let subject = render_template(&ctx.config.notifications.welcome_subject, &vars);
        let body = render_template(&ctx.config.notifications.welcome_body, &vars);
        notify_subscriber(
            ctx,
            subscriber.primary_chat_id,
            &subscriber.primary_email,
            &subject,
            &body,
            &mut warnings,
        )
        .await;

        if let Some(chat_id) = subscriber.primary_chat_id {
            if let Ok(server) = ctx.catalog.server(&self.server) {
                if let Some(role) = &server.role {
                    if let Err(err) = ctx.roles.grant_role(chat_id, role).await {
                        record_warning(&mut warnings, "role grant", err);
                    }
                }
            }
        }

        info!(
            subscriber = %subscriber.id,
            months = self.resolution.months,
            end = %self.end_date,
            warnings = warnings.len(),
            "subscriber onboarded"
        );
        Ok(OnboardingOutcome::Applied(OnboardingApplied {
            subscriber,
            months: self.resolution.months,
            warnings,
        }))
    }

    async fn grant_access(
        &self,
        ctx: &RuntimeContext,
        subscriber: &SubscriberRecord,
    ) -> Result<Vec<String>, CoreError> {
        let server = ctx.catalog.server(&self.server)?;
        let sections = server.sections_for(self.quality);
        let connection = ServerConnection::from_config(&self.server, server);
        ctx.media
            .grant(&subscriber.primary_email, &connection, &sections, true)
            .await?;
        Ok(sections)
    }

    async fn apply_referral(
        &self,
        ctx: &RuntimeContext,
        referral: &ReferralPreview,
        subscriber: &SubscriberRecord,
        warnings: &mut Vec<String>,
    ) {
        // Re-fetch: the referrer must still be active at apply time.
        let referrer = match ctx.subscribers.get_by_id(referral.referrer_id).await {
            Ok(Some(record)) if record.status == SubscriptionStatus::Active => record,
            Ok(_) => {
                record_warning(
                    warnings,
                    "referral",
                    format!("referrer {} is no longer active", referral.referrer_email),
                );
                return;
            }
            Err(err) => {
                record_warning(warnings, "referral", err);
                return;
            }
        };

        let after_end = match referrer
            .end_date
            .checked_add_days(Days::new(u64::from(referral.days)))
        {
            Some(date) => date,
            None => {
                record_warning(warnings, "referral extension", "date arithmetic overflow");
                return;
            }
        };
        if let Err(err) = ctx
            .subscribers
            .update_field(referrer.id, FieldUpdate::EndDate(after_end))
            .await
        {
            record_warning(warnings, "referral extension", err);
            return;
        }

        let vars = [
            ("referredEmail", subscriber.primary_email.clone()),
            ("beforeEnd", format_date(referrer.end_date)),
            ("afterEnd", format_date(after_end)),
            ("daysExtended", referral.days.to_string()),
        ];
        let subject = render_template(&ctx.config.notifications.referral_subject, &vars);
        let body = render_template(&ctx.config.notifications.referral_body, &vars);
        notify_subscriber(
            ctx,
            referrer.primary_chat_id,
            &referrer.primary_email,
            &subject,
            &body,
            warnings,
        )
        .await;
    }
}

/// Applied onboarding summary
#[derive(Debug, Clone)]
pub struct OnboardingApplied {
    pub subscriber: SubscriberRecord,
    pub months: u32,
    /// Non-fatal failures encountered after the record was created
    pub warnings: Vec<String>,
}

/// Result of confirming an onboarding
#[derive(Debug, Clone)]
pub enum OnboardingOutcome {
    Applied(OnboardingApplied),
    /// The idempotency key was already claimed; nothing was created
    Duplicate,
}
