//! Runtime context
//!
//! All collaborators are injected here once at startup and passed to the
//! workflows explicitly; there are no module-level singletons.

use std::sync::Arc;

use subarr_store::{SubscriberRepository, TransactionLog};
use subarr_types::SubscriberRecord;

use crate::config::Config;
use crate::dedup::PendingOperations;
use crate::error::CoreError;
use crate::notify::Notifier;
use crate::pricing::PricingCatalog;
use crate::provision::{MediaServerClient, RoleGranter};
use crate::referral::ReferralRewards;

/// Everything a workflow needs to run
#[derive(Clone)]
pub struct RuntimeContext {
    pub config: Arc<Config>,
    pub catalog: PricingCatalog,
    pub rewards: ReferralRewards,
    pub subscribers: Arc<dyn SubscriberRepository>,
    pub transactions: Arc<dyn TransactionLog>,
    pub media: Arc<dyn MediaServerClient>,
    pub notifier: Arc<dyn Notifier>,
    pub roles: Arc<dyn RoleGranter>,
    pub pending: Arc<PendingOperations>,
}

impl RuntimeContext {
    pub fn new(
        config: Config,
        subscribers: Arc<dyn SubscriberRepository>,
        transactions: Arc<dyn TransactionLog>,
        media: Arc<dyn MediaServerClient>,
        notifier: Arc<dyn Notifier>,
        roles: Arc<dyn RoleGranter>,
    ) -> Self {
        let config = Arc::new(config);
        Self {
            catalog: PricingCatalog::new(Arc::clone(&config)),
            rewards: ReferralRewards::new(config.referrals.clone()),
            config,
            subscribers,
            transactions,
            media,
            notifier,
            roles,
            pending: Arc::new(PendingOperations::new()),
        }
    }

    /// Resolve an operator-supplied identifier to exactly one subscriber
    ///
    /// Zero matches and multiple matches are both surfaced; the operator
    /// disambiguates and retries with a narrower identifier.
    pub async fn resolve_subscriber(&self, term: &str) -> Result<SubscriberRecord, CoreError> {
        let mut matches = self.subscribers.find(term).await?;
        match matches.len() {
            1 => Ok(matches.remove(0)),
            0 => Err(CoreError::SubscriberNotFound(term.to_string())),
            n => Err(CoreError::AmbiguousIdentity {
                term: term.to_string(),
                matches: n,
            }),
        }
    }
}

impl std::fmt::Debug for RuntimeContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeContext")
            .field("servers", &self.config.servers.keys())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
