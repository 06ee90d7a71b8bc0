//! In-memory store
//!
//! Dashmap-backed implementation of [`SubscriberRepository`] and
//! [`TransactionLog`]. Serves as the reference implementation for the trait
//! contracts and as the test double for the workflow tests.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;

use subarr_types::{
    NewSubscriber, SubscriberId, SubscriberRecord, SubscriptionStatus, TransactionEntry,
};

use crate::error::{StoreError, StoreResult};
use crate::repo::{FieldUpdate, SubscriberRepository, TransactionLog};

/// In-memory record store and transaction log
#[derive(Default)]
pub struct MemoryStore {
    subscribers: DashMap<SubscriberId, SubscriberRecord>,
    next_id: AtomicI64,
    transactions: Mutex<Vec<TransactionEntry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            next_id: AtomicI64::new(1),
            transactions: Mutex::new(Vec::new()),
        }
    }

    /// Insert a record directly, bypassing `create` (test setup)
    pub fn insert(&self, record: SubscriberRecord) {
        let id = record.id.0;
        self.next_id.fetch_max(id + 1, Ordering::SeqCst);
        self.subscribers.insert(record.id, record);
    }

    /// Snapshot of all logged transactions
    pub fn transactions(&self) -> Vec<TransactionEntry> {
        self.transactions
            .lock()
            .map(|t| t.clone())
            .unwrap_or_default()
    }

    /// Number of subscriber records held
    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

#[async_trait]
impl SubscriberRepository for MemoryStore {
    async fn find(&self, term: &str) -> StoreResult<Vec<SubscriberRecord>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        let numeric: Option<i64> = needle.parse().ok();

        let mut matches: Vec<SubscriberRecord> = self
            .subscribers
            .iter()
            .filter(|r| {
                let rec = r.value();
                contains_ci(Some(&rec.primary_email), &needle)
                    || contains_ci(rec.secondary_email.as_deref(), &needle)
                    || contains_ci(rec.primary_chat.as_deref(), &needle)
                    || contains_ci(rec.secondary_chat.as_deref(), &needle)
                    || contains_ci(rec.payment_person.as_deref(), &needle)
                    || numeric.is_some_and(|n| {
                        rec.id.0 == n
                            || u64::try_from(n).is_ok_and(|id| rec.primary_chat_id == Some(id))
                    })
            })
            .map(|r| r.value().clone())
            .collect();
        matches.sort_by_key(|r| r.id);
        Ok(matches)
    }

    async fn get_by_id(&self, id: SubscriberId) -> StoreResult<Option<SubscriberRecord>> {
        Ok(self.subscribers.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<SubscriberRecord>> {
        Ok(self
            .subscribers
            .iter()
            .find(|r| r.value().matches_email(email))
            .map(|r| r.value().clone()))
    }

    async fn create(&self, subscriber: NewSubscriber) -> StoreResult<SubscriberRecord> {
        if self.find_by_email(&subscriber.primary_email).await?.is_some() {
            return Err(StoreError::DuplicateEmail(subscriber.primary_email));
        }
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = SubscriberRecord {
            id,
            primary_email: subscriber.primary_email,
            secondary_email: subscriber.secondary_email,
            primary_chat: subscriber.primary_chat,
            primary_chat_id: subscriber.primary_chat_id,
            secondary_chat: subscriber.secondary_chat,
            payment_person: subscriber.payment_person,
            payment_method: subscriber.payment_method,
            server: subscriber.server,
            quality: subscriber.quality,
            status: SubscriptionStatus::Active,
            paid_amount_total: subscriber.paid_amount,
            join_date: subscriber.start_date,
            start_date: subscriber.start_date,
            end_date: subscriber.end_date,
        };
        self.subscribers.insert(id, record.clone());
        Ok(record)
    }

    async fn update_field(&self, id: SubscriberId, update: FieldUpdate) -> StoreResult<()> {
        let mut record = self.subscribers.get_mut(&id).ok_or(StoreError::NotFound)?;
        match update {
            FieldUpdate::Server(server) => record.server = server,
            FieldUpdate::Quality(quality) => record.quality = quality,
            FieldUpdate::Status(status) => record.status = status,
            FieldUpdate::PaidAmountTotal(amount) => record.paid_amount_total = amount,
            FieldUpdate::StartDate(date) => record.start_date = date,
            FieldUpdate::EndDate(date) => record.end_date = date,
        }
        Ok(())
    }
}

#[async_trait]
impl TransactionLog for MemoryStore {
    async fn append(&self, entry: TransactionEntry) -> StoreResult<()> {
        self.transactions
            .lock()
            .map_err(|_| StoreError::Backend("transaction log poisoned".to_string()))?
            .push(entry);
        Ok(())
    }
}
