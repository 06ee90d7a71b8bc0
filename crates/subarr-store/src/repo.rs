//! Repository traits
//!
//! Async interfaces over the record store and the append-only transaction
//! log. Workflows only ever see these traits; the production backend and the
//! in-memory [`crate::MemoryStore`] both implement them.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use subarr_types::{
    NewSubscriber, Quality, SubscriberId, SubscriberRecord, SubscriptionStatus, TransactionEntry,
};

use crate::error::StoreResult;

/// A typed point update to one field of a subscriber record
///
/// Replaces stringly-keyed column updates: the set of mutable fields is
/// closed, so a typo'd field name cannot compile.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    Server(String),
    Quality(Quality),
    Status(SubscriptionStatus),
    PaidAmountTotal(Decimal),
    StartDate(NaiveDate),
    EndDate(NaiveDate),
}

/// Subscriber record repository
#[async_trait]
pub trait SubscriberRepository: Send + Sync {
    /// Search across identity fields
    ///
    /// Matches case-insensitive substrings of primary/secondary email,
    /// primary/secondary chat handle and payment-person name; a term that
    /// parses as an integer additionally matches the record id and the
    /// chat-platform id exactly.
    async fn find(&self, term: &str) -> StoreResult<Vec<SubscriberRecord>>;

    /// Point lookup by record id
    async fn get_by_id(&self, id: SubscriberId) -> StoreResult<Option<SubscriberRecord>>;

    /// Case-insensitive exact lookup by primary email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<SubscriberRecord>>;

    /// Create a subscriber record
    ///
    /// The new record is Active and its join date is the start date.
    async fn create(&self, subscriber: NewSubscriber) -> StoreResult<SubscriberRecord>;

    /// Apply a point update to one field
    async fn update_field(&self, id: SubscriberId, update: FieldUpdate) -> StoreResult<()>;
}

/// Append-only transaction log
///
/// Implementations should make a best effort to persist the entry; callers
/// treat any error as a warning and continue.
#[async_trait]
pub trait TransactionLog: Send + Sync {
    /// Append one entry
    async fn append(&self, entry: TransactionEntry) -> StoreResult<()>;
}
