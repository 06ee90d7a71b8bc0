//! Subarr shared types - domain types for shared media-server subscriptions
//!
//! Types used across the subarr crates: subscriber identity and state,
//! pricing/quality plans, and the append-only transaction entries written by
//! the workflows.

pub mod error;
pub mod subscriber;
pub mod transaction;

pub use error::SubarrError;
pub use subscriber::{
    NewSubscriber, Quality, SubscriberId, SubscriberRecord, SubscriptionStatus,
};
pub use transaction::{TransactionEntry, TransactionKind};
