//! Subarr store - record store and transaction log interfaces
//!
//! The relational store is an external collaborator; this crate defines the
//! async repository traits the workflows depend on, plus an in-memory
//! implementation used as the reference implementation and test double.

pub mod error;
pub mod memory;
pub mod repo;

pub use error::{StoreError, StoreResult};
pub use memory::MemoryStore;
pub use repo::{FieldUpdate, SubscriberRepository, TransactionLog};
