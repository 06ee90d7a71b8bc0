//! Append-only transaction entries
//!
//! Every workflow apply writes one entry. Writes are best-effort: a failed
//! append must never abort the owning workflow.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// What kind of operation produced this entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    NewSubscriber,
    Renewal,
    Move,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NewSubscriber => f.write_str("New Subscriber"),
            Self::Renewal => f.write_str("Renewal"),
            Self::Move => f.write_str("Move"),
        }
    }
}

/// One audit record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionEntry {
    /// When the entry was created
    pub timestamp: DateTime<Utc>,
    /// Operation kind
    pub kind: TransactionKind,
    /// Subject identity (email or record id, whichever is known)
    pub subject: String,
    /// Amount paid, if the operation involved a payment
    pub amount: Option<Decimal>,
    /// Payment method, if known
    pub payment_method: Option<String>,
    /// Human-readable single-line summary
    pub notes: String,
    /// Optional machine-readable payload
    pub details: Option<serde_json::Value>,
}

impl TransactionEntry {
    /// Start building an entry for `kind` about `subject`
    pub fn builder(kind: TransactionKind, subject: impl Into<String>) -> TransactionEntryBuilder {
        TransactionEntryBuilder {
            kind,
            subject: subject.into(),
            amount: None,
            payment_method: None,
            fields: Vec::new(),
            details: None,
        }
    }
}

/// Builder that assembles the structured notes line
///
/// Fields appear in insertion order as `Key: value | Key: value`; empty
/// values are dropped, so the line only carries what the caller provided.
#[derive(Debug)]
pub struct TransactionEntryBuilder {
    kind: TransactionKind,
    subject: String,
    amount: Option<Decimal>,
    payment_method: Option<String>,
    fields: Vec<(String, String)>,
    details: Option<serde_json::Value>,
}

impl TransactionEntryBuilder {
    pub fn amount(mut self, amount: Decimal) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    /// Add a `Key: value` field to the notes line; empty values are skipped
    pub fn field(mut self, key: &str, value: impl ToString) -> Self {
        let value = value.to_string();
        if !value.is_empty() {
            self.fields.push((key.to_string(), value));
        }
        self
    }

    /// Add a date field formatted as `MM/DD/YYYY`
    pub fn date_field(self, key: &str, date: NaiveDate) -> Self {
        self.field(key, date.format("%m/%d/%Y"))
    }

    pub fn details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn build(self) -> TransactionEntry {
        let notes = if self.fields.is_empty() {
            self.kind.to_string()
        } else {
            self.fields
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect::<Vec<_>>()
                .join(" | ")
        };
        TransactionEntry {
            timestamp: Utc::now(),
            kind: self.kind,
            subject: self.subject,
            amount: self.amount,
            payment_method: self.payment_method,
            notes,
            details: self.details,
        }
    }
}
