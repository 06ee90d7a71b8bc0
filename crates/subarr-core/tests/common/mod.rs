//! Shared fixtures for the workflow tests: recording doubles for the
//! external collaborators and a canned two-server configuration.
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

use subarr_core::config::Config;
use subarr_core::context::RuntimeContext;
use subarr_core::notify::{Notifier, NotifyError};
use subarr_core::provision::{MediaServerClient, ProvisionError, RoleGranter, ServerConnection};
use subarr_store::{MemoryStore, SubscriberRepository, TransactionLog};
use subarr_types::{Quality, SubscriberId, SubscriberRecord, SubscriptionStatus};

pub const CONFIG_YAML: &str = r#"
servers:
  alpha:
    base_url: "http://alpha.local:32400"
    token: "tok-alpha"
    standard_libraries: ["Movies", "TV"]
    optional_libraries: ["Movies 4K"]
    role: "alpha-member"
    pricing:
      "1080p":
        1Month: 10.00
        3Month: 24.00
        6Month: 45.00
        12Month: 80.00
      "4k":
        1Month: 15.00
        3Month: 40.00
        6Month: 75.00
        12Month: 140.00
  beta:
    base_url: "http://beta.local:32400"
    token: "tok-beta"
    standard_libraries: ["Anime"]
    optional_libraries: ["Anime 4K"]
    pricing:
      "1080p":
        1Month: 8.00
        3Month: 21.00
promotions:
  first_time_prices:
    alpha:
      "1080p":
        3Month: 20.00
payment_methods: ["PayPal", "Venmo"]
"#;

/// Recording media-server double; grant/revoke/update calls are captured in
/// order and failures can be armed per call kind
#[derive(Default)]
pub struct RecordingMedia {
    pub calls: Mutex<Vec<MediaCall>>,
    pub fail_grant: AtomicBool,
    pub fail_revoke: AtomicBool,
    pub fail_update: AtomicBool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MediaCall {
    Grant {
        email: String,
        server: String,
        sections: Vec<String>,
    },
    Revoke {
        email: String,
        server: String,
        sections: Vec<String>,
    },
    UpdateSections {
        email: String,
        server: String,
        sections: Vec<String>,
    },
}

impl RecordingMedia {
    pub fn calls(&self) -> Vec<MediaCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: MediaCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaServerClient for RecordingMedia {
    async fn grant(
        &self,
        account_email: &str,
        server: &ServerConnection,
        sections: &[String],
        _allow_sync: bool,
    ) -> Result<(), ProvisionError> {
        if self.fail_grant.load(Ordering::SeqCst) {
            return Err(ProvisionError("grant refused".to_string()));
        }
        self.record(MediaCall::Grant {
            email: account_email.to_string(),
            server: server.name.clone(),
            sections: sections.to_vec(),
        });
        Ok(())
    }

    async fn revoke(
        &self,
        account_email: &str,
        server: &ServerConnection,
        sections: &[String],
    ) -> Result<(), ProvisionError> {
        if self.fail_revoke.load(Ordering::SeqCst) {
            return Err(ProvisionError("revoke refused".to_string()));
        }
        self.record(MediaCall::Revoke {
            email: account_email.to_string(),
            server: server.name.clone(),
            sections: sections.to_vec(),
        });
        Ok(())
    }

    async fn update_sections(
        &self,
        account_email: &str,
        server: &ServerConnection,
        sections: &[String],
    ) -> Result<(), ProvisionError> {
        if self.fail_update.load(Ordering::SeqCst) {
            return Err(ProvisionError("update refused".to_string()));
        }
        self.record(MediaCall::UpdateSections {
            email: account_email.to_string(),
            server: server.name.clone(),
            sections: sections.to_vec(),
        });
        Ok(())
    }
}

/// Recording notifier double
#[derive(Default)]
pub struct RecordingNotifier {
    pub dms: Mutex<Vec<(u64, String, String)>>,
    pub emails: Mutex<Vec<(String, String, String)>>,
    pub fail: AtomicBool,
}

impl RecordingNotifier {
    pub fn dms(&self) -> Vec<(u64, String, String)> {
        self.dms.lock().unwrap().clone()
    }

    pub fn emails(&self) -> Vec<(String, String, String)> {
        self.emails.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_dm(&self, chat_id: u64, subject: &str, body: &str) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("dm refused".to_string()));
        }
        self.dms
            .lock()
            .unwrap()
            .push((chat_id, subject.to_string(), body.to_string()));
        Ok(())
    }

    async fn send_email(
        &self,
        recipient: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), NotifyError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(NotifyError::Delivery("email refused".to_string()));
        }
        self.emails.lock().unwrap().push((
            recipient.to_string(),
            subject.to_string(),
            body.to_string(),
        ));
        Ok(())
    }
}

/// Recording role-granter double
#[derive(Default)]
pub struct RecordingRoles {
    pub grants: Mutex<Vec<(u64, String)>>,
}

impl RecordingRoles {
    pub fn grants(&self) -> Vec<(u64, String)> {
        self.grants.lock().unwrap().clone()
    }
}

#[async_trait]
impl RoleGranter for RecordingRoles {
    async fn grant_role(&self, chat_id: u64, role: &str) -> Result<(), ProvisionError> {
        self.grants.lock().unwrap().push((chat_id, role.to_string()));
        Ok(())
    }
}

/// Fully wired context plus handles on every double
pub struct Harness {
    pub ctx: RuntimeContext,
    pub store: Arc<MemoryStore>,
    pub media: Arc<RecordingMedia>,
    pub notifier: Arc<RecordingNotifier>,
    pub roles: Arc<RecordingRoles>,
}

impl Harness {
    pub fn new() -> Self {
        let config = Config::from_yaml(CONFIG_YAML).unwrap();
        let store = Arc::new(MemoryStore::new());
        let media = Arc::new(RecordingMedia::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let roles = Arc::new(RecordingRoles::default());
        let ctx = RuntimeContext::new(
            config,
            store.clone() as Arc<dyn SubscriberRepository>,
            store.clone() as Arc<dyn TransactionLog>,
            media.clone() as Arc<dyn MediaServerClient>,
            notifier.clone() as Arc<dyn Notifier>,
            roles.clone() as Arc<dyn RoleGranter>,
        );
        Self {
            ctx,
            store,
            media,
            notifier,
            roles,
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// A standard-quality subscriber on alpha, active through 2025-04-01
pub fn subscriber(id: i64, email: &str) -> SubscriberRecord {
    SubscriberRecord {
        id: SubscriberId(id),
        primary_email: email.to_string(),
        secondary_email: None,
        primary_chat: Some(format!("chat-{id}")),
        primary_chat_id: Some(1000 + id as u64),
        secondary_chat: None,
        payment_person: Some("Pat Doe".to_string()),
        payment_method: Some("PayPal".to_string()),
        server: "alpha".to_string(),
        quality: Quality::Standard,
        status: SubscriptionStatus::Active,
        paid_amount_total: dec!(24.00),
        join_date: date(2025, 1, 1),
        start_date: date(2025, 1, 1),
        end_date: date(2025, 4, 1),
    }
}
