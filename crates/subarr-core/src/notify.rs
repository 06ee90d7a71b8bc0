//! Subscriber notifications
//!
//! Chat DMs and email are delivery details owned by the host application;
//! workflows call this trait and treat every failure as a warning, never as
//! a reason to unwind an applied state change.

use async_trait::async_trait;
use thiserror::Error;

/// Notification failure
#[derive(Error, Debug)]
pub enum NotifyError {
    /// Email delivery requested but SMTP is not configured
    #[error("email configuration is incomplete")]
    MissingSmtpConfig,

    /// Delivery failed
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Outbound notification delivery
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send a direct message on the chat platform
    async fn send_dm(&self, chat_id: u64, subject: &str, body: &str) -> Result<(), NotifyError>;

    /// Send an email
    async fn send_email(&self, recipient: &str, subject: &str, body: &str)
        -> Result<(), NotifyError>;
}
