//! Media-server provisioning interface
//!
//! The media server's account API is an external collaborator. The
//! workflows call it through this trait; every call is treated as
//! at-most-once best-effort, with no retry or backoff here.

use async_trait::async_trait;
use thiserror::Error;

use crate::config::ServerConfig;

/// Provisioning failure
#[derive(Error, Debug)]
#[error("{0}")]
pub struct ProvisionError(pub String);

/// Connection details for one media server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConnection {
    pub name: String,
    pub base_url: String,
    pub token: String,
}

impl ServerConnection {
    /// Build connection details from a server's config block
    pub fn from_config(name: &str, config: &ServerConfig) -> Self {
        Self {
            name: config.server_name.clone().unwrap_or_else(|| name.to_string()),
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        }
    }
}

/// Account provisioning on a media server
#[async_trait]
pub trait MediaServerClient: Send + Sync {
    /// Share the listed sections with an account
    async fn grant(
        &self,
        account_email: &str,
        server: &ServerConnection,
        sections: &[String],
        allow_sync: bool,
    ) -> Result<(), ProvisionError>;

    /// Remove the listed sections from an account
    async fn revoke(
        &self,
        account_email: &str,
        server: &ServerConnection,
        sections: &[String],
    ) -> Result<(), ProvisionError>;

    /// Replace an account's section list in place (same server)
    async fn update_sections(
        &self,
        account_email: &str,
        server: &ServerConnection,
        sections: &[String],
    ) -> Result<(), ProvisionError>;
}

/// Chat-role grants on the chat platform
#[async_trait]
pub trait RoleGranter: Send + Sync {
    /// Grant a named role to a chat identity; best-effort
    async fn grant_role(&self, chat_id: u64, role: &str) -> Result<(), ProvisionError>;
}
