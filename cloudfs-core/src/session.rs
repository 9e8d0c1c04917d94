use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use serde_json::Value;

use crate::error::Error;
use crate::filesystem::FileSystem;
use crate::transport::{RestClient, RestConfig};

/// End-user profile attributes from the profile endpoint. Timestamps are
/// milliseconds since the epoch.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub created_at: Option<i64>,
    #[serde(default)]
    pub last_login: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageQuota {
    #[serde(default)]
    pub usage: Option<u64>,
    #[serde(default)]
    pub limit: Option<u64>,
    /// Whether the account is over its storage limit.
    #[serde(default, rename = "otl")]
    pub over_limit: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccountPlan {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// Paid-account attributes reported alongside the user profile.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub storage: StorageQuota,
    #[serde(default)]
    pub account_plan: AccountPlan,
    #[serde(default)]
    pub locale: Option<String>,
}

/// Attributes for provisioning a new end-user account.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// An end-user session against one CloudFS tenant.
///
/// A session authenticates at most once; after [`Session::unlink`] it is
/// spent and a new one must be created.
pub struct Session {
    client: Arc<RestClient>,
    unlinked: AtomicBool,
}

impl Session {
    pub fn new(
        client_id: impl Into<String>,
        secret: impl Into<String>,
        host: &str,
    ) -> Result<Self, Error> {
        Self::with_config(client_id, secret, host, RestConfig::default())
    }

    pub fn with_config(
        client_id: impl Into<String>,
        secret: impl Into<String>,
        host: &str,
        config: RestConfig,
    ) -> Result<Self, Error> {
        let client = RestClient::new(client_id, secret, host, config)?;
        Ok(Self {
            client: Arc::new(client),
            unlinked: AtomicBool::new(false),
        })
    }

    fn ensure_usable(&self) -> Result<(), Error> {
        if self.unlinked.load(Ordering::SeqCst) {
            return Err(Error::OperationNotAllowed(
                "this session has been unlinked; create a new one".into(),
            ));
        }
        Ok(())
    }

    /// Links this session to an end-user account. Fails if the session
    /// already holds a link.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<(), Error> {
        self.ensure_usable()?;
        if self.client.has_token() {
            return Err(Error::OperationNotAllowed(
                "session is already linked; create a new session to switch users".into(),
            ));
        }
        self.client.authenticate(username, password).await
    }

    /// Verifies the link against the server.
    pub async fn is_linked(&self) -> Result<bool, Error> {
        if self.unlinked.load(Ordering::SeqCst) {
            return Ok(false);
        }
        self.client.linked().await
    }

    /// Discards the bearer token and permanently retires this session.
    pub fn unlink(&self) {
        self.client.unlink();
        self.unlinked.store(true, Ordering::SeqCst);
    }

    pub fn filesystem(&self) -> Result<FileSystem, Error> {
        self.ensure_usable()?;
        Ok(FileSystem::new(Arc::clone(&self.client)))
    }

    pub async fn user(&self) -> Result<User, Error> {
        self.ensure_usable()?;
        let profile = self.client.get_profile().await?;
        serde_json::from_value(profile)
            .map_err(|e| Error::Protocol(format!("invalid user profile: {e}")))
    }

    pub async fn account(&self) -> Result<Account, Error> {
        self.ensure_usable()?;
        let profile = self.client.get_profile().await?;
        serde_json::from_value(profile)
            .map_err(|e| Error::Protocol(format!("invalid account profile: {e}")))
    }

    /// Raw action-history entries. `start` may be negative to count back from
    /// the newest entry.
    pub async fn action_history(
        &self,
        start: i64,
        stop: Option<i64>,
    ) -> Result<Vec<Value>, Error> {
        self.ensure_usable()?;
        self.client.list_history(start, stop).await
    }

    /// Provisions a new end-user account under this tenant. Only valid
    /// before the session is linked.
    pub async fn create_account(&self, account: &NewAccount) -> Result<User, Error> {
        self.ensure_usable()?;
        if self.client.has_token() {
            return Err(Error::OperationNotAllowed(
                "accounts can only be created from an unlinked session".into(),
            ));
        }
        let value = self
            .client
            .create_account(
                &account.username,
                &account.password,
                account.email.as_deref(),
                account.first_name.as_deref(),
                account.last_name.as_deref(),
            )
            .await?;
        serde_json::from_value(value)
            .map_err(|e| Error::Protocol(format!("invalid account response: {e}")))
    }

    pub async fn ping(&self) -> Result<(), Error> {
        self.ensure_usable()?;
        self.client.ping().await
    }
}
