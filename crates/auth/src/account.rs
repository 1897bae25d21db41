//! Live account state consulted by the authorization engine.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use backoffice_core::AccountId;

use crate::{Attribute, Role};

/// The slice of a stored account that authorization reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    pub id: AccountId,
    pub role: Role,
    pub enabled: bool,
    pub verified: bool,
}

impl AccountRecord {
    pub fn has(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Enabled => self.enabled,
            Attribute::Verified => self.verified,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("account directory unavailable: {0}")]
    Unavailable(String),
}

/// Account lookup capability injected into the [`crate::Authorizer`].
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// `Ok(None)` means the account does not exist.
    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>, DirectoryError>;
}

#[async_trait]
impl<S> AccountDirectory for Arc<S>
where
    S: AccountDirectory + ?Sized,
{
    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>, DirectoryError> {
        (**self).find_account_by_id(id).await
    }
}

/// In-memory directory for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAccountDirectory {
    inner: RwLock<HashMap<AccountId, AccountRecord>>,
}

impl InMemoryAccountDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn upsert(&self, record: AccountRecord) -> Result<(), DirectoryError> {
        self.inner
            .write()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?
            .insert(record.id, record);
        Ok(())
    }
}

#[async_trait]
impl AccountDirectory for InMemoryAccountDirectory {
    async fn find_account_by_id(&self, id: AccountId) -> Result<Option<AccountRecord>, DirectoryError> {
        let map = self
            .inner
            .read()
            .map_err(|_| DirectoryError::Unavailable("lock poisoned".to_string()))?;
        Ok(map.get(&id).cloned())
    }
}
