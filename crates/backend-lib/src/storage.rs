// ============================
// backend-lib/src/storage.rs
// ============================
//! Credential store abstraction with an in-memory implementation.
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::{mapref::entry::Entry, DashMap};
use thiserror::Error;
use uuid::Uuid;

use crate::auth::password::HashAlgorithm;

/// Errors reported by a credential store backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// The login identifier is already taken
    #[error("login `{0}` already exists")]
    UniqueViolation(String),

    #[error("record not found")]
    NotFound,

    #[error("credential store unavailable: {0}")]
    Unavailable(String),
}

/// One user's identity and password material.
///
/// Deliberately not `Serialize`: hash and salt never leave the auth core.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityRecord {
    pub id: Uuid,
    /// Normalised login identifier
    pub login: String,
    pub password_hash: String,
    pub salt: String,
    pub algorithm: HashAlgorithm,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for IdentityRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityRecord")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("algorithm", &self.algorithm)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish_non_exhaustive()
    }
}

/// Trait for credential storage backends
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a new record; the login must be unused
    async fn create(&self, record: IdentityRecord) -> Result<(), StoreError>;

    /// Look a record up by normalised login
    async fn get_by_login(&self, login: &str) -> Result<Option<IdentityRecord>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<IdentityRecord>, StoreError>;

    /// Replace hash, salt and algorithm tag of an existing record
    async fn update_password(
        &self,
        id: Uuid,
        password_hash: String,
        salt: String,
        algorithm: HashAlgorithm,
    ) -> Result<(), StoreError>;
}

/// In-memory implementation of the CredentialStore trait
#[derive(Clone, Default)]
pub struct MemoryCredentialStore {
    by_id: Arc<DashMap<Uuid, IdentityRecord>>,
    /// login -> id
    by_login: Arc<DashMap<String, Uuid>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, record: IdentityRecord) -> Result<(), StoreError> {
        // Claiming the login first makes concurrent registrations race on one shard lock
        match self.by_login.entry(record.login.clone()) {
            Entry::Occupied(_) => Err(StoreError::UniqueViolation(record.login)),
            Entry::Vacant(slot) => {
                slot.insert(record.id);
                self.by_id.insert(record.id, record);
                Ok(())
            },
        }
    }

    async fn get_by_login(&self, login: &str) -> Result<Option<IdentityRecord>, StoreError> {
        let Some(id) = self.by_login.get(login).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<IdentityRecord>, StoreError> {
        Ok(self.by_id.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update_password(
        &self,
        id: Uuid,
        password_hash: String,
        salt: String,
        algorithm: HashAlgorithm,
    ) -> Result<(), StoreError> {
        let mut record = self.by_id.get_mut(&id).ok_or(StoreError::NotFound)?;
        record.password_hash = password_hash;
        record.salt = salt;
        record.algorithm = algorithm;
        record.updated_at = Utc::now();
        Ok(())
    }
}
