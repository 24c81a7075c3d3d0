// ============================
// backend-lib/src/auth/service_impl.rs
// ============================
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use metrics::counter;
use once_cell::sync::OnceCell;
use uuid::Uuid;

use authgate_common::UserRegistered;

use crate::auth::password::{generate_salt, PasswordDigest, PasswordHasher};
use crate::auth::service::{AuthService, Registration, TokenPair};
use crate::auth::session::SessionCache;
use crate::auth::token::TokenService;
use crate::config::{Settings, TimeoutSettings};
use crate::error::{bounded, AppError};
use crate::events::{publish_json, EventPublisher};
use crate::metrics::{
    LOGIN_FAILURE, LOGIN_SUCCESS, PASSWORD_UPDATED, REFRESH_REJECTED, REFRESH_SUCCESS, USER_REGISTERED,
};
use crate::storage::{CredentialStore, IdentityRecord, StoreError};
use crate::validation::{normalize_identifier, validate_identifier, validate_password, validate_username};

/// Password verified when the identifier is unknown, so both failure paths cost one hash
const DUMMY_PASSWORD: &str = "dummy-password-for-timing";

pub struct DefaultAuth {
    store: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionCache>,
    events: Arc<dyn EventPublisher>,
    tokens: Arc<TokenService>,
    hasher: PasswordHasher,
    salt_len: usize,
    timeouts: TimeoutSettings,
    user_registered_queue: String,
    dummy: OnceCell<(PasswordDigest, String)>,
}

impl DefaultAuth {
    pub fn new(
        settings: &Settings,
        store: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionCache>,
        events: Arc<dyn EventPublisher>,
    ) -> Result<Self, AppError> {
        let auth = &settings.auth;
        let tokens = TokenService::new(auth.jwt_secret.as_bytes(), auth.access_ttl(), auth.refresh_ttl())?;
        let hasher = PasswordHasher::new(auth.hash_algorithm, auth.bcrypt_cost, auth.scrypt_log_n)?;

        Ok(Self {
            store,
            sessions,
            events,
            tokens: Arc::new(tokens),
            hasher,
            salt_len: auth.salt_len,
            timeouts: settings.timeouts.clone(),
            user_registered_queue: settings.events.user_registered_queue.clone(),
            dummy: OnceCell::new(),
        })
    }

    /// Token service shared with the gatekeeper
    pub fn tokens(&self) -> Arc<TokenService> {
        Arc::clone(&self.tokens)
    }

    async fn dummy_digest(&self) -> Result<(PasswordDigest, String), AppError> {
        if let Some(dummy) = self.dummy.get() {
            return Ok(dummy.clone());
        }
        let salt = generate_salt(self.salt_len)?;
        let digest = self.hasher.hash_blocking(DUMMY_PASSWORD.to_string(), salt.clone()).await?;
        // A concurrent caller may have won the race; either value works
        let _ = self.dummy.set((digest.clone(), salt.clone()));
        Ok((digest, salt))
    }

    async fn verify(&self, record: &IdentityRecord, candidate: &str) -> bool {
        self.hasher
            .verify_blocking(
                record.password_hash.clone(),
                record.algorithm,
                record.salt.clone(),
                candidate.to_string(),
            )
            .await
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    #[tracing::instrument(skip_all)]
    async fn register(&self, registration: Registration) -> Result<Uuid, AppError> {
        let login = normalize_identifier(&registration.identifier);
        validate_identifier(&login)?;
        validate_password(&registration.password)?;
        let username = registration
            .username
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        if let Some(name) = &username {
            validate_username(name)?;
        }

        let id = Uuid::new_v4();
        let salt = generate_salt(self.salt_len)?;
        let digest = self.hasher.hash_blocking(registration.password, salt.clone()).await?;

        let now = Utc::now();
        let record = IdentityRecord {
            id,
            login,
            password_hash: digest.hash,
            salt,
            algorithm: digest.algorithm,
            created_at: now,
            updated_at: now,
        };

        match tokio::time::timeout(self.timeouts.store(), self.store.create(record)).await {
            Ok(Ok(())) => {},
            Ok(Err(StoreError::UniqueViolation(_))) => return Err(AppError::UserExists),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(AppError::Timeout("credential store")),
        }
        counter!(USER_REGISTERED).increment(1);
        tracing::info!(user_id = %id, "user registered");

        // The record is committed; a failed announcement is reported but not undone
        let event = UserRegistered {
            user_id: id,
            user_name: username,
        };
        bounded(
            self.timeouts.store(),
            "event bus",
            publish_json(self.events.as_ref(), &self.user_registered_queue, &event),
        )
        .await
        .inspect_err(|err| tracing::error!(user_id = %id, error = %err, "failed to announce registration"))?;

        Ok(id)
    }

    #[tracing::instrument(skip_all)]
    async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, AppError> {
        let login = normalize_identifier(identifier);
        if login.is_empty() || password.is_empty() {
            return Err(AppError::Validation("email and password must be provided".to_string()));
        }

        let record = bounded(self.timeouts.store(), "credential store", self.store.get_by_login(&login)).await?;

        let verified = match &record {
            Some(record) => self.verify(record, password).await,
            None => {
                let (dummy, salt) = self.dummy_digest().await?;
                let _ = self
                    .hasher
                    .verify_blocking(dummy.hash, dummy.algorithm, salt, password.to_string())
                    .await;
                false
            },
        };

        let record = match record {
            Some(record) if verified => record,
            _ => {
                counter!(LOGIN_FAILURE).increment(1);
                tracing::warn!("login rejected");
                return Err(AppError::InvalidCredentials);
            },
        };

        let access_token = self.tokens.issue_access(record.id)?;
        let refresh_token = self.tokens.issue_refresh(record.id)?;
        let recorded = tokio::time::timeout(
            self.timeouts.cache(),
            self.sessions
                .set_live_refresh(record.id, &refresh_token, self.tokens.refresh_ttl()),
        )
        .await;
        // Without a live session the login has not happened
        match recorded {
            Ok(Ok(())) => {},
            Ok(Err(err)) => {
                counter!(LOGIN_FAILURE).increment(1);
                tracing::warn!(user_id = %record.id, error = %err, "session cache write failed");
                return Err(AppError::InvalidCredentials);
            },
            Err(_) => {
                counter!(LOGIN_FAILURE).increment(1);
                tracing::warn!(user_id = %record.id, "session cache write timed out");
                return Err(AppError::InvalidCredentials);
            },
        }

        counter!(LOGIN_SUCCESS).increment(1);
        tracing::info!(user_id = %record.id, "login succeeded");
        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }

    async fn validate_access_token(&self, token: &str) -> Result<Uuid, AppError> {
        self.tokens.validate(token).map_err(|_| AppError::Unauthorized)
    }

    #[tracing::instrument(skip_all)]
    async fn refresh_access_token(&self, refresh_token: &str) -> Result<String, AppError> {
        let Ok(subject) = self.tokens.validate(refresh_token) else {
            counter!(REFRESH_REJECTED).increment(1);
            return Err(AppError::InvalidCredentials);
        };

        let live = match tokio::time::timeout(self.timeouts.cache(), self.sessions.get_live_refresh(subject)).await {
            Ok(Ok(live)) => live,
            Ok(Err(err)) => {
                tracing::warn!(user_id = %subject, error = %err, "session cache lookup failed");
                None
            },
            Err(_) => {
                tracing::warn!(user_id = %subject, "session cache lookup timed out");
                None
            },
        };

        if live.as_deref() != Some(refresh_token) {
            counter!(REFRESH_REJECTED).increment(1);
            tracing::warn!(user_id = %subject, "refresh token is not the live one");
            return Err(AppError::InvalidCredentials);
        }

        counter!(REFRESH_SUCCESS).increment(1);
        Ok(self.tokens.issue_access(subject)?)
    }

    #[tracing::instrument(skip_all, fields(user_id = %subject))]
    async fn update_password(&self, subject: Uuid, old_password: &str, new_password: &str) -> Result<(), AppError> {
        validate_password(new_password)?;

        let record = bounded(self.timeouts.store(), "credential store", self.store.get_by_id(subject))
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !self.verify(&record, old_password).await {
            tracing::warn!("old password mismatch");
            return Err(AppError::InvalidOldPassword);
        }

        let salt = generate_salt(self.salt_len)?;
        let digest = self.hasher.hash_blocking(new_password.to_string(), salt.clone()).await?;

        match tokio::time::timeout(
            self.timeouts.store(),
            self.store
                .update_password(subject, digest.hash, salt, digest.algorithm),
        )
        .await
        {
            Ok(Ok(())) => {},
            Ok(Err(StoreError::NotFound)) => return Err(AppError::InvalidCredentials),
            Ok(Err(err)) => return Err(err.into()),
            Err(_) => return Err(AppError::Timeout("credential store")),
        }

        counter!(PASSWORD_UPDATED).increment(1);
        tracing::info!("password updated");
        Ok(())
    }
}
