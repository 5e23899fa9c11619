//! Storage ports for users and OTP records, plus an in-process adapter.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{normalize_email, OtpRecord, User};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unique constraint violated: {0}")]
    Conflict(String),

    #[error("Stored record is unreadable: {0}")]
    Corrupt(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Account profiles. Email lookups ignore case.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Insert or replace by id. A second user with the same email is a `Conflict`.
    async fn save_user(&self, user: &User) -> Result<(), StoreError>;
    /// Returns whether a row was removed.
    async fn delete_user_by_id(&self, id: Uuid) -> Result<bool, StoreError>;
    async fn list_users(&self) -> Result<Vec<User>, StoreError>;
}

/// At most one OTP per (lower-cased) email.
#[async_trait]
pub trait OtpStore: Send + Sync {
    async fn find_otp_by_email(&self, email: &str) -> Result<Option<OtpRecord>, StoreError>;
    /// Upsert on email: the later write replaces any earlier record.
    async fn save_otp(&self, otp: &OtpRecord) -> Result<(), StoreError>;
    /// Returns whether a record was removed.
    async fn delete_otp_by_email(&self, email: &str) -> Result<bool, StoreError>;
    /// Remove records whose expiry is strictly before `cutoff`.
    async fn delete_otps_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Mutex-guarded maps implementing both ports. Used by tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    otps: Mutex<HashMap<String, OtpRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn users(&self) -> Result<std::sync::MutexGuard<'_, HashMap<Uuid, User>>, StoreError> {
        self.users
            .lock()
            .map_err(|e| StoreError::Internal(anyhow::anyhow!("User store mutex poisoned: {}", e)))
    }

    fn otps(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, OtpRecord>>, StoreError> {
        self.otps
            .lock()
            .map_err(|e| StoreError::Internal(anyhow::anyhow!("OTP store mutex poisoned: {}", e)))
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users()?.values().find(|u| u.has_email(email)).cloned())
    }

    async fn find_user_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users()?.get(&id).cloned())
    }

    async fn save_user(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users()?;
        if users
            .values()
            .any(|existing| existing.id != user.id && existing.has_email(&user.email))
        {
            return Err(StoreError::Conflict(format!("email {}", user.email)));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn delete_user_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users()?.remove(&id).is_some())
    }

    async fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users()?.values().cloned().collect();
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }
}

#[async_trait]
impl OtpStore for MemoryStore {
    async fn find_otp_by_email(&self, email: &str) -> Result<Option<OtpRecord>, StoreError> {
        Ok(self.otps()?.get(&normalize_email(email)).cloned())
    }

    async fn save_otp(&self, otp: &OtpRecord) -> Result<(), StoreError> {
        self.otps()?.insert(normalize_email(&otp.email), otp.clone());
        Ok(())
    }

    async fn delete_otp_by_email(&self, email: &str) -> Result<bool, StoreError> {
        Ok(self.otps()?.remove(&normalize_email(email)).is_some())
    }

    async fn delete_otps_expired_before(&self, cutoff: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut otps = self.otps()?;
        let before = otps.len();
        otps.retain(|_, otp| otp.expires_utc >= cutoff);
        Ok((before - otps.len()) as u64)
    }
}
