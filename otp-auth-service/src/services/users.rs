//! Profile registration and maintenance.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use super::error::ServiceError;
use super::store::{StoreError, UserStore};
use super::validation::{
    audit_create_request, audit_update_request, parse_birth_day, parse_marital_status,
};
use crate::dtos::user::{UserCreateRequest, UserUpdateRequest};
use crate::models::User;

#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserStore>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    pub async fn register_user(&self, request: UserCreateRequest) -> Result<User, ServiceError> {
        self.register_user_on(request, Utc::now().date_naive()).await
    }

    #[tracing::instrument(skip(self, request))]
    pub async fn register_user_on(
        &self,
        request: UserCreateRequest,
        today: NaiveDate,
    ) -> Result<User, ServiceError> {
        let request = request.trimmed();

        let audit = audit_create_request(&request, today);
        if audit.is_invalid() {
            tracing::info!(
                fields = ?audit.fields().collect::<Vec<_>>(),
                "User create request rejected"
            );
            return Err(ServiceError::Validation {
                operation: "create",
                audit,
            });
        }

        let (Some(email), Some(name), Some(last_name), Some(birth_day), Some(status)) = (
            request.email,
            request.name,
            request.last_name,
            request.birth_day.as_deref().and_then(parse_birth_day),
            request.marital_status.as_deref().and_then(parse_marital_status),
        ) else {
            return Err(ServiceError::Internal(anyhow::anyhow!(
                "Audited create request is missing a field"
            )));
        };

        if self.users.find_user_by_email(&email).await?.is_some() {
            return Err(ServiceError::EmailAlreadyRegistered);
        }

        let user = User::new(email, name, last_name, birth_day, status);
        self.users.save_user(&user).await.map_err(|e| match e {
            StoreError::Conflict(_) => ServiceError::EmailAlreadyRegistered,
            other => ServiceError::Store(other),
        })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    pub async fn update_user(
        &self,
        id: Uuid,
        request: UserUpdateRequest,
    ) -> Result<User, ServiceError> {
        self.update_user_on(id, request, Utc::now().date_naive()).await
    }

    /// Apply the supplied fields of `request` to user `id`.
    #[tracing::instrument(skip(self, request))]
    pub async fn update_user_on(
        &self,
        id: Uuid,
        request: UserUpdateRequest,
        today: NaiveDate,
    ) -> Result<User, ServiceError> {
        let request = request.trimmed();

        let audit = audit_update_request(&request, today);
        if audit.is_invalid() {
            tracing::info!(
                fields = ?audit.fields().collect::<Vec<_>>(),
                "User update request rejected"
            );
            return Err(ServiceError::Validation {
                operation: "update",
                audit,
            });
        }

        let mut user = self
            .users
            .find_user_by_id(id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;

        if let Some(name) = request.name {
            user.name = name;
        }
        if let Some(last_name) = request.last_name {
            user.last_name = last_name;
        }
        if let Some(status) = request.marital_status.as_deref().and_then(parse_marital_status) {
            user.marital_status = status;
        }
        if let Some(birth_day) = request.birth_day.as_deref().and_then(parse_birth_day) {
            user.birth_day = birth_day;
        }

        self.users.save_user(&user).await?;

        tracing::info!("User updated");
        Ok(user)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<User, ServiceError> {
        self.users
            .find_user_by_id(id)
            .await?
            .ok_or(ServiceError::UserNotFound)
    }

    pub async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
        Ok(self.users.list_users().await?)
    }

    /// Returns whether a user was removed.
    #[tracing::instrument(skip(self))]
    pub async fn delete_user(&self, id: Uuid) -> Result<bool, ServiceError> {
        let removed = self.users.delete_user_by_id(id).await?;
        if removed {
            tracing::info!("User deleted");
        }
        Ok(removed)
    }
}
