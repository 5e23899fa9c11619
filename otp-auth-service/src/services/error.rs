use service_core::error::AppError;
use thiserror::Error;

use super::store::StoreError;
use crate::models::AuditResponse;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("User not found")]
    UserNotFound,

    #[error("One-time password has expired")]
    OtpExpired,

    #[error("Access denied")]
    AccessDenied,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    Disabled,

    /// `operation` is the verb used in the rendered message ("create", "update").
    #[error("Validation failed for {operation} User")]
    Validation {
        operation: &'static str,
        audit: AuditResponse,
    },

    #[error("Email already registered")]
    EmailAlreadyRegistered,

    #[error("Delivery failed: {0}")]
    DeliveryFailed(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ServiceError {
    /// Failures a login attempt must not distinguish between.
    pub fn is_credential_failure(&self) -> bool {
        matches!(
            self,
            ServiceError::UserNotFound
                | ServiceError::OtpExpired
                | ServiceError::AccessDenied
                | ServiceError::InvalidCredentials
                | ServiceError::Disabled
        )
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::OtpExpired => {
                AppError::Forbidden(anyhow::anyhow!("One-time password has expired"))
            }
            ServiceError::AccessDenied => AppError::Forbidden(anyhow::anyhow!("Access denied")),
            ServiceError::InvalidCredentials => {
                AppError::Forbidden(anyhow::anyhow!("Check login and password."))
            }
            ServiceError::Disabled => AppError::Forbidden(anyhow::anyhow!("Account is disabled")),
            ServiceError::Validation { operation, audit } => AppError::ValidationFailed {
                message: format!(
                    "Bad request for {} User. \
                     Please check your request for consistent of documentation.",
                    operation
                ),
                fields: audit.into_messages(),
            },
            ServiceError::EmailAlreadyRegistered => {
                AppError::Conflict(anyhow::anyhow!("Email already registered"))
            }
            ServiceError::DeliveryFailed(e) => AppError::EmailError(e),
            ServiceError::Store(StoreError::Conflict(what)) => {
                AppError::Conflict(anyhow::anyhow!("Conflicting record: {}", what))
            }
            ServiceError::Store(e) => AppError::DatabaseError(anyhow::anyhow!(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}
