//! Business logic: the OTP authentication core, profile service, token codec
//! and their storage and mail collaborators.

pub mod auth;
mod database;
pub mod email;
pub mod error;
mod jwt;
pub mod store;
pub mod sweeper;
pub mod users;
pub mod validation;

pub use auth::{AuthService, DeliveryHandle, OtpRequestOutcome};
pub use database::Database;
pub use email::{MockOtpNotifier, OtpNotifier, SmtpOtpNotifier};
pub use error::ServiceError;
pub use jwt::{SessionClaims, TokenCodec, TokenError};
pub use store::{MemoryStore, OtpStore, StoreError, UserStore};
pub use sweeper::{start_otp_sweeper, DEFAULT_SWEEP_CRON};
pub use users::UserService;
