pub mod audit;
pub mod identity;
pub mod otp_code;
pub mod user;

pub use audit::AuditResponse;
pub use identity::{Authority, Identity};
pub use otp_code::{normalize_email, OtpRecord};
pub use user::{MaritalStatus, User};
