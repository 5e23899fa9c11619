//! OTP record - the transient credential mailed to a user.

use chrono::{DateTime, Duration, Utc};
use std::fmt;
use uuid::Uuid;

/// The live one-time password for an email. At most one exists per email.
#[derive(Clone, PartialEq)]
pub struct OtpRecord {
    pub otp_id: Uuid,
    /// Lower-cased owner email.
    pub email: String,
    pub password: String,
    pub expires_utc: DateTime<Utc>,
    pub created_utc: DateTime<Utc>,
}

impl OtpRecord {
    /// Create a record issued at `now` that lives for `lifetime`.
    pub fn new(email: &str, password: String, now: DateTime<Utc>, lifetime: Duration) -> Self {
        Self {
            otp_id: Uuid::new_v4(),
            email: normalize_email(email),
            password,
            expires_utc: now + lifetime,
            created_utc: now,
        }
    }

    /// An OTP is expired from its expiry instant onward.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_utc <= now
    }
}

impl fmt::Debug for OtpRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OtpRecord")
            .field("otp_id", &self.otp_id)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .field("expires_utc", &self.expires_utc)
            .finish()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
