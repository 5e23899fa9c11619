//! User model - account profile records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

/// Marital status codes, stored and exchanged as their upper-case names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum MaritalStatus {
    #[serde(rename = "SINGLE")]
    Single,
    #[serde(rename = "MARRIED")]
    Married,
    #[serde(rename = "DIVORCED")]
    Divorced,
    #[serde(rename = "WIDOWED")]
    Widowed,
    #[serde(rename = "COMPLICATED")]
    Complicated,
    #[serde(rename = "COMMONLAW")]
    CommonLaw,
}

impl MaritalStatus {
    pub const ALL: [MaritalStatus; 6] = [
        MaritalStatus::Single,
        MaritalStatus::Married,
        MaritalStatus::Divorced,
        MaritalStatus::Widowed,
        MaritalStatus::Complicated,
        MaritalStatus::CommonLaw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MaritalStatus::Single => "SINGLE",
            MaritalStatus::Married => "MARRIED",
            MaritalStatus::Divorced => "DIVORCED",
            MaritalStatus::Widowed => "WIDOWED",
            MaritalStatus::Complicated => "COMPLICATED",
            MaritalStatus::CommonLaw => "COMMONLAW",
        }
    }
}

impl fmt::Display for MaritalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: `"single"` is not a status.
impl FromStr for MaritalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MaritalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| format!("Invalid marital status: {}", s))
    }
}

/// User entity.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub last_name: String,
    pub birth_day: NaiveDate,
    pub marital_status: MaritalStatus,
}

impl User {
    /// Create a new user with a freshly assigned id.
    pub fn new(
        email: String,
        name: String,
        last_name: String,
        birth_day: NaiveDate,
        marital_status: MaritalStatus,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            name,
            last_name,
            birth_day,
            marital_status,
        }
    }

    /// Name used when addressing the user in mail.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.email.to_lowercase() == email.trim().to_lowercase()
    }
}
