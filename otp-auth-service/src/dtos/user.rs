use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{MaritalStatus, User};

/// Fields arrive as raw strings and are audited by the user service, so a bad
/// date or status yields a per-field message instead of a JSON rejection.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserCreateRequest {
    #[schema(example = "Ann")]
    pub name: Option<String>,
    #[schema(example = "Smith")]
    pub last_name: Option<String>,
    #[schema(example = "ann.smith@example.com")]
    pub email: Option<String>,
    #[schema(example = "1990-04-02")]
    pub birth_day: Option<String>,
    #[schema(example = "SINGLE")]
    pub marital_status: Option<String>,
}

/// Partial update: absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdateRequest {
    #[schema(example = "Ann")]
    pub name: Option<String>,
    #[schema(example = "Smith")]
    pub last_name: Option<String>,
    #[schema(example = "1990-04-02")]
    pub birth_day: Option<String>,
    #[schema(example = "MARRIED")]
    pub marital_status: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub last_name: String,
    #[schema(value_type = String, format = Date, example = "1990-04-02")]
    pub birth_day: NaiveDate,
    pub marital_status: MaritalStatus,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            last_name: user.last_name,
            birth_day: user.birth_day,
            marital_status: user.marital_status,
        }
    }
}
