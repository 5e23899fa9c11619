//! Field rules for profile create and update requests.
//!
//! Every rule runs and every violation is recorded; callers persist nothing
//! unless the resulting [`AuditResponse`] is valid. Inputs are expected to be
//! trimmed already (see [`trim_to_none`]).

use chrono::NaiveDate;
use validator::ValidateEmail;

use crate::dtos::user::{UserCreateRequest, UserUpdateRequest};
use crate::models::{AuditResponse, MaritalStatus};

pub const MAX_NAME_CHARS: usize = 75;
const MIN_BIRTH_DAY_CHARS: usize = 8;

pub const NAME_TOO_SHORT: &str = "Field Name is too short.";
pub const NAME_TOO_LONG: &str = "Field Name is too long.";
pub const LAST_NAME_TOO_SHORT: &str = "Field LastName is too short.";
pub const LAST_NAME_TOO_LONG: &str = "Field LastName is too long.";
pub const STATUS_WRONG: &str = "This status is wrong.";
pub const STATUS_REQUIRED: &str = "Field MaritalStatus is required.";
pub const BIRTH_DAY_WRONG: &str = "Field BirthDay is wrong";
pub const BIRTH_DAY_IN_FUTURE: &str = "BirthDay date is in future";
pub const BIRTH_DAY_FORMAT: &str = "Format field of BirthDay is wrong. Use format 'yyyy-MM-dd'";
pub const EMAIL_INVALID: &str = "It's not like an email";

/// Trim surrounding whitespace; blank becomes `None`.
pub fn trim_to_none(value: Option<String>) -> Option<String> {
    value.and_then(|v| {
        let trimmed = v.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

impl UserCreateRequest {
    pub fn trimmed(self) -> Self {
        Self {
            name: trim_to_none(self.name),
            last_name: trim_to_none(self.last_name),
            email: trim_to_none(self.email),
            birth_day: trim_to_none(self.birth_day),
            marital_status: trim_to_none(self.marital_status),
        }
    }
}

impl UserUpdateRequest {
    pub fn trimmed(self) -> Self {
        Self {
            name: trim_to_none(self.name),
            last_name: trim_to_none(self.last_name),
            birth_day: trim_to_none(self.birth_day),
            marital_status: trim_to_none(self.marital_status),
        }
    }
}

/// Strict `yyyy-MM-dd`: four-digit year, zero-padded month and day.
pub fn parse_birth_day(value: &str) -> Option<NaiveDate> {
    let bytes = value.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shape_ok {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

pub fn parse_marital_status(value: &str) -> Option<MaritalStatus> {
    value.parse().ok()
}

fn check_length(
    audit: &mut AuditResponse,
    field: &str,
    value: Option<&str>,
    required: bool,
    too_short: &str,
    too_long: &str,
) {
    match value {
        None if required => audit.add_message(field, too_short),
        None => {}
        Some(v) => {
            let chars = v.chars().count();
            if chars < 1 {
                audit.add_message(field, too_short);
            }
            if chars > MAX_NAME_CHARS {
                audit.add_message(field, too_long);
            }
        }
    }
}

fn check_birth_day(
    audit: &mut AuditResponse,
    value: Option<&str>,
    required: bool,
    today: NaiveDate,
) {
    let value = match value {
        Some(v) => v,
        None if required => {
            audit.add_message("birthDay", BIRTH_DAY_WRONG);
            return;
        }
        None => return,
    };

    if value.chars().count() < MIN_BIRTH_DAY_CHARS {
        audit.add_message("birthDay", BIRTH_DAY_WRONG);
        return;
    }

    match parse_birth_day(value) {
        Some(date) if date > today => audit.add_message("birthDay", BIRTH_DAY_IN_FUTURE),
        Some(_) => {}
        None => audit.add_message("birthDay", BIRTH_DAY_FORMAT),
    }
}

fn check_marital_status(audit: &mut AuditResponse, value: Option<&str>, required: bool) {
    match value {
        Some(v) if parse_marital_status(v).is_none() => {
            audit.add_message("maritalStatus", STATUS_WRONG)
        }
        Some(_) => {}
        None if required => audit.add_message("maritalStatus", STATUS_REQUIRED),
        None => {}
    }
}

/// Audit a trimmed create request against `today`.
pub fn audit_create_request(request: &UserCreateRequest, today: NaiveDate) -> AuditResponse {
    let mut audit = AuditResponse::new();

    check_length(&mut audit, "name", request.name.as_deref(), true, NAME_TOO_SHORT, NAME_TOO_LONG);
    check_length(
        &mut audit,
        "lastName",
        request.last_name.as_deref(),
        true,
        LAST_NAME_TOO_SHORT,
        LAST_NAME_TOO_LONG,
    );
    check_marital_status(&mut audit, request.marital_status.as_deref(), true);
    check_birth_day(&mut audit, request.birth_day.as_deref(), true, today);

    let email_ok = request
        .email
        .as_deref()
        .map(|email| email.validate_email())
        .unwrap_or(false);
    if !email_ok {
        audit.add_message("email", EMAIL_INVALID);
    }

    audit
}

/// Audit a trimmed update request: only supplied fields are checked.
pub fn audit_update_request(request: &UserUpdateRequest, today: NaiveDate) -> AuditResponse {
    let mut audit = AuditResponse::new();

    check_length(&mut audit, "name", request.name.as_deref(), false, NAME_TOO_SHORT, NAME_TOO_LONG);
    check_length(
        &mut audit,
        "lastName",
        request.last_name.as_deref(),
        false,
        LAST_NAME_TOO_SHORT,
        LAST_NAME_TOO_LONG,
    );
    check_marital_status(&mut audit, request.marital_status.as_deref(), false);
    check_birth_day(&mut audit, request.birth_day.as_deref(), false, today);

    audit
}
