//! Authenticated identity and its capabilities.

use std::fmt;

/// A capability an identity may hold. Serialized into token scopes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Authority {
    User,
}

impl Authority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Authority::User => "ROLE_USER",
        }
    }
}

/// The principal resolved for an email: who they are and which credential
/// would authenticate them right now.
#[derive(Clone, PartialEq)]
pub struct Identity {
    pub username: String,
    /// Current OTP value, empty when no OTP is outstanding.
    pub credential: String,
    pub authorities: Vec<Authority>,
    pub enabled: bool,
}

impl Identity {
    pub fn new(username: String, credential: String) -> Self {
        Self {
            username,
            credential,
            authorities: vec![Authority::User],
            enabled: true,
        }
    }

    pub fn has_credential(&self) -> bool {
        !self.credential.is_empty()
    }

    pub fn has_authority(&self, authority: Authority) -> bool {
        self.authorities.contains(&authority)
    }

    pub fn scopes(&self) -> Vec<String> {
        self.authorities
            .iter()
            .map(|a| a.as_str().to_string())
            .collect()
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("username", &self.username)
            .field("has_credential", &self.has_credential())
            .field("authorities", &self.authorities)
            .field("enabled", &self.enabled)
            .finish()
    }
}
