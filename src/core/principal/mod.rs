use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::common::Time;

/// Identifier issued by the identity collaborator.
/// A profile record shares the id of the principal owning it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(id: &str) -> Self {
        PrincipalId::new(id)
    }
}

impl From<String> for PrincipalId {
    fn from(id: String) -> Self {
        PrincipalId(id)
    }
}

/// Authenticated identity of a signed in actor.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
    email: Option<String>,
    access_token: String,
    issued_at: Time,
    expires_at: Time,
}

impl Principal {
    pub fn new(
        id: impl Into<PrincipalId>,
        email: Option<String>,
        access_token: impl Into<String>,
        issued_at: Time,
        expires_at: Time,
    ) -> Self {
        Self {
            id: id.into(),
            email,
            access_token: access_token.into(),
            issued_at,
            expires_at,
        }
    }

    pub fn id(&self) -> &PrincipalId {
        &self.id
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn issued_at(&self) -> Time {
        self.issued_at
    }

    pub fn expires_at(&self) -> Time {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: Time) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

// Mask access token.
impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("access_token", &"***")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl From<PrincipalId> for String {
    fn from(id: PrincipalId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn expiry_is_inclusive_of_deadline() {
        let now = Utc::now();
        let principal = Principal::new("u1", None, "token", now, now + Duration::minutes(5));

        assert!(!principal.is_expired_at(now));
        assert!(principal.is_expired_at(now + Duration::minutes(5)));
    }

    #[test]
    fn debug_masks_access_token() {
        let now = Utc::now();
        let principal = Principal::new("u1", Some("a@b.c".into()), "secret-token", now, now);

        let debug = format!("{:?}", principal);
        assert!(!debug.contains("secret-token"));
        assert!(debug.contains("u1"));
    }
}
