use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::PrincipalId;

/// Application level record describing a principal.
/// Created by the backend when the principal signs up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: PrincipalId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub role: Role,
    pub status: Status,
    // Contact address captured at registration time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_email: Option<String>,
}

impl Profile {
    pub fn new(
        id: impl Into<PrincipalId>,
        full_name: impl Into<String>,
        role: Role,
        status: Status,
    ) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
            role,
            status,
            pending_email: None,
        }
    }

    pub fn with_pending_email(mut self, email: impl Into<String>) -> Self {
        self.pending_email = Some(email.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Student,
    TeacherAdmin,
    // Value outside the known set, kept as received.
    Unrecognized(String),
}

impl Role {
    pub const STUDENT: &'static str = "Siswa";
    pub const TEACHER_ADMIN: &'static str = "Guru/Admin";

    pub fn as_str(&self) -> &str {
        match self {
            Role::Student => Role::STUDENT,
            Role::TeacherAdmin => Role::TEACHER_ADMIN,
            Role::Unrecognized(raw) => raw.as_str(),
        }
    }
}

impl Default for Role {
    fn default() -> Self {
        Role::Unrecognized(String::new())
    }
}

impl From<String> for Role {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            Role::STUDENT => Role::Student,
            Role::TEACHER_ADMIN => Role::TeacherAdmin,
            _ => Role::Unrecognized(raw),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Unrecognized(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Approval status of a profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Pending,
    Approved,
    Rejected,
    Unrecognized(String),
}

impl Status {
    pub const PENDING: &'static str = "pending";
    pub const APPROVED: &'static str = "approved";
    pub const REJECTED: &'static str = "rejected";

    pub fn as_str(&self) -> &str {
        match self {
            Status::Pending => Status::PENDING,
            Status::Approved => Status::APPROVED,
            Status::Rejected => Status::REJECTED,
            Status::Unrecognized(raw) => raw.as_str(),
        }
    }
}

// Status values are matched case insensitively. "Pending" and "pending" are the same status.
impl From<String> for Status {
    fn from(raw: String) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            Status::PENDING => Status::Pending,
            Status::APPROVED => Status::Approved,
            Status::REJECTED => Status::Rejected,
            _ => Status::Unrecognized(raw),
        }
    }
}

impl From<Status> for String {
    fn from(status: Status) -> Self {
        match status {
            Status::Unrecognized(raw) => raw,
            known => known.as_str().to_owned(),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
