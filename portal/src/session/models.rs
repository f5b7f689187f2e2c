//! Data structures for the signed-in user and their session.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::PortalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Doctor,
    #[serde(alias = "user")]
    Patient,
    #[serde(alias = "superadmin")]
    Admin,
    Hr,
    Nurse,
    Receptionist,
}

impl Role {
    pub const ALL: [Role; 6] = [
        Role::Doctor,
        Role::Patient,
        Role::Admin,
        Role::Hr,
        Role::Nurse,
        Role::Receptionist,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Doctor => "doctor",
            Role::Patient => "patient",
            Role::Admin => "admin",
            Role::Hr => "hr",
            Role::Nurse => "nurse",
            Role::Receptionist => "receptionist",
        }
    }

    /// Path segment of the backend router that owns this role's accounts.
    ///
    /// Only doctors and admins have their own routers; everyone else signs in
    /// through the patient (`user`) router.
    pub fn api_segment(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Doctor => "doctor",
            _ => "user",
        }
    }

    /// Admin and doctor accounts are keyed by username, all others by email.
    pub fn signs_in_with_username(&self) -> bool {
        matches!(self, Role::Admin | Role::Doctor)
    }

    pub fn title(&self) -> String {
        let name = self.as_str();
        let mut chars = name.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = PortalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        match name.as_str() {
            // Backend routers name patients "user" and senior admins "superadmin".
            "user" => Ok(Role::Patient),
            "superadmin" => Ok(Role::Admin),
            _ => Role::ALL
                .into_iter()
                .find(|role| role.as_str() == name)
                .ok_or_else(|| PortalError::Validation(format!("Unknown role '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// `None` means the backend sent no explicit grants, which the permission gate treats as deny-all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

impl UserProfile {
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .or(self.username.as_deref())
            .or(self.email.as_deref())
            .unwrap_or(&self.id)
    }
}

/// Tokens plus the user they were issued for. Created by a successful sign-in.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}
