//! Request and response bodies for the sign-in and account endpoints.
//!
//! Envelopes are decoded with every field optional so that a response missing
//! `success` or `accessToken` reaches the auth flow and is rejected there,
//! rather than surfacing as an opaque decode error.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::session::{Role, Session, UserProfile};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";

/// Sign-in body. Exactly one of `username` / `email` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignInRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
}

impl SignInRequest {
    /// Admin and doctor hints sign in by username; anything else, including no hint, by email.
    pub fn for_role(role_hint: Option<Role>, identifier: &str, password: &str) -> Self {
        let by_username = role_hint.map(|r| r.signs_in_with_username()).unwrap_or(false);
        Self {
            username: by_username.then(|| identifier.to_string()),
            email: (!by_username).then(|| identifier.to_string()),
            password: password.to_string(),
        }
    }
}

/// Sign-in endpoint for a role hint.
pub fn signin_path(role_hint: Option<Role>) -> String {
    format!("/{}/signin", role_hint.unwrap_or(Role::Patient).api_segment())
}

/// User object as returned inside a sign-in envelope. The role may be absent.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInUser {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub permissions: Option<Vec<String>>,
    #[serde(default)]
    pub department: Option<String>,
}

impl SignInUser {
    /// Role precedence: returned role, then the hint, then patient.
    pub fn into_profile(self, role_hint: Option<Role>) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name,
            username: self.username,
            email: self.email,
            phone: self.phone,
            role: self.role.or(role_hint).unwrap_or(Role::Patient),
            avatar: self.avatar,
            permissions: self.permissions,
            department: self.department,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub user: Option<SignInUser>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SignInResponse {
    /// Accepts the envelope only with `success: true` and a non-empty access token.
    ///
    /// On rejection returns the backend message, or the generic one.
    pub fn into_session(self, role_hint: Option<Role>) -> Result<Session, String> {
        let rejection = |message: Option<String>| {
            message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| INVALID_CREDENTIALS.to_string())
        };

        let access_token = match (self.success, self.access_token) {
            (Some(true), Some(token)) if !token.is_empty() => token,
            _ => return Err(rejection(self.message)),
        };

        let user = self
            .user
            .ok_or_else(|| "Sign-in response did not include a user".to_string())?;

        Ok(Session {
            access_token,
            refresh_token: self.refresh_token.unwrap_or_default(),
            user: user.into_profile(role_hint),
        })
    }
}

/// Body of `/{role}/refresh-token`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRefreshResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Generic acknowledgement returned by the account lifecycle endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignUpUserPayload {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DoctorInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub experience: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualification: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consultation_fee: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpDoctorPayload {
    pub username: String,
    pub password: String,
    pub doctor_info: DoctorInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AdminLevel {
    Admin,
    Superadmin,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpAdminPayload {
    pub username: String,
    pub password: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<AdminLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_group_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hospital_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordPayload {
    pub password: String,
    pub confirm_password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordPayload {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}
