//! Account lifecycle calls: sign-up, forgotten and reset passwords, password change.
//!
//! These do not touch the session; a freshly signed-up account still has to
//! go through `AuthFlow::login`.

use super::models::{
    Ack, ChangePasswordPayload, ResetPasswordPayload, SignUpAdminPayload, SignUpDoctorPayload,
    SignUpUserPayload,
};
use crate::errors::{PortalError, Result};
use crate::http::HttpClient;
use crate::session::Role;

pub async fn sign_up_user(http: &HttpClient, payload: &SignUpUserPayload) -> Result<Ack> {
    require(&payload.username, "username")?;
    require(&payload.email, "email")?;
    require(&payload.password, "password")?;
    http.post("/user/signup", payload).await
}

pub async fn sign_up_doctor(http: &HttpClient, payload: &SignUpDoctorPayload) -> Result<Ack> {
    require(&payload.username, "username")?;
    require(&payload.password, "password")?;
    http.post("/doctor/signup", payload).await
}

pub async fn sign_up_admin(http: &HttpClient, payload: &SignUpAdminPayload) -> Result<Ack> {
    require(&payload.username, "username")?;
    require(&payload.email, "email")?;
    require(&payload.password, "password")?;
    http.post("/admin/signup", payload).await
}

pub async fn forgot_password(http: &HttpClient, role: Role, email: &str) -> Result<Ack> {
    require(email, "email")?;
    let path = format!("/{}/forgot-password", role.api_segment());
    http.post(&path, &serde_json::json!({ "email": email.trim() }))
        .await
}

pub async fn reset_password(
    http: &HttpClient,
    role: Role,
    token: &str,
    password: &str,
    confirm_password: &str,
) -> Result<Ack> {
    require(token, "reset token")?;
    require(password, "password")?;
    ensure_match(password, confirm_password)?;

    let path = format!("/{}/reset-password/{}", role.api_segment(), token.trim());
    let payload = ResetPasswordPayload {
        password: password.to_string(),
        confirm_password: confirm_password.to_string(),
    };
    http.post(&path, &payload).await
}

pub async fn change_password(
    http: &HttpClient,
    role: Role,
    payload: &ChangePasswordPayload,
) -> Result<Ack> {
    require(&payload.current_password, "current password")?;
    require(&payload.new_password, "new password")?;
    ensure_match(&payload.new_password, &payload.confirm_password)?;

    let path = format!("/{}/change-password", role.api_segment());
    http.post(&path, payload).await
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(PortalError::Validation(format!("Missing {}", field)));
    }
    Ok(())
}

fn ensure_match(password: &str, confirm: &str) -> Result<()> {
    if password != confirm {
        return Err(PortalError::Validation("Passwords do not match".to_string()));
    }
    Ok(())
}
