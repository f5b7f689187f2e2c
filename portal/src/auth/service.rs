//! Sign-in state machine and the in-memory mirror of the signed-in user.
//!
//! The flow moves between `Anonymous`, `Authenticating`, `Authenticated` and
//! `Failed`. It is the only writer of the session store besides the HTTP
//! client's 401 handler.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{info, warn};

use super::models::{signin_path, SignInRequest, SignInResponse, TokenRefreshResponse};
use crate::errors::{PortalError, Result};
use crate::http::HttpClient;
use crate::navigation::Route;
use crate::session::{Role, UserProfile};

#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    Anonymous,
    Authenticating,
    Authenticated(UserProfile),
    Failed(String),
}

impl AuthState {
    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            AuthState::Authenticated(user) => Some(user),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct AuthFlow {
    http: HttpClient,
    state: Arc<RwLock<AuthState>>,
}

impl AuthFlow {
    pub fn new(http: HttpClient) -> Self {
        Self {
            http,
            state: Arc::new(RwLock::new(AuthState::Anonymous)),
        }
    }

    /// Current state. An `Authenticated` state whose session was wiped by a
    /// 401 in the meantime reads as `Anonymous`.
    pub fn state(&self) -> AuthState {
        let state = self.read_state().clone();
        if matches!(state, AuthState::Authenticated(_)) && self.http.session().is_empty() {
            info!("Session was cleared, dropping signed-in user");
            self.set_state(AuthState::Anonymous);
            return AuthState::Anonymous;
        }
        state
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.state().user().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    /// Rebuilds the in-memory user from a persisted session, if one is stored.
    ///
    /// The token is not checked here; a stale one is discovered on the first 401.
    pub fn restore(&self) -> Option<UserProfile> {
        match self.http.session().load() {
            Some(session) => {
                info!("Restored session for {} ({})", session.user.display_name(), session.user.role);
                self.set_state(AuthState::Authenticated(session.user.clone()));
                Some(session.user)
            }
            None => {
                self.set_state(AuthState::Anonymous);
                None
            }
        }
    }

    /// Signs in against the endpoint selected by `role_hint`.
    ///
    /// On any failure the session store is wiped and the state ends in `Failed`.
    /// A rejected envelope or a 401 is reported as `PortalError::Authentication`;
    /// other HTTP and transport failures are propagated as-is.
    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        role_hint: Option<Role>,
    ) -> Result<UserProfile> {
        let identifier = identifier.trim();
        if identifier.is_empty() || password.is_empty() {
            return Err(PortalError::Validation(
                "Please enter your credentials".to_string(),
            ));
        }

        self.set_state(AuthState::Authenticating);
        let path = signin_path(role_hint);
        let request = SignInRequest::for_role(role_hint, identifier, password);

        let response = match self.http.post::<SignInResponse, _>(&path, &request).await {
            Ok(response) => response,
            // A 401 from a sign-in endpoint means bad credentials, not an expired session.
            Err(PortalError::Unauthorized(message)) => {
                return Err(self.fail(message.clone(), PortalError::Authentication(message)))
            }
            Err(err) => return Err(self.fail(err.user_message(), err)),
        };

        let session = match response.into_session(role_hint) {
            Ok(session) => session,
            Err(message) => {
                return Err(self.fail(message.clone(), PortalError::Authentication(message)))
            }
        };

        if let Err(err) = self.http.session().store(&session) {
            return Err(self.fail(err.user_message(), err));
        }

        info!(
            "Signed in {} as {}",
            session.user.display_name(),
            session.user.role
        );
        self.set_state(AuthState::Authenticated(session.user.clone()));
        self.http.navigator().navigate(Route::Dashboard);
        Ok(session.user)
    }

    /// Local-only logout: wipes the session and forgets the user.
    pub fn logout(&self) {
        if let Err(err) = self.http.session().clear() {
            warn!("Failed to clear session on logout: {}", err);
        }
        self.set_state(AuthState::Anonymous);
        info!("Signed out");
    }

    /// Tells the backend first, then logs out locally whatever the backend said.
    pub async fn logout_remote(&self) {
        if let Some(user) = self.current_user() {
            let path = format!("/{}/logout", user.role.api_segment());
            if let Err(err) = self.http.post_empty::<serde_json::Value>(&path).await {
                warn!("Backend logout failed: {}", err);
            }
        }
        self.logout();
    }

    /// Exchanges the refresh token for a new access token and stores it.
    pub async fn refresh(&self) -> Result<()> {
        let role = self
            .current_user()
            .map(|user| user.role)
            .ok_or_else(|| PortalError::Authentication("Not signed in".to_string()))?;

        let previous = self
            .http
            .session()
            .read_token()
            .ok_or_else(|| PortalError::Authentication("Not signed in".to_string()))?;

        let path = format!("/{}/refresh-token", role.api_segment());
        let response: TokenRefreshResponse = self.http.post_empty(&path).await?;

        match (response.success, response.access_token) {
            (Some(false), _) | (_, None) => Err(PortalError::Authentication(
                response
                    .message
                    .unwrap_or_else(|| "Token refresh rejected".to_string()),
            )),
            (_, Some(token)) if token.is_empty() => Err(PortalError::Authentication(
                "Token refresh returned an empty token".to_string(),
            )),
            (_, Some(token)) => {
                self.http
                    .session()
                    .update_tokens(&previous, &token, response.refresh_token.as_deref())?;
                info!("Access token refreshed");
                Ok(())
            }
        }
    }

    fn fail(&self, message: String, err: PortalError) -> PortalError {
        warn!("Sign-in failed: {}", message);
        if let Err(clear_err) = self.http.session().clear() {
            warn!("Failed to clear partial session: {}", clear_err);
        }
        self.set_state(AuthState::Failed(message));
        err
    }

    fn set_state(&self, state: AuthState) {
        *self.write_state() = state;
    }

    fn read_state(&self) -> RwLockReadGuard<'_, AuthState> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, AuthState> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adapters::{ScriptedTransport, TransportError};
    use serde_json::json;

    use crate::navigation::Navigator;
    use crate::session::SessionStore;

    fn flow(transport: Arc<ScriptedTransport>) -> AuthFlow {
        AuthFlow::new(HttpClient::new(
            transport,
            "http://api",
            SessionStore::in_memory(),
            Navigator::new(),
        ))
    }

    #[tokio::test]
    async fn empty_credentials_fail_validation_without_a_request() {
        let transport = Arc::new(ScriptedTransport::new());
        let auth = flow(transport.clone());

        let err = auth.login("  ", "pw", None).await.unwrap_err();
        assert!(matches!(err, PortalError::Validation(_)));
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn successful_login_navigates_to_dashboard() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({
                "success": true,
                "accessToken": "T1",
                "refreshToken": "R1",
                "user": { "id": "d1", "username": "drjane" }
            }),
        );
        let auth = flow(transport);

        let user = auth.login("drjane", "pw", Some(Role::Doctor)).await.unwrap();
        assert_eq!(user.role, Role::Doctor);
        assert!(auth.is_authenticated());
        assert_eq!(auth.http.navigator().current(), Route::Dashboard);
    }

    #[tokio::test]
    async fn transport_failure_ends_in_failed_state() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_failure(TransportError::TimeoutError);
        let auth = flow(transport);

        let err = auth.login("a@b.com", "pw", None).await.unwrap_err();
        assert!(matches!(err, PortalError::Transport(TransportError::TimeoutError)));
        assert!(matches!(auth.state(), AuthState::Failed(_)));
        assert!(auth.http.session().is_empty());
    }

    #[tokio::test]
    async fn failed_login_replaces_previous_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(200, json!({ "success": true, "accessToken": "T1", "user": { "id": "u1" } }))
            .push_json(200, json!({ "success": false }));
        let auth = flow(transport);

        auth.login("a@b.com", "pw", None).await.unwrap();
        let err = auth.login("a@b.com", "wrong", None).await.unwrap_err();

        assert!(matches!(err, PortalError::Authentication(ref m) if m == "Invalid credentials"));
        assert_eq!(auth.state(), AuthState::Failed("Invalid credentials".to_string()));
        assert!(auth.current_user().is_none());
        assert!(auth.http.session().is_empty());
    }

    #[tokio::test]
    async fn logout_is_local() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(200, json!({ "success": true, "accessToken": "T1", "user": { "id": "u1" } }));
        let auth = flow(transport.clone());
        auth.login("a@b.com", "pw", None).await.unwrap();

        auth.logout();
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert!(auth.http.session().is_empty());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn remote_logout_still_clears_when_backend_fails() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(
                200,
                json!({ "success": true, "accessToken": "T1", "user": { "id": "a1", "role": "admin" } }),
            )
            .push_json(500, json!({ "message": "boom" }));
        let auth = flow(transport.clone());
        auth.login("root", "pw", Some(Role::Admin)).await.unwrap();

        auth.logout_remote().await;
        assert!(transport.last_request().unwrap().url.ends_with("/admin/logout"));
        assert_eq!(auth.state(), AuthState::Anonymous);
        assert!(auth.http.session().is_empty());
    }

    #[tokio::test]
    async fn refresh_replaces_access_token() {
        let transport = Arc::new(ScriptedTransport::new());
        transport
            .push_json(200, json!({ "success": true, "accessToken": "T1", "refreshToken": "R1", "user": { "id": "u1" } }))
            .push_json(200, json!({ "success": true, "accessToken": "T2" }));
        let auth = flow(transport.clone());
        auth.login("a@b.com", "pw", None).await.unwrap();

        auth.refresh().await.unwrap();
        let refresh_request = transport.last_request().unwrap();
        assert!(refresh_request.url.ends_with("/user/refresh-token"));
        assert_eq!(refresh_request.bearer_token(), Some("T1"));
        assert_eq!(auth.http.session().read_token(), Some("T2".to_string()));
        assert_eq!(auth.http.session().read_refresh_token(), Some("R1".to_string()));
    }

    #[tokio::test]
    async fn restore_reads_persisted_session() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.push_json(
            200,
            json!({ "success": true, "accessToken": "T1", "user": { "id": "n1", "role": "nurse" } }),
        );
        let auth = flow(transport);
        auth.login("n@b.com", "pw", None).await.unwrap();

        let fresh = AuthFlow::new(auth.http.clone());
        assert_eq!(fresh.state(), AuthState::Anonymous);
        let restored = fresh.restore().unwrap();
        assert_eq!(restored.role, Role::Nurse);
        assert!(fresh.is_authenticated());
    }
}
