//! The portal context: single owner of the session, the HTTP client, the
//! auth flow and the query cache.
//!
//! Built once at start-up with `Portal::init`, which restores any persisted
//! session. Logging out tears the user-specific state down again.

use std::sync::Arc;

use adapters::{ReqwestTransport, Transport};
use tracing::{debug, info};

use crate::auth::{AuthFlow, AuthState, PermissionGate};
use crate::config::PortalConfig;
use crate::errors::Result;
use crate::http::HttpClient;
use crate::navigation::Navigator;
use crate::services::{PortalQueries, QueryClient};
use crate::session::{FileStorage, Role, SessionStore, UserProfile};

#[cfg(feature = "demo")]
use crate::auth::DemoRoleSwitch;

#[derive(Clone)]
pub struct Portal {
    config: PortalConfig,
    http: HttpClient,
    auth: AuthFlow,
    queries: PortalQueries,
    #[cfg(feature = "demo")]
    demo: DemoRoleSwitch,
}

impl Portal {
    /// Builds the production context: reqwest transport, file-backed session
    /// when `session_file` is configured, in-memory otherwise.
    pub fn init(config: PortalConfig) -> Result<Self> {
        let transport = ReqwestTransport::new(config.request_timeout)?;
        let session = match &config.session_file {
            Some(path) => {
                debug!("Persisting session in {}", path.display());
                SessionStore::new(Arc::new(FileStorage::new(path)))
            }
            None => SessionStore::in_memory(),
        };
        let portal = Self::with_transport(config, Arc::new(transport), session);
        portal.auth.restore();
        Ok(portal)
    }

    /// Wires the context around an arbitrary transport and session store.
    pub fn with_transport(
        config: PortalConfig,
        transport: Arc<dyn Transport>,
        session: SessionStore,
    ) -> Self {
        let cache = QueryClient::new();
        let on_unauthorized = {
            let cache = cache.clone();
            Arc::new(move || {
                info!("Signed out by the backend, clearing cached queries");
                cache.clear();
            })
        };
        let http = HttpClient::new(
            transport,
            config.api_base_url.clone(),
            session,
            Navigator::new(),
        )
        .with_unauthorized_hook(on_unauthorized);

        Self {
            auth: AuthFlow::new(http.clone()),
            queries: PortalQueries::new(http.clone(), cache),
            http,
            config,
            #[cfg(feature = "demo")]
            demo: DemoRoleSwitch::new(),
        }
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    pub fn session(&self) -> &SessionStore {
        self.http.session()
    }

    pub fn navigator(&self) -> &Navigator {
        self.http.navigator()
    }

    pub fn auth(&self) -> &AuthFlow {
        &self.auth
    }

    pub fn queries(&self) -> &PortalQueries {
        &self.queries
    }

    pub fn state(&self) -> AuthState {
        self.auth.state()
    }

    pub fn current_user(&self) -> Option<UserProfile> {
        self.auth.current_user()
    }

    /// Permission gate for the signed-in user. Demo users never pass through here.
    pub fn gate(&self) -> PermissionGate {
        PermissionGate::new(self.auth.current_user())
    }

    pub async fn login(
        &self,
        identifier: &str,
        password: &str,
        role_hint: Option<Role>,
    ) -> Result<UserProfile> {
        self.queries.cache().clear();
        self.auth.login(identifier, password, role_hint).await
    }

    pub fn logout(&self) {
        self.auth.logout();
        self.queries.cache().clear();
    }

    pub async fn logout_remote(&self) {
        self.auth.logout_remote().await;
        self.queries.cache().clear();
    }

    #[cfg(feature = "demo")]
    pub fn demo(&self) -> &DemoRoleSwitch {
        &self.demo
    }
}
