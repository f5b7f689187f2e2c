//! The demo role switch must stay outside the authenticated path.
#![cfg(feature = "demo")]

use std::sync::Arc;

use adapters::ScriptedTransport;

use portal::{AuthState, Portal, PortalConfig, Role, SessionStore};

#[tokio::test]
async fn demo_user_never_reaches_session_or_auth_state() {
    let transport = Arc::new(ScriptedTransport::new());
    let portal = Portal::with_transport(
        PortalConfig::default(),
        transport.clone(),
        SessionStore::in_memory(),
    );

    let demo_user = portal.demo().switch_role(Role::Admin);
    assert_eq!(demo_user.role, Role::Admin);
    assert_eq!(portal.demo().user(), Some(demo_user));

    assert_eq!(portal.state(), AuthState::Anonymous);
    assert!(portal.session().is_empty());
    assert!(!portal.gate().can_search_patients());

    let _ = portal.queries().cities().await;
    assert_eq!(transport.last_request().unwrap().bearer_token(), None);
}
