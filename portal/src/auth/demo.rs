//! Demo-only role switching. Compiled only with the `demo` feature.
//!
//! The fabricated user lives here and nowhere else: it never enters the
//! session store and never moves `AuthFlow` out of its current state, so no
//! request is ever signed on its behalf.

use std::sync::{Arc, RwLock};

use tracing::warn;

use super::permissions::PermissionGate;
use crate::session::{Role, UserProfile};

#[derive(Debug, Clone, Default)]
pub struct DemoRoleSwitch {
    user: Arc<RwLock<Option<UserProfile>>>,
}

impl DemoRoleSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switch_role(&self, role: Role) -> UserProfile {
        warn!("Demo role switch to {} (unauthenticated)", role);
        let user = UserProfile {
            id: role.as_str().to_string(),
            name: Some(format!("{} (Demo)", role.title())),
            username: None,
            email: Some(format!("{}@demo", role)),
            phone: None,
            role,
            avatar: None,
            permissions: None,
            department: None,
        };
        *self.user.write().unwrap_or_else(|p| p.into_inner()) = Some(user.clone());
        user
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.user.read().unwrap_or_else(|p| p.into_inner()).clone()
    }

    pub fn gate(&self) -> PermissionGate {
        PermissionGate::new(self.user())
    }
}
