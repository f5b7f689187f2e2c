//! Permission checks for gated features.
//!
//! Policy is fail-closed: a user is granted a permission only if their
//! explicit list contains it or contains the wildcard `all`. A user without
//! a list, or no user at all, is denied everything.

use crate::errors::{PortalError, Result};
use crate::session::UserProfile;

pub const ALL: &str = "all";
pub const PATIENT_SEARCH: &str = "patient_search";
pub const PATIENT_READ: &str = "patient_read";

pub fn has_permission(user: Option<&UserProfile>, permission: &str) -> bool {
    let Some(granted) = user.and_then(|u| u.permissions.as_ref()) else {
        return false;
    };
    granted.iter().any(|p| p == permission || p == ALL)
}

pub fn has_any_permission(user: Option<&UserProfile>, permissions: &[&str]) -> bool {
    permissions.iter().any(|p| has_permission(user, p))
}

/// Snapshot of a user's grants, handed to feature code that shows or hides capabilities.
#[derive(Debug, Clone, Default)]
pub struct PermissionGate {
    user: Option<UserProfile>,
}

impl PermissionGate {
    pub fn new(user: Option<UserProfile>) -> Self {
        Self { user }
    }

    pub fn check(&self, permission: &str) -> bool {
        has_permission(self.user.as_ref(), permission)
    }

    pub fn check_any(&self, permissions: &[&str]) -> bool {
        has_any_permission(self.user.as_ref(), permissions)
    }

    pub fn require_any(&self, permissions: &[&str]) -> Result<()> {
        if self.check_any(permissions) {
            Ok(())
        } else {
            Err(PortalError::Forbidden(permissions.join(" or ")))
        }
    }

    pub fn can_search_patients(&self) -> bool {
        self.check_any(&[PATIENT_SEARCH, PATIENT_READ])
    }
}
