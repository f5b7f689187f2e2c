//! Authentication module for signing in, account lifecycle and access control.
//!
//! This module provides the public interface for the sign-in state machine,
//! the account endpoints, the permission gate and, behind the `demo` feature,
//! the unauthenticated role switch used for walkthroughs.

pub mod account;
#[cfg(feature = "demo")]
pub mod demo;
pub mod models;
pub mod permissions;
pub mod service;

// Re-exports for convenience
pub use models::*;
pub use permissions::{has_any_permission, has_permission, PermissionGate};
pub use service::*;

#[cfg(feature = "demo")]
pub use demo::DemoRoleSwitch;
